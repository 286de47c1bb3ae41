// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use anyhow::Result;

pub async fn run(session: Option<&str>) -> Result<()> {
    crate::chat::run_chat_repl(session).await
}
