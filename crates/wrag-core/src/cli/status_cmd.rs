// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use anyhow::Result;

use crate::backend::BackendClient;
use crate::config::Config;

pub async fn run() -> Result<()> {
    let config = Config::load()?;

    println!("wrag status");
    println!("  backend:   {}", config.backend.addr);

    let health = match BackendClient::connect(config.socket_addr()?, config.connect_timeout())
        .await
    {
        Ok(client) => match client.ping().await {
            Ok(true) => "ok".to_string(),
            Ok(false) => "no response".to_string(),
            Err(e) => format!("unreachable ({})", e),
        },
        Err(e) => format!("unreachable ({})", e),
    };
    println!("  health:    {}", health);

    println!(
        "  retrieval: count {}, threshold {}",
        config.retrieval.count, config.retrieval.threshold
    );
    println!(
        "  budget:    ceiling {}, context {}, history {}",
        config.budget.prompt_ceiling, config.budget.context_tokens, config.budget.history_tokens
    );
    println!("  sessions:  {}", config.sessions_db_path().display());

    Ok(())
}
