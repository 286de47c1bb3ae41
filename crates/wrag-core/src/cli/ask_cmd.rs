// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::sync::Arc;

use anyhow::Result;

use wrag_common::types::ChatRequest;

use crate::backend::BackendClient;
use crate::chat::ChatEngine;
use crate::config::Config;

pub async fn run(query: &str, json_output: bool) -> Result<()> {
    let config = Config::load()?;
    config.ensure_dirs()?;

    let client = Arc::new(
        BackendClient::connect(config.socket_addr()?, config.connect_timeout()).await?,
    );
    let engine = ChatEngine::new(client.clone(), client.clone(), client, config);

    let answer = engine.ask(ChatRequest::new(query, vec![])).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.answer);

        if !answer.sources.is_empty() {
            println!("\nSources:");
            for src in &answer.sources {
                match &src.title {
                    Some(title) => println!("  {} ({})", src.url, title),
                    None => println!("  {}", src.url),
                }
            }
        }
    }

    Ok(())
}
