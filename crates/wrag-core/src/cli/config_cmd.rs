// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use anyhow::Result;

use crate::config::Config;

pub async fn show() -> Result<()> {
    let config = Config::load()?;
    let content = toml::to_string_pretty(&config)?;
    println!("{}", content);
    Ok(())
}

pub async fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    match key {
        "backend.addr" => {
            config.backend.addr = value.to_string();
        }
        "backend.connect_timeout_secs" => {
            config.backend.connect_timeout_secs = value.parse()?;
        }
        "retrieval.count" => {
            config.retrieval.count = value.parse()?;
        }
        "retrieval.threshold" => {
            config.retrieval.threshold = value.parse()?;
        }
        "budget.prompt_ceiling" => {
            config.budget.prompt_ceiling = value.parse()?;
        }
        "budget.context_tokens" => {
            config.budget.context_tokens = value.parse()?;
        }
        "budget.history_tokens" => {
            config.budget.history_tokens = value.parse()?;
        }
        "generation.max_tokens" => {
            config.generation.max_tokens = value.parse()?;
        }
        "generation.temperature" => {
            config.generation.temperature = value.parse()?;
        }
        "chat.fallback_message" => {
            config.chat.fallback_message = value.to_string();
        }
        "chat.prefer_specific" => {
            config.chat.prefer_specific = value.parse()?;
        }
        "chat.history_turns" => {
            config.chat.history_turns = value.parse()?;
        }
        "chat.rate_limit_per_minute" => {
            config.chat.rate_limit_per_minute = value.parse()?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    config.validate()?;
    config.save()?;
    println!("Set {} = {}", key, value);
    Ok(())
}

pub async fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}

pub async fn edit() -> Result<()> {
    let path = Config::config_path();
    if !path.exists() {
        Config::default().save()?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = std::process::Command::new(&editor).arg(&path).status()?;
    if !status.success() {
        anyhow::bail!("editor exited with {}", status);
    }

    // surface mistakes immediately rather than at the next request
    Config::load()?;
    Ok(())
}
