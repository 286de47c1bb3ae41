// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

mod ask_cmd;
mod chat_cmd;
mod config_cmd;
mod status_cmd;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wrag",
    about = "Website RAG chat - retrieval-grounded answers over crawled site content"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// interactive chat REPL against the indexed site
    Chat {
        /// resume a previous session
        #[arg(long)]
        session: Option<String>,
    },
    /// one-shot question, answer printed when complete
    Ask {
        /// the question to ask
        query: String,
        /// output as JSON (answer, sources, timings)
        #[arg(long)]
        json: bool,
    },
    /// show configuration and backend health
    Status,
    /// manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// show current configuration
    Show,
    /// set a configuration value
    Set { key: String, value: String },
    /// reset configuration to defaults
    Reset,
    /// open config file in $EDITOR
    Edit,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Chat { session } => chat_cmd::run(session.as_deref()).await,
            Commands::Ask { query, json } => ask_cmd::run(&query, json).await,
            Commands::Status => status_cmd::run().await,
            Commands::Config { action } => match action {
                ConfigAction::Show => config_cmd::show().await,
                ConfigAction::Set { key, value } => config_cmd::set(&key, &value).await,
                ConfigAction::Reset => config_cmd::reset().await,
                ConfigAction::Edit => config_cmd::edit().await,
            },
        }
    }
}
