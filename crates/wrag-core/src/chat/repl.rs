// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rustyline::DefaultEditor;

use wrag_common::types::{ChatEvent, ChatRequest, ChatTurn};

use crate::backend::{BackendClient, MemoryRateLimiter};
use crate::chat::ChatEngine;
use crate::config::Config;
use crate::store::Store;

pub async fn run_chat_repl(session_id: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    config.ensure_dirs()?;

    let client = Arc::new(
        BackendClient::connect(config.socket_addr()?, config.connect_timeout()).await?,
    );

    let store = Store::open(&config.sessions_db_path())?;

    let session = match session_id {
        Some(id) => id.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };
    store.create_session(&session, None)?;

    let mut engine = ChatEngine::new(
        client.clone(),
        client.clone(),
        client,
        config.clone(),
    );
    if config.chat.rate_limit_per_minute > 0 {
        engine = engine.with_rate_limiter(Arc::new(MemoryRateLimiter::new(
            config.chat.rate_limit_per_minute,
            Duration::from_secs(60),
        )));
    }

    let short = session.get(..8).unwrap_or(&session);
    println!("wrag chat (session: {})", short);
    println!("type 'quit' or ctrl-d to exit\n");

    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "quit" || query == "exit" {
            break;
        }

        editor.add_history_entry(query)?;

        let history = store.recent_turns(&session, config.chat.history_turns)?;
        let mut rx = engine.respond(ChatRequest::new(query, history));

        print!("\nwrag> ");
        io::stdout().flush()?;

        let mut answer = String::new();
        let mut source_url: Option<String> = None;
        let mut failed = false;

        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Token(token) => {
                    print!("{}", token);
                    io::stdout().flush()?;
                    answer.push_str(&token);
                }
                ChatEvent::Sources(sources) => {
                    source_url = sources.first().map(|s| s.url.clone());
                }
                ChatEvent::Done(timings) => {
                    println!();
                    if let Some(url) = &source_url {
                        println!("source: {}", url);
                    }
                    tracing::debug!(
                        embed_ms = timings.embed_ms,
                        retrieve_ms = timings.retrieve_ms,
                        first_token_ms = ?timings.first_token_ms,
                        "request timings"
                    );
                }
                ChatEvent::Error(message) => {
                    println!();
                    eprintln!("error: {}", message);
                    failed = true;
                }
            }
        }
        println!();

        if !failed && !answer.is_empty() {
            store.add_turn(&session, &ChatTurn::user(query), None)?;
            store.add_turn(
                &session,
                &ChatTurn::assistant(answer.as_str()),
                source_url.as_deref(),
            )?;
        }
    }

    println!("session saved.");
    Ok(())
}
