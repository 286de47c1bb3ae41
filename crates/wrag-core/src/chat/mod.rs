// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

mod repl;

pub use repl::run_chat_repl;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use wrag_common::types::{
    ChatAnswer, ChatEvent, ChatRequest, StageTimings, StreamFrame,
};
use wrag_common::{Error, Result};

use crate::backend::{Embedder, Generator, RateLimiter, Retriever};
use crate::budget::{estimate, trim_history, Reservations, TokenBudget};
use crate::config::Config;
use crate::query::{assemble_context, build_contextual_query, select_source, PromptAssembly};

/// events buffered between the pipeline and the consumer
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// one request/response cycle over the injected collaborators:
/// contextual query, embed, search, history trim, context assembly,
/// source selection, streamed generation. holds no per-request state and
/// nothing shared between requests.
#[derive(Clone)]
pub struct ChatEngine {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    limiter: Option<Arc<dyn RateLimiter>>,
    config: Config,
}

impl ChatEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        config: Config,
    ) -> Self {
        Self {
            embedder,
            retriever,
            generator,
            limiter: None,
            config,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// streaming entry point. tokens are forwarded as they arrive from
    /// generation, never buffered; dropping the receiver cancels the
    /// request. the stream carries exactly one terminal done or error.
    pub fn respond(&self, request: ChatRequest) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.run(request, &tx).await {
                let _ = tx.send(ChatEvent::Error(e.to_string())).await;
            }
        });
        rx
    }

    /// non-streaming fallback: collects the full answer before returning.
    /// a mid-stream generation failure surfaces as an error here.
    pub async fn ask(&self, request: ChatRequest) -> Result<ChatAnswer> {
        let mut rx = self.respond(request);
        let mut answer = String::new();
        let mut sources = Vec::new();

        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Token(token) => answer.push_str(&token),
                ChatEvent::Sources(s) => sources = s,
                ChatEvent::Done(timings) => {
                    return Ok(ChatAnswer {
                        answer,
                        sources,
                        timings,
                    })
                }
                ChatEvent::Error(message) => return Err(Error::Generation(message)),
            }
        }

        Err(Error::Generation(
            "response stream ended without a terminal event".into(),
        ))
    }

    async fn run(&self, request: ChatRequest, tx: &mpsc::Sender<ChatEvent>) -> Result<()> {
        if let (Some(limiter), Some(key)) = (&self.limiter, &request.client_key) {
            if !limiter.check(key).allowed {
                return Err(Error::RateLimited(key.clone()));
            }
        }

        let contextual_query = build_contextual_query(&request.message, &request.history);
        if contextual_query != request.message {
            tracing::debug!(expanded = %contextual_query, "expanded follow-up query for retrieval");
        }

        let embed_started = Instant::now();
        let embedding = self.embedder.embed(&contextual_query).await?;
        let embed_ms = embed_started.elapsed().as_millis() as u64;

        let retrieve_started = Instant::now();
        let matches = self
            .retriever
            .search(
                &embedding,
                self.config.retrieval.count,
                self.config.retrieval.threshold,
            )
            .await?;
        let retrieve_ms = retrieve_started.elapsed().as_millis() as u64;

        let mut timings = StageTimings {
            embed_ms,
            retrieve_ms,
            first_token_ms: None,
        };

        // empty retrieval is a defined degraded outcome, not an error:
        // fixed answer, no sources, no generation call
        if matches.is_empty() {
            tracing::info!("no matches above threshold, returning fallback answer");
            let _ = tx
                .send(ChatEvent::Token(self.config.chat.fallback_message.clone()))
                .await;
            let _ = tx.send(ChatEvent::Done(timings)).await;
            return Ok(());
        }

        let trimmed = trim_history(&request.history, self.config.budget.history_tokens);
        let history_tokens: usize = trimmed.iter().map(|t| estimate(&t.content)).sum();

        let budget = TokenBudget::new(self.config.budget.prompt_ceiling)
            .with_context_cap(self.config.budget.context_tokens)
            .reserve(Reservations {
                system_prompt: PromptAssembly::system_tokens(),
                query: estimate(&request.message),
                history: history_tokens,
                prefix: PromptAssembly::prefix_tokens(),
            });

        let selected = assemble_context(&matches, &budget);
        if selected.is_empty() {
            tracing::warn!("proceeding to generation without grounding context");
        }

        let source = select_source(
            &selected.used_matches,
            &self.config.chat.priority_urls,
            self.config.chat.prefer_specific,
        );

        let prompt = PromptAssembly::new(&selected.text, &request.message, trimmed);

        let generate_started = Instant::now();
        let mut frames = self
            .generator
            .stream_generate(
                &prompt.system,
                &prompt.messages(),
                self.config.generation.max_tokens,
                self.config.generation.temperature,
            )
            .await?;

        while let Some(frame) = frames.recv().await {
            match frame {
                StreamFrame::Token(token) => {
                    if timings.first_token_ms.is_none() {
                        timings.first_token_ms =
                            Some(generate_started.elapsed().as_millis() as u64);
                    }
                    if tx.send(ChatEvent::Token(token)).await.is_err() {
                        // consumer disconnected: abandon the stream
                        return Ok(());
                    }
                }
                StreamFrame::Done => break,
                StreamFrame::Error(message) => {
                    // tokens already emitted remain valid and stand
                    let _ = tx.send(ChatEvent::Error(message)).await;
                    return Ok(());
                }
            }
        }

        if let Some(source) = source {
            let _ = tx.send(ChatEvent::Sources(vec![source])).await;
        }
        let _ = tx.send(ChatEvent::Done(timings)).await;
        Ok(())
    }
}
