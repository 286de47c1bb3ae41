// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

mod client;
mod limit;
mod protocol;

pub use client::BackendClient;
pub use limit::{Decision, MemoryRateLimiter, RateLimiter};

use async_trait::async_trait;
use tokio::sync::mpsc;

use wrag_common::types::{ChatTurn, RetrievalMatch, StreamFrame};
use wrag_common::Result;

/// turns text into an embedding vector. one attempt, no retries; failures
/// are fatal for the request they belong to.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// similarity search against the external vector store. results arrive
/// ranked descending by similarity and that order is authoritative.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        count: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievalMatch>>;
}

/// streaming chat generation. the returned channel yields frames in order
/// and is single-pass; dropping the receiver abandons the stream.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn stream_generate(
        &self,
        system: &str,
        messages: &[ChatTurn],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<mpsc::Receiver<StreamFrame>>;
}
