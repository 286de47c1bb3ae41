// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use serde::{Deserialize, Serialize};

/// speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("assistant") {
            Role::Assistant
        } else {
            Role::User
        }
    }
}

/// a single conversation turn, oldest-first in history lists.
/// the engine never mutates supplied history, only derives trimmed copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// a retrieved chunk with origin metadata, ranked descending by similarity
/// upstream. order is authoritative; context selection never re-sorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMatch {
    /// the chunk text content
    pub content: String,
    /// page the chunk was extracted from
    pub source_url: String,
    /// page title, if the cleaner recovered one
    pub title: Option<String>,
    /// section heading within the page
    pub section: String,
    /// cosine-like similarity in [-1, 1], practically [0, 1]
    pub similarity: f32,
}

/// the bounded context block assembled for one request. derived, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedContext {
    pub text: String,
    pub used_matches: Vec<RetrievalMatch>,
    pub total_tokens: usize,
}

impl SelectedContext {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            used_matches: Vec::new(),
            total_tokens: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// the single best attributable source chosen for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedSource {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

/// one incoming chat request. history is supplied by the caller each turn;
/// the engine keeps no session state of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// key for rate limiting (e.g. client ip), if the caller enforces one
    #[serde(default)]
    pub client_key: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<ChatTurn>) -> Self {
        Self {
            message: message.into(),
            history,
            client_key: None,
        }
    }
}

/// elapsed-time diagnostics for the dominant latency contributors
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub embed_ms: u64,
    pub retrieve_ms: u64,
    /// generation time-to-first-token; absent when no generation ran
    pub first_token_ms: Option<u64>,
}

/// streaming output event. a response is zero or more tokens, at most one
/// sources event, and exactly one terminal done or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ChatEvent {
    Token(String),
    Sources(Vec<AttributedSource>),
    Done(StageTimings),
    Error(String),
}

impl ChatEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Done(_) | ChatEvent::Error(_))
    }
}

/// non-streaming fallback result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<AttributedSource>,
    pub timings: StageTimings,
}

/// request/response types for JSON-RPC framing to the backend service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// one frame of a generation token stream, length-prefixed on the wire like
/// every other backend message. the stream is a sequence of token frames
/// closed by exactly one done or error frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamFrame {
    Token(String),
    Done,
    Error(String),
}
