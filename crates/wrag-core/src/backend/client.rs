// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use wrag_common::types::{
    ChatTurn, JsonRpcRequest, JsonRpcResponse, RetrievalMatch, StreamFrame,
};
use wrag_common::{Error, Result};

use super::protocol::{self, MAX_FRAME_BYTES};

/// frames buffered between the socket reader and the consumer before
/// backpressure kicks in
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// client for the backend service that fronts the embedding model, the
/// vector store and the generation model. request/response calls share one
/// connection; each generation stream gets a dedicated one so tokens flow
/// independently of other traffic.
pub struct BackendClient {
    addr: SocketAddr,
    connect_timeout: Duration,
    stream: tokio::sync::Mutex<TcpStream>,
    next_id: AtomicU64,
}

async fn dial(addr: SocketAddr, timeout: Duration) -> Result<TcpStream> {
    tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::Backend(format!("connection to {} timed out", addr)))?
        .map_err(|e| Error::Backend(format!("failed to connect to {}: {}", addr, e)))
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;

    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| Error::Backend(e.to_string()))?;
    let len = protocol::decode_length(&len_buf) as usize;

    if len > MAX_FRAME_BYTES {
        return Err(Error::Backend(format!("frame too large: {} bytes", len)));
    }

    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(|e| Error::Backend(e.to_string()))?;
    Ok(buf)
}

/// unwrap a JSON-RPC response into its result value
fn result_value(response: JsonRpcResponse) -> Result<serde_json::Value> {
    if let Some(err) = response.error {
        return Err(Error::Backend(err.message));
    }
    response
        .result
        .ok_or_else(|| Error::Backend("no result in response".into()))
}

impl BackendClient {
    pub async fn connect(addr: SocketAddr, connect_timeout: Duration) -> Result<Self> {
        let stream = dial(addr, connect_timeout).await?;
        Ok(Self {
            addr,
            connect_timeout,
            stream: tokio::sync::Mutex::new(stream),
            next_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let encoded = protocol::encode_message(request)?;

        let mut stream = self.stream.lock().await;
        stream
            .write_all(&encoded)
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;

        let bytes = read_frame(&mut stream).await?;
        let response: JsonRpcResponse = serde_json::from_slice(&bytes)?;
        Ok(response)
    }

    pub async fn ping(&self) -> Result<bool> {
        let req = JsonRpcRequest::new("ping", serde_json::json!({}), self.next_id());
        let resp = self.send(&req).await?;
        Ok(resp.result.is_some())
    }
}

#[async_trait]
impl super::Embedder for BackendClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let req = JsonRpcRequest::new("embed", serde_json::json!({ "text": text }), self.next_id());
        let result = result_value(self.send(&req).await?)?;
        let vector: Vec<f32> =
            serde_json::from_value(result.get("vector").cloned().unwrap_or_default())?;
        if vector.is_empty() {
            return Err(Error::Backend("empty embedding returned".into()));
        }
        Ok(vector)
    }
}

#[async_trait]
impl super::Retriever for BackendClient {
    async fn search(
        &self,
        embedding: &[f32],
        count: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievalMatch>> {
        let req = JsonRpcRequest::new(
            "search",
            serde_json::json!({
                "embedding": embedding,
                "count": count,
                "threshold": threshold,
            }),
            self.next_id(),
        );
        let result = result_value(self.send(&req).await?)?;
        let matches: Vec<RetrievalMatch> =
            serde_json::from_value(result.get("matches").cloned().unwrap_or_default())?;
        Ok(matches)
    }
}

#[async_trait]
impl super::Generator for BackendClient {
    async fn stream_generate(
        &self,
        system: &str,
        messages: &[ChatTurn],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<mpsc::Receiver<StreamFrame>> {
        let mut stream = dial(self.addr, self.connect_timeout).await?;

        let req = JsonRpcRequest::new(
            "generate_stream",
            serde_json::json!({
                "system": system,
                "messages": messages,
                "max_tokens": max_tokens,
                "temperature": temperature,
            }),
            self.next_id(),
        );
        let encoded = protocol::encode_message(&req)?;
        stream
            .write_all(&encoded)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                let bytes = match read_frame(&mut stream).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamFrame::Error(e.to_string())).await;
                        break;
                    }
                };

                // one bad frame never aborts the whole stream
                let frame: StreamFrame = match serde_json::from_slice(&bytes) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping malformed stream frame");
                        continue;
                    }
                };

                let terminal = matches!(frame, StreamFrame::Done | StreamFrame::Error(_));
                if tx.send(frame).await.is_err() {
                    // consumer disconnected: abandon the stream
                    break;
                }
                if terminal {
                    break;
                }
            }
        });

        Ok(rx)
    }
}
