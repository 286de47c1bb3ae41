// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use wrag_common::types::JsonRpcRequest;
use wrag_common::Result;

/// refuse frames larger than this; a well-behaved backend never sends them
pub const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

pub fn encode_message(request: &JsonRpcRequest) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(request)?;
    let len = json.len() as u32;
    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&json);
    Ok(buf)
}

pub fn decode_length(buf: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*buf)
}
