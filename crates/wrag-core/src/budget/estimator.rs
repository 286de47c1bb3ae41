// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

/// characters per token for the target corpus language (~0.25 tokens/char).
/// the single calibration point for a different language. chosen
/// conservative: estimates round up, never down, so a real tokenizer may
/// count fewer tokens than this but not meaningfully more.
pub const CHARS_PER_TOKEN: usize = 4;

/// estimate the token count of `text` from its character count alone.
/// pure and deterministic; no tokenizer dependency, no latency.
pub fn estimate(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
