// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use super::estimator::{estimate, CHARS_PER_TOKEN};

const ELLIPSIS: char = '…';

/// a sentence cut must keep at least this share of the char budget,
/// otherwise one dangling clause would eat most of the truncation
const SENTENCE_FLOOR: f64 = 0.7;

/// a word cut must keep at least this share of the char budget
const WORD_FLOOR: f64 = 0.8;

/// cut `text` to fit `max_tokens`, preferring sentence boundaries, then
/// word boundaries, then a hard cut. never panics; the result always
/// satisfies `estimate(result) <= max_tokens` and is never longer than the
/// input. `max_tokens == 0` yields an empty string.
pub fn truncate(text: &str, max_tokens: usize) -> String {
    if estimate(text) <= max_tokens {
        return text.to_string();
    }

    let max_chars = max_tokens * CHARS_PER_TOKEN;
    if max_chars == 0 {
        return String::new();
    }

    let prefix: Vec<char> = text.chars().take(max_chars).collect();

    // a complete sentence late enough in the prefix, kept with its
    // terminal punctuation and no marker
    let sentence_floor = (max_chars as f64 * SENTENCE_FLOOR) as usize;
    if let Some(idx) = prefix.iter().rposition(|c| matches!(c, '.' | '!' | '?')) {
        if idx + 1 >= sentence_floor {
            return prefix[..=idx].iter().collect();
        }
    }

    // else the last word boundary, marked with an ellipsis
    let word_floor = (max_chars as f64 * WORD_FLOOR) as usize;
    if let Some(idx) = prefix.iter().rposition(|c| *c == ' ') {
        if idx >= word_floor {
            let kept: String = prefix[..idx].iter().collect();
            let mut out = kept.trim_end().to_string();
            out.push(ELLIPSIS);
            return out;
        }
    }

    // hard cut, leaving one char of room for the marker
    let mut out: String = prefix[..max_chars - 1].iter().collect();
    out.push(ELLIPSIS);
    out
}
