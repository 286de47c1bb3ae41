// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use wrag_common::types::{RetrievalMatch, SelectedContext};

use crate::budget::{estimate, truncate, TokenBudget, MIN_CHUNK_TOKENS};

/// assemble retrieved matches into a bounded context block.
///
/// matches are taken strictly in the order given - they arrive ranked by
/// the retrieval engine, and re-sorting here would silently discard that
/// ordering. each included match becomes one entry with a 1-based ordinal
/// marker, entries separated by blank lines. a match that does not fit
/// whole is included truncated when at least `MIN_CHUNK_TOKENS` of budget
/// remain, and everything ranked below it is discarded.
///
/// an empty result (nothing fit) is a degraded outcome, not a failure:
/// the caller proceeds without grounding.
pub fn assemble_context(matches: &[RetrievalMatch], budget: &TokenBudget) -> SelectedContext {
    let available = budget.safe_available();
    if available == 0 {
        tracing::warn!(
            reserved = budget.reserved(),
            ceiling = budget.ceiling(),
            "context budget exhausted before any match could be added"
        );
        return SelectedContext::empty();
    }

    let mut text = String::new();
    let mut used: Vec<RetrievalMatch> = Vec::new();
    let mut total = 0usize;

    for m in matches {
        let separator = if text.is_empty() { "" } else { "\n\n" };
        let entry = format!("{}[{}] {}", separator, used.len() + 1, m.content);
        let entry_tokens = estimate(&entry);
        let remaining = available - total;

        if entry_tokens <= remaining {
            text.push_str(&entry);
            total += entry_tokens;
            used.push(m.clone());
            continue;
        }

        if remaining >= MIN_CHUNK_TOKENS {
            let cut = truncate(&entry, remaining);
            if !cut.is_empty() {
                total += estimate(&cut);
                text.push_str(&cut);
                used.push(m.clone());
            }
        }
        break;
    }

    SelectedContext {
        text,
        used_matches: used,
        total_tokens: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Reservations;

    fn matched(content: &str, url: &str, similarity: f32) -> RetrievalMatch {
        RetrievalMatch {
            content: content.to_string(),
            source_url: url.to_string(),
            title: None,
            section: String::new(),
            similarity,
        }
    }

    fn wide_open(tokens: usize) -> TokenBudget {
        // ceiling chosen so safe_available lands exactly on `tokens`
        TokenBudget::new((tokens as f64 / 0.95).ceil() as usize + 1).with_context_cap(tokens)
    }

    #[test]
    fn test_assemble_all_fit() {
        let matches = vec![
            matched("first chunk of text", "https://example.org/a", 0.9),
            matched("second chunk of text", "https://example.org/b", 0.8),
        ];
        let selected = assemble_context(&matches, &wide_open(1000));
        assert_eq!(selected.used_matches.len(), 2);
        assert!(selected.text.starts_with("[1] first chunk"));
        assert!(selected.text.contains("\n\n[2] second chunk"));
    }

    #[test]
    fn test_assemble_preserves_input_order() {
        // deliberately not sorted by similarity: input order is authoritative
        let matches = vec![
            matched("lower scored but first", "https://example.org/a", 0.3),
            matched("higher scored but second", "https://example.org/b", 0.9),
        ];
        let selected = assemble_context(&matches, &wide_open(1000));
        assert!(selected.text.find("lower scored").unwrap() < selected.text.find("higher scored").unwrap());
    }

    #[test]
    fn test_assemble_one_full_one_truncated() {
        // five 800-token matches against 1500 available: exactly one whole
        // plus a truncated second, never a third
        let sentence = "This sentence is repeated to fill the chunk with text. ";
        let chunk = sentence.repeat(3200 / sentence.len() + 1);
        let chunk = chunk.chars().take(3200).collect::<String>();
        assert_eq!(estimate(&chunk), 800);

        let matches: Vec<RetrievalMatch> = (0..5)
            .map(|i| matched(&chunk, &format!("https://example.org/{}", i), 0.9))
            .collect();

        let selected = assemble_context(&matches, &wide_open(1500));
        assert_eq!(selected.used_matches.len(), 2);
        assert!(selected.total_tokens <= 1500);
        let tail: String = selected.text.chars().rev().take(1).collect();
        assert!(tail == "…" || selected.text.ends_with('.'));
    }

    #[test]
    fn test_assemble_total_never_exceeds_available() {
        let matches: Vec<RetrievalMatch> = (0..8)
            .map(|i| {
                matched(
                    &"filler text with words. ".repeat(20 + i * 13),
                    "https://example.org/page",
                    0.5,
                )
            })
            .collect();
        for tokens in [60, 150, 400, 900] {
            let selected = assemble_context(&matches, &wide_open(tokens));
            assert!(
                selected.total_tokens <= tokens,
                "available {} exceeded: {}",
                tokens,
                selected.total_tokens
            );
            assert!(estimate(&selected.text) <= tokens);
        }
    }

    #[test]
    fn test_assemble_skips_truncation_below_floor() {
        let matches = vec![
            matched(&"a".repeat(380), "https://example.org/a", 0.9),
            matched(&"b".repeat(4000), "https://example.org/b", 0.8),
        ];
        // 120 available: 95 spent on the first match, 25 left - below the
        // 50-token floor, so the second match is discarded outright
        let selected = assemble_context(&matches, &wide_open(120));
        assert_eq!(selected.used_matches.len(), 1);
    }

    #[test]
    fn test_assemble_empty_when_reserved_exceeds_ceiling() {
        let matches = vec![matched("content", "https://example.org/a", 0.9)];
        let budget = TokenBudget::new(500).reserve(Reservations {
            system_prompt: 300,
            query: 100,
            history: 200,
            prefix: 10,
        });
        let selected = assemble_context(&matches, &budget);
        assert!(selected.is_empty());
        assert!(selected.used_matches.is_empty());
        assert_eq!(selected.total_tokens, 0);
    }

    #[test]
    fn test_assemble_no_matches() {
        let selected = assemble_context(&[], &wide_open(1000));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_assemble_ordinals_are_one_based() {
        let matches = vec![
            matched("alpha", "https://example.org/a", 0.9),
            matched("beta", "https://example.org/b", 0.8),
            matched("gamma", "https://example.org/c", 0.7),
        ];
        let selected = assemble_context(&matches, &wide_open(1000));
        assert!(selected.text.contains("[1] alpha"));
        assert!(selected.text.contains("[2] beta"));
        assert!(selected.text.contains("[3] gamma"));
    }
}
