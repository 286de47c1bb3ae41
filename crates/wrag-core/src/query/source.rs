// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use wrag_common::types::{AttributedSource, RetrievalMatch};

/// aggregate scores this close are considered tied and broken by how many
/// chunks corroborate the URL
const SCORE_TIE_WINDOW: f32 = 0.05;

struct UrlGroup<'a> {
    url: &'a str,
    /// max similarity across the URL's chunks - one highly relevant chunk
    /// outweighs several mediocre ones
    score: f32,
    chunks: usize,
    /// longest chunk seen for the URL, shown as the representative text
    representative: &'a RetrievalMatch,
}

fn pick_best<'a, 'b>(candidates: Vec<&'b UrlGroup<'a>>) -> Option<&'b UrlGroup<'a>> {
    candidates.into_iter().reduce(|best, group| {
        if (group.score - best.score).abs() <= SCORE_TIE_WINDOW {
            if group.chunks > best.chunks {
                group
            } else {
                best
            }
        } else if group.score > best.score {
            group
        } else {
            best
        }
    })
}

/// choose the single best attributable source URL from the matches that
/// actually made it into the context.
///
/// URLs listed in `priority_urls` are the generic/homepage tier; with
/// `prefer_specific` set, any page about the actual topic beats the landing
/// page regardless of score, since homepage content is shallow by nature.
/// pure apart from a debug log of the choice.
pub fn select_source(
    used_matches: &[RetrievalMatch],
    priority_urls: &[String],
    prefer_specific: bool,
) -> Option<AttributedSource> {
    if used_matches.is_empty() {
        return None;
    }

    let mut groups: Vec<UrlGroup> = Vec::new();
    for m in used_matches {
        match groups.iter_mut().find(|g| g.url == m.source_url) {
            Some(group) => {
                group.score = group.score.max(m.similarity);
                group.chunks += 1;
                if m.content.chars().count() > group.representative.content.chars().count() {
                    group.representative = m;
                }
            }
            None => groups.push(UrlGroup {
                url: &m.source_url,
                score: m.similarity,
                chunks: 1,
                representative: m,
            }),
        }
    }

    let is_priority = |url: &str| priority_urls.iter().any(|p| p == url);

    let chosen = if prefer_specific {
        let specific: Vec<&UrlGroup> = groups.iter().filter(|g| !is_priority(g.url)).collect();
        let generic: Vec<&UrlGroup> = groups.iter().filter(|g| is_priority(g.url)).collect();
        pick_best(specific).or_else(|| pick_best(generic))
    } else {
        pick_best(groups.iter().collect())
    }?;

    tracing::debug!(
        url = chosen.url,
        score = chosen.score,
        chunks = chosen.chunks,
        "selected attributable source"
    );

    Some(AttributedSource {
        url: chosen.url.to_string(),
        title: chosen.representative.title.clone(),
        content: chosen.representative.content.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(content: &str, url: &str, similarity: f32) -> RetrievalMatch {
        RetrievalMatch {
            content: content.to_string(),
            source_url: url.to_string(),
            title: Some(format!("title of {}", url)),
            section: String::new(),
            similarity,
        }
    }

    #[test]
    fn test_select_empty_is_none() {
        assert!(select_source(&[], &[], true).is_none());
    }

    #[test]
    fn test_select_single_url_returns_longest_chunk() {
        let matches = vec![
            matched("short", "https://example.org/trails", 0.9),
            matched("a much longer chunk of page text", "https://example.org/trails", 0.5),
        ];
        let source = select_source(&matches, &[], true).unwrap();
        assert_eq!(source.url, "https://example.org/trails");
        assert_eq!(source.content, "a much longer chunk of page text");
    }

    #[test]
    fn test_select_specific_beats_homepage_regardless_of_score() {
        let priority = vec!["https://example.org/".to_string()];
        let matches = vec![
            matched("homepage blurb", "https://example.org/", 0.9),
            matched("topic page text", "https://example.org/topic", 0.4),
        ];
        let source = select_source(&matches, &priority, true).unwrap();
        assert_eq!(source.url, "https://example.org/topic");
    }

    #[test]
    fn test_select_homepage_wins_when_nothing_specific() {
        let priority = vec!["https://example.org/".to_string()];
        let matches = vec![matched("homepage blurb", "https://example.org/", 0.6)];
        let source = select_source(&matches, &priority, true).unwrap();
        assert_eq!(source.url, "https://example.org/");
    }

    #[test]
    fn test_select_policy_flag_disables_partition() {
        let priority = vec!["https://example.org/".to_string()];
        let matches = vec![
            matched("homepage blurb", "https://example.org/", 0.9),
            matched("topic page text", "https://example.org/topic", 0.4),
        ];
        let source = select_source(&matches, &priority, false).unwrap();
        assert_eq!(source.url, "https://example.org/");
    }

    #[test]
    fn test_select_aggregates_max_similarity_not_average() {
        let matches = vec![
            matched("peak chunk", "https://example.org/a", 0.95),
            matched("weak chunk", "https://example.org/a", 0.10),
            matched("steady one", "https://example.org/b", 0.60),
            matched("steady two", "https://example.org/b", 0.60),
        ];
        // average would favour b (0.60 vs 0.525); max favours a
        let source = select_source(&matches, &[], true).unwrap();
        assert_eq!(source.url, "https://example.org/a");
    }

    #[test]
    fn test_select_tie_broken_by_chunk_count() {
        let matches = vec![
            matched("lone chunk", "https://example.org/a", 0.82),
            matched("corroborated one", "https://example.org/b", 0.80),
            matched("corroborated two", "https://example.org/b", 0.78),
            matched("corroborated three", "https://example.org/b", 0.60),
        ];
        let source = select_source(&matches, &[], true).unwrap();
        assert_eq!(source.url, "https://example.org/b");
    }

    #[test]
    fn test_select_clear_gap_ignores_chunk_count() {
        let matches = vec![
            matched("strong", "https://example.org/a", 0.9),
            matched("weak one", "https://example.org/b", 0.5),
            matched("weak two", "https://example.org/b", 0.5),
        ];
        let source = select_source(&matches, &[], true).unwrap();
        assert_eq!(source.url, "https://example.org/a");
    }
}
