// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use wrag_common::types::ChatTurn;

/// queries longer than this many words are trusted to carry their own
/// retrieval signal
const SHORT_QUERY_WORDS: usize = 3;

/// history turns at or above this length are excluded from expansion as
/// too generic to sharpen the embedding
const MAX_TURN_CHARS: usize = 200;

/// expand a short follow-up query with recent conversation text so the
/// retrieval embedding captures the implicit context. a follow-up like
/// "today" carries no signal on its own; prefixed to the turns around it,
/// it does. the original query always comes first so it is not diluted.
/// the result is never truncated - retrieval has no token ceiling here.
pub fn build_contextual_query(query: &str, history: &[ChatTurn]) -> String {
    if history.is_empty() || query.split_whitespace().count() > SHORT_QUERY_WORDS {
        return query.to_string();
    }

    let mut parts: Vec<&str> = vec![query];
    for turn in history {
        let content = turn.content.trim();
        if !content.is_empty() && content.chars().count() < MAX_TURN_CHARS {
            parts.push(content);
        }
    }
    parts.join(" ")
}
