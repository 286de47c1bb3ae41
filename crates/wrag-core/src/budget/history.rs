// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use wrag_common::types::{ChatTurn, Role};

use super::estimator::estimate;
use super::truncate::truncate;

/// a unit that does not fit whole is still eligible for partial inclusion
/// while the running total sits below this share of the budget
const PARTIAL_FLOOR: f64 = 0.9;

/// select the newest suffix of `history` that fits `max_tokens`.
///
/// walks newest to oldest in units: a user turn directly followed by its
/// assistant reply is one atomic pair (splitting one strands the short
/// answer to a clarifying exchange), everything else is a single. whole
/// units accumulate until one does not fit; that unit may be partially
/// included with truncated content, after which accumulation stops.
///
/// partial inclusion never opens an interior gap: a pair is either kept
/// with the assistant half truncated, or dropped whole - except at the
/// very newest unit, where a truncated user half alone may survive rather
/// than losing the entire exchange. the kept history is returned
/// oldest-first as generation APIs expect.
pub fn trim_history(history: &[ChatTurn], max_tokens: usize) -> Vec<ChatTurn> {
    let mut kept: Vec<ChatTurn> = Vec::new(); // newest-first during the walk
    let mut total = 0usize;
    let partial_ceiling = (max_tokens as f64 * PARTIAL_FLOOR) as usize;

    let mut i = history.len();
    while i > 0 {
        let (unit, next_i) = if i >= 2
            && history[i - 1].role == Role::Assistant
            && history[i - 2].role == Role::User
        {
            (&history[i - 2..i], i - 2)
        } else {
            (&history[i - 1..i], i - 1)
        };

        let unit_tokens: usize = unit.iter().map(|t| estimate(&t.content)).sum();

        if total + unit_tokens <= max_tokens {
            for turn in unit.iter().rev() {
                kept.push(turn.clone());
            }
            total += unit_tokens;
            i = next_i;
            continue;
        }

        if total < partial_ceiling {
            let remaining = max_tokens - total;
            match unit {
                [user, assistant] => {
                    let user_tokens = estimate(&user.content);
                    if user_tokens < remaining {
                        // pair survives with the assistant half truncated
                        let cut = truncate(&assistant.content, remaining - user_tokens);
                        if !cut.is_empty() {
                            kept.push(ChatTurn {
                                role: assistant.role,
                                content: cut,
                            });
                            kept.push(user.clone());
                        } else if kept.is_empty() {
                            kept.push(user.clone());
                        }
                    } else if kept.is_empty() {
                        // newest exchange, user half too large even alone:
                        // a truncated user half beats losing everything
                        let cut = truncate(&user.content, remaining);
                        if !cut.is_empty() {
                            kept.push(ChatTurn {
                                role: user.role,
                                content: cut,
                            });
                        }
                    }
                }
                [single] => {
                    let cut = truncate(&single.content, remaining);
                    if !cut.is_empty() {
                        kept.push(ChatTurn {
                            role: single.role,
                            content: cut,
                        });
                    }
                }
                _ => unreachable!("units are one or two turns"),
            }
        }
        break;
    }

    kept.reverse();
    kept
}
