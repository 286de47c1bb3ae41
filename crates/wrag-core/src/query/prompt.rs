// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use wrag_common::types::ChatTurn;

use crate::budget::estimate;

const SYSTEM_PROMPT: &str = "\
You are an assistant answering questions for visitors of a website. \
Answer using only the information in the provided context. \
Be concise and factual. If the context does not contain the answer, \
say that you do not know rather than guessing.";

const CONTEXT_HEADER: &str = "Context:\n";
const QUESTION_HEADER: &str = "\n\nQuestion: ";

/// one generation request: system prompt, ordered history turns, and the
/// final user message wrapping the context block and question. an explicit
/// value type instead of ad hoc message-array concatenation, so the budget
/// arithmetic has something to check against.
#[derive(Debug, Clone)]
pub struct PromptAssembly {
    pub system: String,
    pub turns: Vec<ChatTurn>,
    pub user: String,
}

impl PromptAssembly {
    pub fn new(context: &str, query: &str, turns: Vec<ChatTurn>) -> Self {
        let user = if context.is_empty() {
            query.to_string()
        } else {
            format!("{CONTEXT_HEADER}{context}{QUESTION_HEADER}{query}")
        };
        Self {
            system: SYSTEM_PROMPT.to_string(),
            turns,
            user,
        }
    }

    /// token cost of the literal wrapper around the context block
    pub fn prefix_tokens() -> usize {
        estimate(CONTEXT_HEADER) + estimate(QUESTION_HEADER)
    }

    pub fn system_tokens() -> usize {
        estimate(SYSTEM_PROMPT)
    }

    /// messages in generation-api order: history oldest-first, the user
    /// message last
    pub fn messages(&self) -> Vec<ChatTurn> {
        let mut messages = self.turns.clone();
        messages.push(ChatTurn::user(self.user.clone()));
        messages
    }

    pub fn total_tokens(&self) -> usize {
        estimate(&self.system)
            + self
                .turns
                .iter()
                .map(|t| estimate(&t.content))
                .sum::<usize>()
            + estimate(&self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrag_common::types::Role;

    #[test]
    fn test_prompt_wraps_context_and_question() {
        let prompt = PromptAssembly::new("[1] chunk text", "when is it open?", vec![]);
        assert!(prompt.user.starts_with("Context:\n[1] chunk text"));
        assert!(prompt.user.ends_with("Question: when is it open?"));
    }

    #[test]
    fn test_prompt_empty_context_is_bare_query() {
        let prompt = PromptAssembly::new("", "when is it open?", vec![]);
        assert_eq!(prompt.user, "when is it open?");
    }

    #[test]
    fn test_prompt_messages_order() {
        let turns = vec![
            ChatTurn::user("earlier question"),
            ChatTurn::assistant("earlier answer"),
        ];
        let prompt = PromptAssembly::new("ctx", "final question", turns);
        let messages = prompt.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "earlier question");
        assert_eq!(messages[1].content, "earlier answer");
        assert_eq!(messages[2].role, Role::User);
        assert!(messages[2].content.contains("final question"));
    }

    #[test]
    fn test_prompt_token_accounting_covers_all_parts() {
        let turns = vec![ChatTurn::user("q"), ChatTurn::assistant("a")];
        let prompt = PromptAssembly::new("some context", "query", turns);
        let expected = estimate(&prompt.system)
            + estimate("q")
            + estimate("a")
            + estimate(&prompt.user);
        assert_eq!(prompt.total_tokens(), expected);
    }

    #[test]
    fn test_prefix_tokens_match_wrapper_literals() {
        assert_eq!(
            PromptAssembly::prefix_tokens(),
            estimate("Context:\n") + estimate("\n\nQuestion: ")
        );
        assert!(PromptAssembly::prefix_tokens() > 0);
    }
}
