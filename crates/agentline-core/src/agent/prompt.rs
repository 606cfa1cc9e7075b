//! Prompt assembly: system prompt, history formatting, and budget trimming.

use agentline_types::conversation::StoredMessage;
use agentline_types::memory::MemoryItem;

/// Standing instructions sent with every request.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful, precise assistant with an excellent memory for the conversation so far.
Guidelines:
1. Give accurate, factual answers grounded in verified information.
2. Keep track of context and refer back to earlier turns when they matter.
3. When you are unsure, say how confident you are instead of guessing.
4. Structure information so it is easy to follow.
5. Treat summary requests in one of two ways:
   - Asked to LIST topics or for a NUMBERED LIST: give a complete numbered list of every topic covered.
   - Asked to SUMMARIZE or for a NARRATIVE SUMMARY: write a connected narrative that explains how the topics relate.
6. Include enough detail and context while staying clear.
7. Use paragraphs and line breaks to keep longer answers readable.
8. Do not talk about your own limitations or about being an AI.

Reply with a single JSON object and nothing else:
{\"response\": \"<your answer>\", \"confidence\": <number between 0 and 1>, \"sentiment\": \"positive\" | \"neutral\" | \"negative\"}";

/// One prior turn, ready to be written into a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: &'static str,
    pub content: String,
}

impl From<&StoredMessage> for Turn {
    fn from(message: &StoredMessage) -> Self {
        Self {
            speaker: message.message_type.speaker(),
            content: message.content.clone(),
        }
    }
}

impl From<&MemoryItem> for Turn {
    fn from(item: &MemoryItem) -> Self {
        Self {
            speaker: item.role.speaker(),
            content: item.content.clone(),
        }
    }
}

impl Turn {
    fn render(&self) -> String {
        format!("{}: {}\n\n", self.speaker, self.content)
    }
}

/// `"{speaker}: {content}\n\n"` for each turn, oldest first.
pub fn format_history(turns: &[Turn]) -> String {
    turns.iter().map(Turn::render).collect()
}

/// Rough token estimate (~4 chars per token).
pub fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() / 4) as u32
}

/// Drop the oldest turns until the formatted history fits `token_limit`.
pub fn fit_to_budget(mut turns: Vec<Turn>, token_limit: u32) -> Vec<Turn> {
    let mut total: u32 = turns.iter().map(|t| estimate_tokens(&t.render())).sum();
    let mut drop = 0;
    while total > token_limit && drop < turns.len() {
        total -= estimate_tokens(&turns[drop].render());
        drop += 1;
    }
    turns.drain(..drop);
    turns
}

/// History followed by the new query.
pub fn build_prompt(history: &str, query: &str) -> String {
    format!("{history}User: {query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentline_types::conversation::MessageType;

    fn turn(speaker: &'static str, content: &str) -> Turn {
        Turn {
            speaker,
            content: content.to_string(),
        }
    }

    #[test]
    fn history_formatting_matches_speakers() {
        let human = StoredMessage::new("s", MessageType::Human, "What is Rust?", None);
        let ai = StoredMessage::new("s", MessageType::Ai, "A systems language.", None);
        let turns: Vec<Turn> = [&human, &ai].into_iter().map(Turn::from).collect();
        assert_eq!(
            format_history(&turns),
            "User: What is Rust?\n\nAssistant: A systems language.\n\n"
        );
    }

    #[test]
    fn prompt_appends_query() {
        let prompt = build_prompt("User: hi\n\nAssistant: hello\n\n", "how are you?");
        assert_eq!(prompt, "User: hi\n\nAssistant: hello\n\nUser: how are you?");
        assert_eq!(build_prompt("", "first"), "User: first");
    }

    #[test]
    fn budget_drops_oldest_turns() {
        let turns = vec![
            turn("User", &"a".repeat(400)),
            turn("Assistant", &"b".repeat(400)),
            turn("User", "short"),
        ];
        let kept = fit_to_budget(turns, 120);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].content.starts_with('b'));
        assert_eq!(kept[1].content, "short");
    }

    #[test]
    fn budget_keeps_everything_when_it_fits() {
        let turns = vec![turn("User", "hi"), turn("Assistant", "hello")];
        assert_eq!(fit_to_budget(turns.clone(), 4000), turns);
    }

    #[test]
    fn zero_budget_drops_all_nonempty_turns() {
        let turns = vec![turn("User", &"x".repeat(100))];
        assert!(fit_to_budget(turns, 0).is_empty());
    }

    #[test]
    fn system_prompt_requests_structured_fields() {
        for key in ["\"response\"", "\"confidence\"", "\"sentiment\""] {
            assert!(SYSTEM_PROMPT.contains(key));
        }
    }
}
