//! Span classification.
//!
//! Only the header record decides a span's class. Model calls are split by
//! their first message: a `raw` role marks the initial prompt, and content
//! opening with the tool-response summarizer prompt marks a summary call.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{RecordPayload, Span};

/// Default prompt for recognising tool-response summary calls.
///
/// This is placeholder text, not the prompt of any particular agent. Summary
/// calls are only detected when it matches what the agent actually sent, so
/// real runs set `summary_prompt` (or `REPORT_SUMMARY_PROMPT`,
/// `--summary-prompt`) to the agent's own prompt.
pub const TOOL_RESPONSE_SUMMARIZER_PROMPT: &str =
    "Summarize the tool response below, keeping only the facts needed to continue the task.";

/// Number of leading characters of the summarizer prompt used for matching.
pub const SUMMARY_PREFIX_CHARS: usize = 20;

/// Role marking the raw prompt handed to the model.
const RAW_ROLE: &str = "raw";

/// Kind of a model-call span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LlmKind {
    #[serde(rename = "llm_prompt")]
    Prompt,
    #[serde(rename = "llm_thought")]
    Thought,
    #[serde(rename = "llm_summary")]
    Summary,
}

impl LlmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmKind::Prompt => "llm_prompt",
            LlmKind::Thought => "llm_thought",
            LlmKind::Summary => "llm_summary",
        }
    }
}

impl fmt::Display for LlmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic class of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanClass {
    /// A discrete model call.
    Llm(LlmKind),
    /// An agent SDK run marker contributing `turns` to the turn total.
    AgentTurn { turns: u64 },
    /// Anything else, including spans without records.
    Other,
}

impl SpanClass {
    pub fn label(&self) -> &'static str {
        match self {
            SpanClass::Llm(kind) => kind.as_str(),
            SpanClass::AgentTurn { .. } => "agent_turn_marker",
            SpanClass::Other => "other",
        }
    }
}

impl fmt::Display for SpanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies spans by their header record.
#[derive(Debug, Clone)]
pub struct SpanClassifier {
    summary_prefix: String,
}

impl Default for SpanClassifier {
    fn default() -> Self {
        Self::with_summary_prompt(TOOL_RESPONSE_SUMMARIZER_PROMPT)
    }
}

impl SpanClassifier {
    /// Creates a classifier matching the leading characters of `prompt`.
    pub fn with_summary_prompt(prompt: &str) -> Self {
        Self {
            summary_prefix: prompt.chars().take(SUMMARY_PREFIX_CHARS).collect(),
        }
    }

    /// Returns the prefix that marks summary calls.
    pub fn summary_prefix(&self) -> &str {
        &self.summary_prefix
    }

    /// Classifies one span. Missing fields read as absent.
    pub fn classify(&self, span: &Span) -> SpanClass {
        match span.payload() {
            Some(payload) => self.classify_payload(&payload),
            None => SpanClass::Other,
        }
    }

    /// Classifies an already-parsed header payload.
    pub fn classify_payload(&self, payload: &RecordPayload) -> SpanClass {
        match payload {
            RecordPayload::Llm(call) => {
                let Some(first) = call.first_message() else {
                    return SpanClass::Llm(LlmKind::Thought);
                };
                if first.role == RAW_ROLE {
                    return SpanClass::Llm(LlmKind::Prompt);
                }
                let is_summary = !self.summary_prefix.is_empty()
                    && first
                        .content
                        .as_deref()
                        .is_some_and(|content| content.starts_with(&self.summary_prefix));
                if is_summary {
                    SpanClass::Llm(LlmKind::Summary)
                } else {
                    SpanClass::Llm(LlmKind::Thought)
                }
            }
            RecordPayload::AgentTurn(turn) => SpanClass::AgentTurn { turns: turn.turns },
            RecordPayload::Tool(_) | RecordPayload::Other { .. } => SpanClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::types::{Record, AGENT_TURN_TAG, LLM_TAG, TOOL_TAG};
    use serde_json::json;

    fn llm_span(role: &str, content: &str) -> Span {
        Span::new("s").with_record(
            Record::new(LLM_TAG).with_field("messages", json!([{"role": role, "content": content}])),
        )
    }

    #[test]
    fn test_raw_role_is_prompt() {
        let classifier = SpanClassifier::default();
        let span = llm_span("raw", TOOL_RESPONSE_SUMMARIZER_PROMPT);
        assert_eq!(classifier.classify(&span), SpanClass::Llm(LlmKind::Prompt));
    }

    #[test]
    fn test_summary_prefix_match() {
        let classifier = SpanClassifier::default();
        let content = format!("{}\n\n{{\"rows\": 3}}", TOOL_RESPONSE_SUMMARIZER_PROMPT);
        assert_eq!(
            classifier.classify(&llm_span("user", &content)),
            SpanClass::Llm(LlmKind::Summary)
        );
        assert_eq!(
            classifier.classify(&llm_span("user", "Plan the next step")),
            SpanClass::Llm(LlmKind::Thought)
        );
    }

    #[test]
    fn test_prefix_uses_leading_characters_only() {
        let classifier = SpanClassifier::with_summary_prompt("Condense this tool output, please, carefully");
        assert_eq!(classifier.summary_prefix(), "Condense this tool o");
        assert_eq!(
            classifier.classify(&llm_span("system", "Condense this tool o and more")),
            SpanClass::Llm(LlmKind::Summary)
        );
    }

    #[test]
    fn test_llm_without_messages_is_thought() {
        let classifier = SpanClassifier::default();
        let span = Span::new("s").with_record(Record::new(LLM_TAG));
        assert_eq!(classifier.classify(&span), SpanClass::Llm(LlmKind::Thought));
    }

    #[test]
    fn test_non_text_content_is_thought() {
        let classifier = SpanClassifier::default();
        let span = Span::new("s").with_record(
            Record::new(LLM_TAG)
                .with_field("messages", json!([{"role": "user", "content": [{"type": "text"}]}])),
        );
        assert_eq!(classifier.classify(&span), SpanClass::Llm(LlmKind::Thought));
    }

    #[test]
    fn test_empty_prefix_never_matches() {
        let classifier = SpanClassifier::with_summary_prompt("");
        assert_eq!(
            classifier.classify(&llm_span("user", "anything")),
            SpanClass::Llm(LlmKind::Thought)
        );
    }

    #[test]
    fn test_agent_turn_marker() {
        let classifier = SpanClassifier::default();
        let span = Span::new("s").with_record(Record::new(AGENT_TURN_TAG).with_field("turns", json!(4)));
        assert_eq!(classifier.classify(&span), SpanClass::AgentTurn { turns: 4 });

        let span = Span::new("s").with_record(Record::new(AGENT_TURN_TAG));
        assert_eq!(classifier.classify(&span), SpanClass::AgentTurn { turns: 1 });
    }

    #[test]
    fn test_only_header_record_counts() {
        let classifier = SpanClassifier::default();
        let span = Span::new("s")
            .with_record(Record::new(TOOL_TAG))
            .with_record(Record::new(LLM_TAG));
        assert_eq!(classifier.classify(&span), SpanClass::Other);
    }

    #[test]
    fn test_empty_span_is_other() {
        let classifier = SpanClassifier::default();
        assert_eq!(classifier.classify(&Span::new("s")), SpanClass::Other);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SpanClass::Llm(LlmKind::Summary).to_string(), "llm_summary");
        assert_eq!(SpanClass::AgentTurn { turns: 2 }.label(), "agent_turn_marker");
        assert_eq!(SpanClass::Other.label(), "other");
        assert_eq!(serde_json::to_string(&LlmKind::Prompt).unwrap(), "\"llm_prompt\"");
    }
}
