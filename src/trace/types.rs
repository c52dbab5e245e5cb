//! Span and record types for benchmark execution traces.
//!
//! A trace is the set of spans sharing one trace id. Each span carries an
//! ordered list of records; the first record is the span's header and holds
//! the fields that decide what kind of work the span represents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record tag for a single model call.
pub const LLM_TAG: &str = "llm";

/// Record tag emitted once per agent SDK run, carrying a turn count.
pub const AGENT_TURN_TAG: &str = "openai_agent_sdk";

/// Record tag for a tool invocation.
pub const TOOL_TAG: &str = "tool";

/// One observed unit of execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Identifier, unique within a run.
    pub id: String,
    /// Parent span identifier; `None` for roots.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ordering hint among siblings.
    #[serde(default)]
    pub span_index: u32,
    /// Wall-clock start, seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: f64,
    /// Elapsed seconds.
    #[serde(default)]
    pub running_time: f64,
    /// Event payloads, header first. May be empty.
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Span {
    /// Creates a root span with no records.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            span_index: 0,
            timestamp: 0.0,
            running_time: 0.0,
            records: Vec::new(),
        }
    }

    /// Sets the parent span.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Sets the sibling index.
    pub fn with_index(mut self, span_index: u32) -> Self {
        self.span_index = span_index;
        self
    }

    /// Sets the start timestamp and running time.
    pub fn with_timing(mut self, timestamp: f64, running_time: f64) -> Self {
        self.timestamp = timestamp;
        self.running_time = running_time.max(0.0);
        self
    }

    /// Appends a record.
    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Returns the header record, if any.
    pub fn header(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Returns the typed payload of the header record.
    pub fn payload(&self) -> Option<RecordPayload> {
        self.header().map(Record::payload)
    }
}

/// A single event payload inside a span.
///
/// The wire form is a flat JSON object whose `type` key is the kind tag;
/// every other key is kept as an auxiliary field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Coarse category, e.g. `llm`, `tool`, `openai_agent_sdk`.
    #[serde(rename = "type", default)]
    pub kind_tag: String,
    /// Kind-dependent auxiliary fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with the given tag and no fields.
    pub fn new(kind_tag: impl Into<String>) -> Self {
        Self {
            kind_tag: kind_tag.into(),
            fields: Map::new(),
        }
    }

    /// Adds an auxiliary field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Parses the auxiliary fields into a typed payload.
    ///
    /// Never fails: absent or malformed fields read as absent.
    pub fn payload(&self) -> RecordPayload {
        match self.kind_tag.as_str() {
            LLM_TAG => RecordPayload::Llm(LlmCall {
                messages: self.messages(),
                usage: self.usage(),
                error: self.text_field("error"),
            }),
            AGENT_TURN_TAG => RecordPayload::AgentTurn(AgentTurn {
                turns: turn_count(self.fields.get("turns")),
                usage: self.usage(),
                error: self.text_field("error"),
            }),
            TOOL_TAG => RecordPayload::Tool(ToolCall {
                tool_name: self.text_field("tool_name"),
                error: self.text_field("error"),
            }),
            tag => RecordPayload::Other {
                tag: tag.to_string(),
                fields: self.fields.clone(),
            },
        }
    }

    fn text_field(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn messages(&self) -> Vec<ChatMessage> {
        let Some(items) = self.fields.get("messages").and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .map(|item| ChatMessage {
                role: item
                    .get("role")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content: item
                    .get("content")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect()
    }

    fn usage(&self) -> Option<Usage> {
        let usage = self.fields.get("usage")?.as_object()?;
        let prompt = first_count(usage, &["prompt_tokens", "input_tokens"]);
        let completion = first_count(usage, &["completion_tokens", "output_tokens"]);

        if prompt.is_none() && completion.is_none() {
            return None;
        }

        Some(Usage {
            prompt_tokens: prompt.unwrap_or(0),
            completion_tokens: completion.unwrap_or(0),
        })
    }
}

/// Typed view of a header record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    /// A model call.
    Llm(LlmCall),
    /// An agent SDK run spanning one or more turns.
    AgentTurn(AgentTurn),
    /// A tool invocation.
    Tool(ToolCall),
    /// Any other tag, with its fields left unmodelled.
    Other {
        tag: String,
        fields: Map<String, Value>,
    },
}

impl RecordPayload {
    /// Tool name, for tool invocations.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            RecordPayload::Tool(call) => call.tool_name.as_deref(),
            _ => None,
        }
    }

    /// Token usage, when the record reports it.
    pub fn usage(&self) -> Option<Usage> {
        match self {
            RecordPayload::Llm(call) => call.usage,
            RecordPayload::AgentTurn(turn) => turn.usage,
            _ => None,
        }
    }

    /// Error text, when the record reports a non-empty one.
    pub fn error(&self) -> Option<&str> {
        match self {
            RecordPayload::Llm(call) => call.error.as_deref(),
            RecordPayload::AgentTurn(turn) => turn.error.as_deref(),
            RecordPayload::Tool(call) => call.error.as_deref(),
            RecordPayload::Other { fields, .. } => fields
                .get("error")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Header fields of a model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmCall {
    pub messages: Vec<ChatMessage>,
    pub usage: Option<Usage>,
    pub error: Option<String>,
}

impl LlmCall {
    /// Returns the first message of the conversation sent to the model.
    pub fn first_message(&self) -> Option<&ChatMessage> {
        self.messages.first()
    }
}

/// One chat message. Non-text content reads as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
}

/// Header fields of an agent SDK run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTurn {
    /// Turns taken; 1 when absent or non-numeric.
    pub turns: u64,
    pub usage: Option<Usage>,
    pub error: Option<String>,
}

/// Header fields of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCall {
    pub tool_name: Option<String>,
    pub error: Option<String>,
}

/// Token counts reported by a single record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Usage {
    /// Returns prompt plus completion tokens.
    pub fn total(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Field-wise sum, clamped at `u64::MAX`.
    pub fn saturating_add(self, other: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens.saturating_add(other.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(other.completion_tokens),
        }
    }
}

fn turn_count(value: Option<&Value>) -> u64 {
    value
        .and_then(|v| {
            v.as_u64().or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
        })
        .unwrap_or(1)
}

fn first_count(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_u64))
}
