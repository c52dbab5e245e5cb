//! Trace walking.
//!
//! One pass over a trace's spans yields the per-kind call counts, the turn
//! total, the set of referenced parents and the parent/child adjacency used
//! to draw the trace tree. The adjacency is for rendering only; every number
//! in [`TraceAnalysis`] comes from the pass itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use super::classify::{LlmKind, SpanClass, SpanClassifier};
use super::store::TraceStore;
use super::types::{RecordPayload, Span, Usage};

/// Label drawn for spans that carry no records.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Everything learned from one trace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceAnalysis {
    /// Occurrences of each model-call kind.
    pub kind_counts: BTreeMap<LlmKind, u64>,
    /// Distinct parent ids referenced by any span.
    pub parent_ids: BTreeSet<String>,
    /// Number of model-call spans of any kind.
    pub llm_call_count: u64,
    /// Sum of turn contributions from agent turn markers.
    pub total_turns: u64,
    /// Children of each parent, ordered by sibling index.
    pub children: BTreeMap<String, Vec<ChildSpan>>,
    /// Labels of non-empty spans in trace order.
    pub iterations: Vec<String>,
    /// Token usage reported by model-call and turn-marker spans.
    pub usage: Usage,
    /// Total number of spans, including empty ones.
    pub span_count: usize,
    /// Summed running time of root spans, in seconds.
    pub root_running_time: f64,
}

impl TraceAnalysis {
    /// Count shown in reports: model calls, or turns for agents that expose
    /// no discrete model-call spans.
    pub fn reported_call_count(&self) -> u64 {
        if self.llm_call_count == 0 {
            self.total_turns
        } else {
            self.llm_call_count
        }
    }

    /// Returns true if the trace held no spans.
    pub fn is_empty(&self) -> bool {
        self.span_count == 0
    }

    /// Returns the count recorded for a model-call kind.
    pub fn count(&self, kind: LlmKind) -> u64 {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }
}

/// Descriptor of a child span, kept for drawing the trace tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildSpan {
    pub id: String,
    pub span_index: u32,
    pub running_time: f64,
    pub timestamp: f64,
    pub record_count: usize,
    pub class: String,
    pub tool_name: Option<String>,
    pub usage: Option<Usage>,
    pub error: Option<String>,
}

impl ChildSpan {
    fn describe(span: &Span, class: SpanClass, payload: Option<&RecordPayload>) -> Self {
        let class = if span.records.is_empty() {
            UNKNOWN_LABEL.to_string()
        } else {
            class.label().to_string()
        };

        Self {
            id: span.id.clone(),
            span_index: span.span_index,
            running_time: span.running_time,
            timestamp: span.timestamp,
            record_count: span.records.len(),
            class,
            tool_name: payload.and_then(|p| p.tool_name()).map(str::to_string),
            usage: payload.and_then(RecordPayload::usage),
            error: payload.and_then(|p| p.error()).map(str::to_string),
        }
    }
}

/// Walks traces held in a [`TraceStore`].
pub struct TraceWalker<'a> {
    store: &'a dyn TraceStore,
    classifier: SpanClassifier,
}

impl<'a> TraceWalker<'a> {
    pub fn new(store: &'a dyn TraceStore, classifier: SpanClassifier) -> Self {
        Self { store, classifier }
    }

    pub fn classifier(&self) -> &SpanClassifier {
        &self.classifier
    }

    /// Analyzes every span recorded under `trace_id`.
    ///
    /// An unknown or empty trace yields an all-zero analysis.
    pub fn analyze(&self, trace_id: &str) -> TraceAnalysis {
        let spans = self.store.get(trace_id);
        let analysis = self.analyze_spans(&spans);
        debug!(
            trace_id,
            spans = analysis.span_count,
            llm_calls = analysis.llm_call_count,
            turns = analysis.total_turns,
            "Analyzed trace"
        );
        analysis
    }

    /// Analyzes an already-fetched span sequence.
    pub fn analyze_spans(&self, spans: &[Span]) -> TraceAnalysis {
        let mut analysis = TraceAnalysis {
            span_count: spans.len(),
            ..Default::default()
        };
        let mut root_times = Vec::new();

        for span in spans {
            let payload = span.payload();
            let class = payload
                .as_ref()
                .map(|p| self.classifier.classify_payload(p))
                .unwrap_or(SpanClass::Other);

            match class {
                SpanClass::Llm(kind) => {
                    let count = analysis.kind_counts.entry(kind).or_insert(0);
                    *count = count.saturating_add(1);
                    analysis.llm_call_count = analysis.llm_call_count.saturating_add(1);
                }
                SpanClass::AgentTurn { turns } => {
                    analysis.total_turns = analysis.total_turns.saturating_add(turns);
                }
                SpanClass::Other => {}
            }

            if matches!(class, SpanClass::Llm(_) | SpanClass::AgentTurn { .. }) {
                if let Some(usage) = payload.as_ref().and_then(RecordPayload::usage) {
                    analysis.usage = analysis.usage.saturating_add(usage);
                }
            }

            if let Some(header) = span.header() {
                let label = match class {
                    SpanClass::Other if !header.kind_tag.is_empty() => header.kind_tag.clone(),
                    _ => class.label().to_string(),
                };
                analysis.iterations.push(label);
            }

            match &span.parent_id {
                Some(parent_id) => {
                    analysis.parent_ids.insert(parent_id.clone());
                    analysis
                        .children
                        .entry(parent_id.clone())
                        .or_default()
                        .push(ChildSpan::describe(span, class, payload.as_ref()));
                }
                None => root_times.push(span.running_time),
            }
        }

        for children in analysis.children.values_mut() {
            children.sort_by(|a, b| {
                a.span_index
                    .cmp(&b.span_index)
                    .then(a.timestamp.total_cmp(&b.timestamp))
            });
        }

        root_times.sort_by(f64::total_cmp);
        analysis.root_running_time = root_times.iter().sum();

        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::classify::TOOL_RESPONSE_SUMMARIZER_PROMPT;
    use crate::trace::store::MemoryTraceStore;
    use crate::trace::types::{Record, AGENT_TURN_TAG, LLM_TAG, TOOL_TAG};
    use serde_json::json;

    fn llm(id: &str, content: &str) -> Span {
        Span::new(id).with_record(
            Record::new(LLM_TAG)
                .with_field("messages", json!([{"role": "user", "content": content}]))
                .with_field("usage", json!({"prompt_tokens": 10, "completion_tokens": 5})),
        )
    }

    fn sample_store() -> MemoryTraceStore {
        let store = MemoryTraceStore::new();
        store.extend(
            "t1",
            vec![
                Span::new("root").with_timing(100.0, 12.5),
                llm("a", "think").with_parent("root").with_index(2),
                llm("b", "think again").with_parent("root").with_index(0),
                llm("c", TOOL_RESPONSE_SUMMARIZER_PROMPT)
                    .with_parent("root")
                    .with_index(1),
                Span::new("d")
                    .with_parent("root")
                    .with_index(3)
                    .with_record(Record::new(AGENT_TURN_TAG).with_field("turns", json!(4))),
                Span::new("e")
                    .with_parent("d")
                    .with_record(Record::new(TOOL_TAG).with_field("tool_name", json!("query"))),
                Span::new("f").with_parent("d").with_index(1),
            ],
        );
        store
    }

    #[test]
    fn test_empty_trace() {
        let store = MemoryTraceStore::new();
        let walker = TraceWalker::new(&store, SpanClassifier::default());
        let analysis = walker.analyze("nope");

        assert!(analysis.is_empty());
        assert!(analysis.kind_counts.is_empty());
        assert!(analysis.parent_ids.is_empty());
        assert!(analysis.children.is_empty());
        assert_eq!(analysis.llm_call_count, 0);
        assert_eq!(analysis.total_turns, 0);
        assert_eq!(analysis.reported_call_count(), 0);
    }

    #[test]
    fn test_counts_and_turns() {
        let store = sample_store();
        let walker = TraceWalker::new(&store, SpanClassifier::default());
        let analysis = walker.analyze("t1");

        assert_eq!(analysis.count(LlmKind::Thought), 2);
        assert_eq!(analysis.count(LlmKind::Summary), 1);
        assert_eq!(analysis.count(LlmKind::Prompt), 0);
        assert_eq!(analysis.kind_counts.len(), 2);
        assert_eq!(analysis.llm_call_count, 3);
        assert_eq!(analysis.total_turns, 4);
        assert_eq!(analysis.reported_call_count(), 3);
        assert_eq!(analysis.span_count, 7);
        assert_eq!(analysis.usage.prompt_tokens, 30);
        assert_eq!(analysis.usage.completion_tokens, 15);
        assert!((analysis.root_running_time - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let store = MemoryTraceStore::new();
        let turns = || Record::new(AGENT_TURN_TAG).with_field("turns", json!(u64::MAX));
        store.extend(
            "big",
            vec![
                Span::new("a").with_record(turns()),
                Span::new("b").with_record(turns()),
                Span::new("c").with_record(Record::new(LLM_TAG).with_field(
                    "usage",
                    json!({"prompt_tokens": u64::MAX, "completion_tokens": u64::MAX}),
                )),
                llm("d", "think"),
            ],
        );

        let analysis = TraceWalker::new(&store, SpanClassifier::default()).analyze("big");
        assert_eq!(analysis.total_turns, u64::MAX);
        assert_eq!(analysis.llm_call_count, 2);
        assert_eq!(analysis.usage.prompt_tokens, u64::MAX);
        assert_eq!(analysis.usage.completion_tokens, u64::MAX);
        assert_eq!(analysis.usage.total(), u64::MAX);
    }

    #[test]
    fn test_parent_ids_and_adjacency() {
        let store = sample_store();
        let walker = TraceWalker::new(&store, SpanClassifier::default());
        let analysis = walker.analyze("t1");

        let parents: Vec<&str> = analysis.parent_ids.iter().map(String::as_str).collect();
        assert_eq!(parents, vec!["d", "root"]);

        let root_children: Vec<&str> = analysis.children["root"]
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(root_children, vec!["b", "c", "a", "d"]);

        let d_children = &analysis.children["d"];
        assert_eq!(d_children[0].class, "other");
        assert_eq!(d_children[0].tool_name.as_deref(), Some("query"));
        assert_eq!(d_children[1].class, UNKNOWN_LABEL);
        assert_eq!(d_children[1].record_count, 0);
        assert_eq!(analysis.children["root"][3].class, "agent_turn_marker");
    }

    #[test]
    fn test_iterations_skip_empty_spans() {
        let store = sample_store();
        let walker = TraceWalker::new(&store, SpanClassifier::default());
        let analysis = walker.analyze("t1");

        assert_eq!(
            analysis.iterations,
            vec![
                "llm_thought",
                "llm_thought",
                "llm_summary",
                "agent_turn_marker",
                "tool"
            ]
        );
    }

    #[test]
    fn test_prompt_spans_never_add_turns() {
        let walker_store = MemoryTraceStore::new();
        walker_store.append(
            "t",
            Span::new("p").with_record(
                Record::new(LLM_TAG).with_field("messages", json!([{"role": "raw", "content": "x"}])),
            ),
        );
        let walker = TraceWalker::new(&walker_store, SpanClassifier::default());
        let analysis = walker.analyze("t");

        assert_eq!(analysis.count(LlmKind::Prompt), 1);
        assert_eq!(analysis.total_turns, 0);
    }

    #[test]
    fn test_turn_fallback_when_no_llm_spans() {
        let store = MemoryTraceStore::new();
        store.append(
            "t",
            Span::new("m").with_record(Record::new(AGENT_TURN_TAG).with_field("turns", json!(6))),
        );
        let walker = TraceWalker::new(&store, SpanClassifier::default());
        let analysis = walker.analyze("t");

        assert!(analysis.kind_counts.is_empty());
        assert_eq!(analysis.llm_call_count, 0);
        assert_eq!(analysis.reported_call_count(), 6);
    }
}
