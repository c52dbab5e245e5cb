//! Execution trace analysis.
//!
//! Spans recorded during a benchmark run are classified by their header
//! record and walked once per task to produce call counts, turn totals and
//! a parent/child view of the run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bench_report::trace::{MemoryTraceStore, SpanClassifier, TraceWalker};
//!
//! let store = MemoryTraceStore::from_json_file("traces.json")?;
//! let walker = TraceWalker::new(&store, SpanClassifier::default());
//! let analysis = walker.analyze("trace-123");
//! println!("{} model calls", analysis.reported_call_count());
//! ```

pub mod classify;
pub mod store;
pub mod types;
pub mod walker;

pub use classify::{LlmKind, SpanClass, SpanClassifier, TOOL_RESPONSE_SUMMARIZER_PROMPT};
pub use store::{MemoryTraceStore, TraceStore};
pub use types::{Record, RecordPayload, Span, Usage};
pub use walker::{ChildSpan, TraceAnalysis, TraceWalker};
