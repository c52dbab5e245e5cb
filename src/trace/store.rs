//! Trace storage.
//!
//! Spans are appended while a benchmark run executes and read back once the
//! run is over. Reads of unknown trace ids return an empty sequence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use tracing::{debug, warn};

use super::types::Span;
use crate::error::TraceStoreError;

/// Read access to collected spans, keyed by trace id.
pub trait TraceStore: Send + Sync {
    /// Returns every span recorded under `trace_id`, in insertion order.
    fn get(&self, trace_id: &str) -> Vec<Span>;
}

/// Append-only in-memory trace store.
///
/// Safe to share behind an `Arc` between concurrently running tasks.
#[derive(Debug, Default)]
pub struct MemoryTraceStore {
    spans: RwLock<HashMap<String, Vec<Span>>>,
}

impl MemoryTraceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON dump shaped as `{ "<trace_id>": [span, ...], ... }`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TraceStoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TraceStoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents).map_err(|source| TraceStoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a JSON dump from a string.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let spans: HashMap<String, Vec<Span>> = serde_json::from_str(contents)?;
        debug!(traces = spans.len(), "Loaded trace dump");
        Ok(Self {
            spans: RwLock::new(spans),
        })
    }

    /// Appends one span to a trace.
    pub fn append(&self, trace_id: &str, span: Span) {
        let Ok(mut guard) = self.spans.write() else {
            warn!(trace_id, "Failed to acquire trace store lock");
            return;
        };
        guard.entry(trace_id.to_string()).or_default().push(span);
    }

    /// Appends several spans to a trace, preserving their order.
    pub fn extend(&self, trace_id: &str, spans: impl IntoIterator<Item = Span>) {
        let Ok(mut guard) = self.spans.write() else {
            warn!(trace_id, "Failed to acquire trace store lock");
            return;
        };
        guard.entry(trace_id.to_string()).or_default().extend(spans);
    }

    /// Returns the number of traces held.
    pub fn trace_count(&self) -> usize {
        self.spans.read().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl TraceStore for MemoryTraceStore {
    fn get(&self, trace_id: &str) -> Vec<Span> {
        let Ok(guard) = self.spans.read() else {
            warn!(trace_id, "Failed to acquire trace store lock");
            return Vec::new();
        };
        guard.get(trace_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_trace_is_empty() {
        let store = MemoryTraceStore::new();
        assert!(store.get("missing").is_empty());
        assert_eq!(store.trace_count(), 0);
    }

    #[test]
    fn test_append_preserves_order() {
        let store = MemoryTraceStore::new();
        store.append("t1", Span::new("a"));
        store.append("t1", Span::new("b"));
        store.extend("t2", vec![Span::new("c")]);

        let ids: Vec<String> = store.get("t1").into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.get("t2").len(), 1);
        assert_eq!(store.trace_count(), 2);
    }

    #[test]
    fn test_concurrent_appends() {
        let store = Arc::new(MemoryTraceStore::new());
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.append("shared", Span::new(format!("{worker}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("shared").len(), 100);
    }

    #[test]
    fn test_from_json_str() {
        let store = MemoryTraceStore::from_json_str(
            r#"{"t1": [{"id": "s1", "records": [{"type": "llm"}]}, {"id": "s2", "parent_id": "s1"}]}"#,
        )
        .unwrap();
        let spans = store.get("t1");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].parent_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_from_json_file_errors() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            MemoryTraceStore::from_json_file(&missing),
            Err(TraceStoreError::Read { .. })
        ));

        let bad = temp_dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert!(matches!(
            MemoryTraceStore::from_json_file(&bad),
            Err(TraceStoreError::Parse { .. })
        ));
    }
}
