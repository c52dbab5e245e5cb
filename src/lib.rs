//! bench-report: execution-trace analysis and report aggregation for
//! LLM agent benchmark runs.
//!
//! Spans collected while a run executes are classified and walked per task,
//! merged with each task's evaluation outcomes, rolled up per category and
//! written out as a Markdown report and a JSON model summary.

pub mod benchmark;
pub mod cli;
pub mod config;
pub mod error;
pub mod report;
pub mod results;
pub mod trace;

// Re-export commonly used types
pub use benchmark::{BenchmarkRun, ReportBuilder, RunReport, TaskStats};
pub use config::ReportConfig;
pub use error::{ConfigError, ReportError, TraceStoreError};
pub use report::{load_task_results, MarkdownRenderer, ModelSummary, ReportWriter};
pub use results::{aggregate, CategoryStats, EvaluationReport, TaskResult, TokenUsage};
pub use trace::{MemoryTraceStore, Span, SpanClassifier, TraceAnalysis, TraceStore, TraceWalker};
