//! Benchmark run model and per-task aggregation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bench_report::benchmark::{BenchmarkRun, ReportBuilder};
//! use bench_report::trace::MemoryTraceStore;
//!
//! let run = BenchmarkRun::from_json_file("run.json")?;
//! let store = MemoryTraceStore::from_json_file("traces.json")?;
//! let report = ReportBuilder::new(&store).build(&run)?;
//! println!("{:.2}% passed", report.evaluation.success_rate());
//! ```

pub mod builder;
pub mod task;
pub mod types;

pub use builder::{task_result, BenchmarkSection, ReportBuilder, RunReport};
pub use task::{TaskAggregator, TaskStats, NO_RATIO};
pub use types::{
    BenchmarkConfig, BenchmarkEntry, BenchmarkResult, BenchmarkRun, EvaluationOutcome,
    LlmDescriptor, TaskOutcome,
};
