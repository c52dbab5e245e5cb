//! Task results, run-level evaluation reports and category rollups.

pub mod category;
pub mod types;

pub use category::{aggregate, CategoryAccumulator, CategoryStats};
pub use types::{EvaluationReport, TaskResult, TokenUsage, TASK_NAME_SEPARATOR, UNCATEGORIZED};
