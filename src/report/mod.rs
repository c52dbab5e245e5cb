//! Report artifacts.
//!
//! Two independent outputs are produced from a built run: a Markdown
//! document for humans and a JSON model summary for tooling. Per-task
//! `meta.json` and `messages.json` files are written alongside and can be
//! loaded back to regenerate the summary of a resumed run.

pub mod markdown;
pub mod meta;
pub mod summary;
pub mod writer;

pub use markdown::{MarkdownRenderer, REPORT_TEMPLATE};
pub use meta::TaskMeta;
pub use summary::{round2, CategorySummary, ModelSummary};
pub use writer::{load_task_results, ReportWriter, WrittenArtifacts, META_FILE, MESSAGES_FILE};
