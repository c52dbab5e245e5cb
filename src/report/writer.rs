//! Artifact output.
//!
//! The report and summary writes are best-effort: failures are logged and
//! reported as `None`, never raised, so a benchmark run is not aborted by a
//! full disk or a bad output path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use super::markdown::MarkdownRenderer;
use super::meta::TaskMeta;
use super::summary::ModelSummary;
use crate::benchmark::RunReport;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::results::{EvaluationReport, TaskResult};

/// File name of per-task metadata.
pub const META_FILE: &str = "meta.json";

/// File name of per-task conversation messages.
pub const MESSAGES_FILE: &str = "messages.json";

/// Paths of the artifacts that were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrittenArtifacts {
    pub report: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// Writes report artifacts under a base directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    base_dir: PathBuf,
    run_dir: Option<String>,
    report_name: Option<String>,
    summary_name: Option<String>,
    renderer: MarkdownRenderer,
}

impl ReportWriter {
    /// Creates a writer rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            run_dir: None,
            report_name: None,
            summary_name: None,
            renderer: MarkdownRenderer::default(),
        }
    }

    /// Creates a writer from configuration.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            base_dir: config.output_dir.clone(),
            run_dir: config.run_dir.clone(),
            report_name: config.report_name.clone(),
            summary_name: config.summary_name.clone(),
            renderer: MarkdownRenderer::default(),
        }
    }

    pub fn with_run_dir(mut self, run_dir: impl Into<String>) -> Self {
        self.run_dir = Some(run_dir.into());
        self
    }

    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = Some(name.into());
        self
    }

    pub fn with_summary_name(mut self, name: impl Into<String>) -> Self {
        self.summary_name = Some(name.into());
        self
    }

    pub fn with_renderer(mut self, renderer: MarkdownRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Directory artifacts of this run are written to.
    pub fn output_dir(&self) -> PathBuf {
        match &self.run_dir {
            Some(run_dir) => self.base_dir.join(run_dir),
            None => self.base_dir.clone(),
        }
    }

    /// Creates the output directory up front. Returns false on failure.
    pub async fn prepare(&self) -> bool {
        match ensure_directory(&self.output_dir()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Output directory unavailable");
                false
            }
        }
    }

    /// Renders and writes the Markdown report.
    pub async fn write_report(&self, report: &RunReport) -> Option<PathBuf> {
        let document = match self.renderer.render(report) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Failed to render report");
                return None;
            }
        };
        let name = self
            .report_name
            .clone()
            .unwrap_or_else(|| default_name("report", "md"));
        self.write_best_effort(&name, &document).await
    }

    /// Writes the JSON model summary.
    pub async fn write_summary(&self, evaluation: &EvaluationReport) -> Option<PathBuf> {
        let json = match ModelSummary::from_report(evaluation).to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize summary");
                return None;
            }
        };
        let name = self
            .summary_name
            .clone()
            .unwrap_or_else(|| default_name("summary", "json"));
        self.write_best_effort(&name, &json).await
    }

    /// Writes both artifacts. The two writes are independent.
    pub async fn write_all(&self, report: &RunReport) -> WrittenArtifacts {
        self.prepare().await;
        WrittenArtifacts {
            report: self.write_report(report).await,
            summary: self.write_summary(&report.evaluation).await,
        }
    }

    /// Saves a task's metadata to `<output>/<task_name>/meta.json`.
    pub async fn save_meta_json(
        &self,
        result: &TaskResult,
        model_config: &Value,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PathBuf, ReportError> {
        let meta = TaskMeta::new(result, model_config, start, end);
        let json = serde_json::to_string_pretty(&meta)?;
        self.write_task_file(&result.task_name, META_FILE, &json)
            .await
    }

    /// Saves a task's conversation to `<output>/<task_name>/messages.json`.
    pub async fn save_messages_json(
        &self,
        task_name: &str,
        messages: &Value,
    ) -> Result<PathBuf, ReportError> {
        let json = serde_json::to_string_pretty(messages)?;
        self.write_task_file(task_name, MESSAGES_FILE, &json).await
    }

    async fn write_task_file(
        &self,
        task_name: &str,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf, ReportError> {
        if !is_single_component(task_name) {
            return Err(ReportError::InvalidTaskName(task_name.to_string()));
        }
        let dir = self.output_dir().join(task_name);
        ensure_directory(&dir).await?;
        let path = dir.join(file_name);
        fs::write(&path, contents).await?;
        debug!(path = %path.display(), "Saved task artifact");
        Ok(path)
    }

    async fn write_best_effort(&self, name: &str, contents: &str) -> Option<PathBuf> {
        let dir = self.output_dir();
        if let Err(e) = ensure_directory(&dir).await {
            warn!(error = %e, file = name, "Skipping artifact write");
            return None;
        }

        let path = dir.join(name);
        match fs::write(&path, contents).await {
            Ok(()) => {
                info!(path = %path.display(), "Wrote artifact");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write artifact");
                None
            }
        }
    }
}

/// True when `name` can be joined onto a directory without leaving it.
fn is_single_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute()
}

/// Loads every `meta.json` under `dir` as a task result, sorted by task name.
///
/// Unreadable or malformed files are logged and skipped.
pub async fn load_task_results(dir: impl AsRef<Path>) -> Vec<TaskResult> {
    let mut results = Vec::new();

    for entry in WalkDir::new(dir.as_ref())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == META_FILE)
    {
        let path = entry.path();
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read task metadata");
                continue;
            }
        };
        match serde_json::from_str::<TaskMeta>(&contents) {
            Ok(meta) => results.push(meta.into_task_result()),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping invalid task metadata"),
        }
    }

    results.sort_by(|a, b| a.task_name.cmp(&b.task_name));
    debug!(count = results.len(), "Loaded task results");
    results
}

async fn ensure_directory(dir: &Path) -> Result<(), ReportError> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)
            .await
            .map_err(|source| ReportError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

fn default_name(prefix: &str, extension: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        prefix,
        Local::now().format("%Y%m%d_%H%M%S"),
        Uuid::new_v4(),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::TokenUsage;
    use serde_json::json;
    use tempfile::TempDir;

    fn evaluation() -> EvaluationReport {
        EvaluationReport::new(
            "gpt-test",
            json!({"model_name": "gpt-test"}),
            vec![
                TaskResult::new("alpha__one", true)
                    .with_category("alpha")
                    .with_token_usage(TokenUsage::new(10, 4))
                    .with_times(1.0, 2.0),
                TaskResult::new("beta__two", false).with_category("beta"),
            ],
        )
    }

    #[test]
    fn test_default_name_is_unique() {
        let a = default_name("report", "md");
        let b = default_name("report", "md");
        assert!(a.starts_with("report_"));
        assert!(a.ends_with(".md"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_dir() {
        let writer = ReportWriter::new("/base");
        assert_eq!(writer.output_dir(), PathBuf::from("/base"));
        assert_eq!(
            writer.with_run_dir("run-1").output_dir(),
            PathBuf::from("/base/run-1")
        );
    }

    #[tokio::test]
    async fn test_write_summary_named() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let writer = ReportWriter::new(temp_dir.path())
            .with_run_dir("nightly")
            .with_summary_name("summary.json");

        let path = writer.write_summary(&evaluation()).await.unwrap();
        assert_eq!(path, temp_dir.path().join("nightly").join("summary.json"));

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_tasks"], json!(2));
        assert_eq!(value["category_breakdown"]["alpha"]["success_rate"], json!(100.0));
    }

    #[tokio::test]
    async fn test_summary_rewrite_is_byte_identical() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let report = evaluation();

        let first = ReportWriter::new(temp_dir.path())
            .with_summary_name("a.json")
            .write_summary(&report)
            .await
            .unwrap();
        let second = ReportWriter::new(temp_dir.path())
            .with_summary_name("b.json")
            .write_summary(&report)
            .await
            .unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[tokio::test]
    async fn test_generated_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = ReportWriter::new(temp_dir.path())
            .write_summary(&evaluation())
            .await
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("summary_"));
        assert!(name.ends_with(".json"));
    }

    #[tokio::test]
    async fn test_write_failure_does_not_raise() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let writer = ReportWriter::new(&blocker).with_summary_name("summary.json");
        assert!(!writer.prepare().await);
        assert!(writer.write_summary(&evaluation()).await.is_none());
    }

    #[tokio::test]
    async fn test_meta_and_messages_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let writer = ReportWriter::new(temp_dir.path()).with_run_dir("run");
        let now = Utc::now();

        for result in evaluation().task_results() {
            let path = writer
                .save_meta_json(result, &json!({"model_name": "gpt-test"}), now, now)
                .await
                .unwrap();
            assert!(path.ends_with(format!("{}/meta.json", result.task_name)));
        }
        let messages = writer
            .save_messages_json("alpha__one", &json!([{"role": "user", "content": "hi"}]))
            .await
            .unwrap();
        assert!(messages.exists());

        let loaded = load_task_results(temp_dir.path()).await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].task_name, "alpha__one");
        assert!(loaded[0].success);
        assert_eq!(loaded[0].token_usage.total(), 14);
        assert_eq!(loaded[1].category(), "beta");
    }

    #[tokio::test]
    async fn test_load_accepts_naive_timestamps() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let task_dir = temp_dir.path().join("filesystem__rename");
        std::fs::create_dir_all(&task_dir).unwrap();
        let meta = json!({
            "task_name": "filesystem__rename",
            "model_name": "gpt-test",
            "litellm_run_model_name": null,
            "reasoning_effort": null,
            "mcp": "filesystem",
            "timeout": 300,
            "time": {
                "start": "2025-08-01T10:00:00.123456",
                "end": "2025-08-01T10:02:30.654321"
            },
            "agent_execution_time": 120.5,
            "task_execution_time": 150.5,
            "execution_result": {
                "success": true,
                "error_message": null,
                "verification_error": null,
                "verification_output": "ok"
            },
            "token_usage": {"input_tokens": 40, "output_tokens": 2, "total_tokens": 42},
            "turn_count": 3
        });
        std::fs::write(task_dir.join(META_FILE), meta.to_string()).unwrap();

        let loaded = load_task_results(temp_dir.path()).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].category(), "filesystem");
        assert_eq!(loaded[0].turn_count, Some(3));
        assert_eq!(loaded[0].token_usage.total(), 42);
    }

    #[tokio::test]
    async fn test_task_files_stay_inside_output_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let writer = ReportWriter::new(temp_dir.path().join("out"));
        let messages = json!([]);

        for name in ["../escaped", "..", ".", "", "a/b", "a\\b", "/abs"] {
            let err = writer.save_messages_json(name, &messages).await.unwrap_err();
            assert!(matches!(err, ReportError::InvalidTaskName(_)), "{name}");
        }
        let result = TaskResult::new("../meta", true);
        let err = writer
            .save_meta_json(&result, &json!({}), Utc::now(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidTaskName(_)));

        assert!(!temp_dir.path().join("escaped").exists());
        assert!(!temp_dir.path().join("meta").exists());
        assert!(!temp_dir.path().join("out").exists());

        let saved = writer.save_messages_json("a..b", &messages).await.unwrap();
        assert!(saved.starts_with(temp_dir.path().join("out").join("a..b")));
    }

    #[tokio::test]
    async fn test_load_skips_invalid_meta() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let bad = temp_dir.path().join("broken");
        std::fs::create_dir_all(&bad).unwrap();
        std::fs::write(bad.join(META_FILE), "{not json").unwrap();

        assert!(load_task_results(temp_dir.path()).await.is_empty());
        assert!(load_task_results(temp_dir.path().join("missing")).await.is_empty());
    }
}
