//! Report generation configuration.
//!
//! Settings come from defaults, an optional YAML file and `REPORT_*`
//! environment variables, applied in that order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::trace::TOOL_RESPONSE_SUMMARIZER_PROMPT;

/// Default base directory for report artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "log";

/// Configuration for one report-generation invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Base directory for all artifacts.
    pub output_dir: PathBuf,
    /// Subdirectory of `output_dir` for this run.
    pub run_dir: Option<String>,
    /// File name of the Markdown report; generated when unset.
    pub report_name: Option<String>,
    /// File name of the JSON summary; generated when unset.
    pub summary_name: Option<String>,
    /// Prompt whose leading characters mark summary model calls.
    pub summary_prompt: String,
    /// Whether to write the Markdown report.
    pub write_markdown: bool,
    /// Whether to write the JSON summary.
    pub write_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            run_dir: None,
            report_name: None,
            summary_name: None,
            summary_prompt: TOOL_RESPONSE_SUMMARIZER_PROMPT.to_string(),
            write_markdown: true,
            write_summary: true,
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
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

    pub fn with_summary_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.summary_prompt = prompt.into();
        self
    }

    /// Loads configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Creates configuration from defaults and environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REPORT_OUTPUT_DIR`: base directory for artifacts
    /// - `REPORT_RUN_DIR`: run-specific subdirectory
    /// - `REPORT_NAME`: Markdown report file name
    /// - `REPORT_SUMMARY_NAME`: JSON summary file name
    /// - `REPORT_SUMMARY_PROMPT`: tool-response summarizer prompt; its leading
    ///   characters mark summary model calls
    /// - `REPORT_WRITE_MARKDOWN`, `REPORT_WRITE_SUMMARY`: enable flags
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `REPORT_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("REPORT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("REPORT_RUN_DIR") {
            self.run_dir = Some(val);
        }
        if let Some(val) = lookup("REPORT_NAME") {
            self.report_name = Some(val);
        }
        if let Some(val) = lookup("REPORT_SUMMARY_NAME") {
            self.summary_name = Some(val);
        }
        if let Some(val) = lookup("REPORT_SUMMARY_PROMPT") {
            self.summary_prompt = val;
        }
        if let Some(val) = lookup("REPORT_WRITE_MARKDOWN") {
            self.write_markdown = parse_env_bool(&val, "REPORT_WRITE_MARKDOWN")?;
        }
        if let Some(val) = lookup("REPORT_WRITE_SUMMARY") {
            self.write_summary = parse_env_bool(&val, "REPORT_WRITE_SUMMARY")?;
        }
        Ok(self)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output_dir cannot be empty".to_string(),
            ));
        }

        for (key, name) in [
            ("report_name", &self.report_name),
            ("summary_name", &self.summary_name),
        ] {
            if let Some(name) = name {
                if name.is_empty() || name.contains(['/', '\\']) {
                    return Err(ConfigError::ValidationFailed(format!(
                        "{key} must be a plain, non-empty file name"
                    )));
                }
            }
        }

        if let Some(run_dir) = &self.run_dir {
            if run_dir.is_empty() || Path::new(run_dir).is_absolute() {
                return Err(ConfigError::ValidationFailed(
                    "run_dir must be a non-empty relative path".to_string(),
                ));
            }
        }

        if self.summary_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "summary_prompt cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}
