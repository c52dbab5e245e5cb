//! Per-task metadata saved next to each task's messages.
//!
//! A `meta.json` file holds everything needed to rebuild the task's
//! [`TaskResult`], which is how summaries of resumed runs are regenerated.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::results::{TaskResult, TokenUsage};

/// Timeout recorded when the model configuration has none, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const UNKNOWN: &str = "unknown";

/// Start and end of a task.
///
/// Timestamps are written as RFC 3339. Reading also accepts timestamps
/// without an offset, which are taken as UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end: DateTime<Utc>,
}

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS[.ffffff]`
/// (a space separator also works) read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Verification outcome block of `meta.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub verification_error: Option<String>,
    #[serde(default)]
    pub verification_output: Option<String>,
}

/// Contents of a task's `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub task_name: String,
    pub model_name: String,
    #[serde(default)]
    pub litellm_run_model_name: Option<String>,
    #[serde(default)]
    pub reasoning_effort: Option<String>,
    /// Service the task ran against.
    #[serde(default = "unknown")]
    pub mcp: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    pub time: TimeWindow,
    #[serde(default)]
    pub agent_execution_time: f64,
    #[serde(default)]
    pub task_execution_time: f64,
    pub execution_result: ExecutionResult,
    #[serde(default)]
    pub token_usage: TokenUsage,
    #[serde(default)]
    pub turn_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_call_count: Option<u64>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn config_str(config: &Value, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::to_string)
}

impl TaskMeta {
    /// Builds metadata from a result and the model configuration it ran with.
    pub fn new(
        result: &TaskResult,
        model_config: &Value,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            task_name: result.task_name.clone(),
            model_name: config_str(model_config, "model_name").unwrap_or_else(unknown),
            litellm_run_model_name: config_str(model_config, "litellm_run_model_name"),
            reasoning_effort: config_str(model_config, "reasoning_effort"),
            mcp: config_str(model_config, "mcp_service").unwrap_or_else(unknown),
            timeout: model_config
                .get("timeout")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            time: TimeWindow { start, end },
            agent_execution_time: result.agent_execution_time,
            task_execution_time: result.task_execution_time,
            execution_result: ExecutionResult {
                success: result.success,
                error_message: result.error_message.clone(),
                verification_error: result.verification_error.clone(),
                verification_output: result.verification_output.clone(),
            },
            token_usage: result.token_usage,
            turn_count: result.turn_count,
            category_id: result.category_id.clone(),
            llm_call_count: result.llm_call_count,
        }
    }

    /// Rebuilds the task result. The category falls back to the task name
    /// prefix when none was saved.
    pub fn into_task_result(self) -> TaskResult {
        let split = TaskResult::split_task_name(&self.task_name)
            .map(|(category, task)| (category.to_string(), task.to_string()));
        let category_id = self
            .category_id
            .or_else(|| split.as_ref().map(|(category, _)| category.clone()));

        TaskResult {
            task_id: split.map(|(_, task)| task),
            task_name: self.task_name,
            success: self.execution_result.success,
            category_id,
            error_message: self.execution_result.error_message,
            verification_error: self.execution_result.verification_error,
            verification_output: self.execution_result.verification_output,
            token_usage: self.token_usage,
            turn_count: self.turn_count,
            llm_call_count: self.llm_call_count,
            agent_execution_time: self.agent_execution_time.max(0.0),
            task_execution_time: self.task_execution_time.max(0.0),
        }
    }
}
