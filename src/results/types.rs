//! Task results and the whole-run evaluation report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::{aggregate, CategoryAccumulator, CategoryStats};

/// Category used when a task carries none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Separator between category and task id in task names (`category__task`).
pub const TASK_NAME_SEPARATOR: &str = "__";

/// Token usage reported for one task. Absent counts read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

impl TokenUsage {
    /// Creates usage from input and output counts, with their sum as total.
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input_tokens: Some(input),
            output_tokens: Some(output),
            total_tokens: Some(input.saturating_add(output)),
            reasoning_tokens: None,
        }
    }

    /// Sets the reasoning token count.
    pub fn with_reasoning(mut self, reasoning: u64) -> Self {
        self.reasoning_tokens = Some(reasoning);
        self
    }

    pub fn input(&self) -> u64 {
        self.input_tokens.unwrap_or(0)
    }

    pub fn output(&self) -> u64 {
        self.output_tokens.unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total_tokens.unwrap_or(0)
    }

    pub fn reasoning(&self) -> u64 {
        self.reasoning_tokens.unwrap_or(0)
    }

    /// Returns true if no count is present.
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.total_tokens.is_none()
            && self.reasoning_tokens.is_none()
    }
}

/// Outcome of one benchmark task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Full task name, e.g. `category__task`.
    pub task_name: String,
    /// Whether the task passed verification.
    pub success: bool,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    /// Agent execution error.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Verification error, separate from the agent error.
    #[serde(default)]
    pub verification_error: Option<String>,
    /// Captured verification output.
    #[serde(default)]
    pub verification_output: Option<String>,
    #[serde(default)]
    pub token_usage: TokenUsage,
    /// Agent turns taken, when known.
    #[serde(default)]
    pub turn_count: Option<u64>,
    /// Discrete model calls observed in the trace, when known.
    #[serde(default)]
    pub llm_call_count: Option<u64>,
    /// Seconds spent in agent execution.
    #[serde(default)]
    pub agent_execution_time: f64,
    /// Seconds spent on the whole task, setup and verification included.
    #[serde(default)]
    pub task_execution_time: f64,
}

impl TaskResult {
    /// Creates a result with no usage, timing or error information.
    pub fn new(task_name: impl Into<String>, success: bool) -> Self {
        Self {
            task_name: task_name.into(),
            success,
            category_id: None,
            task_id: None,
            error_message: None,
            verification_error: None,
            verification_output: None,
            token_usage: TokenUsage::default(),
            turn_count: None,
            llm_call_count: None,
            agent_execution_time: 0.0,
            task_execution_time: 0.0,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = usage;
        self
    }

    pub fn with_turns(mut self, turns: u64) -> Self {
        self.turn_count = Some(turns);
        self
    }

    /// Sets agent and whole-task execution times in seconds.
    pub fn with_times(mut self, agent_execution_time: f64, task_execution_time: f64) -> Self {
        self.agent_execution_time = agent_execution_time.max(0.0);
        self.task_execution_time = task_execution_time.max(0.0);
        self
    }

    /// Returns `"PASS"` or `"FAIL"`.
    pub fn status(&self) -> &'static str {
        if self.success {
            "PASS"
        } else {
            "FAIL"
        }
    }

    /// Grouping key for category rollups.
    pub fn category(&self) -> &str {
        self.category_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED)
    }

    /// Splits a `category__task` name into its category and task id.
    pub fn split_task_name(task_name: &str) -> Option<(&str, &str)> {
        task_name
            .split_once(TASK_NAME_SEPARATOR)
            .filter(|(category, task)| !category.is_empty() && !task.is_empty())
    }
}

/// All task results of one model's run.
///
/// Task counts are derived from the result list at construction, and every
/// other metric is computed on demand, so none can drift from the list.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    model_name: String,
    model_config: Value,
    task_results: Vec<TaskResult>,
    successful_tasks: usize,
    tasks_filter: Option<String>,
}

impl EvaluationReport {
    pub fn new(
        model_name: impl Into<String>,
        model_config: Value,
        task_results: Vec<TaskResult>,
    ) -> Self {
        let successful_tasks = task_results.iter().filter(|r| r.success).count();
        Self {
            model_name: model_name.into(),
            model_config,
            task_results,
            successful_tasks,
            tasks_filter: None,
        }
    }

    /// Records the task filter the run was started with.
    pub fn with_tasks_filter(mut self, filter: impl Into<String>) -> Self {
        self.tasks_filter = Some(filter.into());
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_config(&self) -> &Value {
        &self.model_config
    }

    pub fn tasks_filter(&self) -> Option<&str> {
        self.tasks_filter.as_deref()
    }

    pub fn task_results(&self) -> &[TaskResult] {
        &self.task_results
    }

    pub fn total_tasks(&self) -> usize {
        self.task_results.len()
    }

    pub fn successful_tasks(&self) -> usize {
        self.successful_tasks
    }

    pub fn failed_tasks(&self) -> usize {
        self.total_tasks() - self.successful_tasks
    }

    /// Rollup over every task, as if the run were a single category.
    pub fn overall(&self) -> CategoryStats {
        self.task_results
            .iter()
            .fold(CategoryAccumulator::default(), CategoryAccumulator::push)
            .finalize()
    }

    /// Rollups per category id.
    pub fn category_stats(&self) -> std::collections::BTreeMap<String, CategoryStats> {
        aggregate(&self.task_results)
    }

    /// Success rate as a percentage; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        self.overall().success_rate
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.task_results
            .iter()
            .map(|r| r.token_usage.input())
            .fold(0, u64::saturating_add)
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.task_results
            .iter()
            .map(|r| r.token_usage.output())
            .fold(0, u64::saturating_add)
    }

    pub fn total_tokens(&self) -> u64 {
        self.task_results
            .iter()
            .map(|r| r.token_usage.total())
            .fold(0, u64::saturating_add)
    }

    pub fn total_reasoning_tokens(&self) -> u64 {
        self.task_results
            .iter()
            .map(|r| r.token_usage.reasoning())
            .fold(0, u64::saturating_add)
    }

    pub fn avg_input_tokens(&self) -> f64 {
        self.per_task(self.total_input_tokens() as f64)
    }

    pub fn avg_output_tokens(&self) -> f64 {
        self.per_task(self.total_output_tokens() as f64)
    }

    pub fn avg_total_tokens(&self) -> f64 {
        self.per_task(self.total_tokens() as f64)
    }

    pub fn avg_reasoning_tokens(&self) -> f64 {
        self.per_task(self.total_reasoning_tokens() as f64)
    }

    /// Sum of per-task execution times, so resumed runs report the full time.
    pub fn total_task_execution_time(&self) -> f64 {
        self.overall().total_execution_time
    }

    pub fn total_agent_execution_time(&self) -> f64 {
        self.overall().total_agent_execution_time
    }

    fn per_task(&self, total: f64) -> f64 {
        if self.task_results.is_empty() {
            0.0
        } else {
            total / self.task_results.len() as f64
        }
    }
}
