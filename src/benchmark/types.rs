//! Input model for a finished benchmark run.
//!
//! A run is a list of benchmarks, each pairing its configuration with the
//! recorded per-task outcomes and the trace id every task ran under.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ReportError;
use crate::results::TokenUsage;

/// Model backing the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmDescriptor {
    /// Provider type, e.g. `openai`.
    #[serde(rename = "type")]
    pub provider: String,
    /// Model name as passed to the provider.
    pub model_name: String,
}

impl LlmDescriptor {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
        }
    }

    /// Label shown in the configuration section, `type: model_name`.
    pub fn label(&self) -> String {
        format!("{}: {}", self.provider, self.model_name)
    }
}

/// Static configuration of one benchmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub description: String,
    /// Agent name used for every task.
    #[serde(default)]
    pub agent: String,
    /// Tasks the benchmark runs, in order.
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// Outcome of a single evaluation criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub passed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable description of what was checked.
    #[serde(default)]
    pub desc: String,
}

impl EvaluationOutcome {
    pub fn passed(desc: impl Into<String>) -> Self {
        Self {
            passed: true,
            desc: desc.into(),
            ..Default::default()
        }
    }

    pub fn failed(desc: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
            desc: desc.into(),
            ..Default::default()
        }
    }
}

/// Everything recorded for one task while the benchmark ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    #[serde(default)]
    pub evaluation_results: Vec<EvaluationOutcome>,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Agent execution error.
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub verification_error: Option<String>,
    #[serde(default)]
    pub verification_output: Option<String>,
    /// Token usage reported by the agent; the trace tally is used when absent.
    #[serde(default)]
    pub token_usage: Option<TokenUsage>,
    #[serde(default)]
    pub turn_count: Option<u64>,
    /// Seconds of agent execution; the traced root running time is used when absent.
    #[serde(default)]
    pub agent_execution_time: Option<f64>,
    #[serde(default)]
    pub task_execution_time: f64,
}

impl TaskOutcome {
    pub fn new(evaluation_results: Vec<EvaluationOutcome>) -> Self {
        Self {
            evaluation_results,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_error(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = Some(error_message.into());
        self
    }

    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    pub fn with_times(mut self, agent_execution_time: f64, task_execution_time: f64) -> Self {
        self.agent_execution_time = Some(agent_execution_time);
        self.task_execution_time = task_execution_time;
        self
    }
}

/// Recorded results of one benchmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Outcomes keyed by task name.
    #[serde(default)]
    pub task_results: BTreeMap<String, TaskOutcome>,
    /// Trace id each task ran under.
    #[serde(default)]
    pub task_trace_ids: BTreeMap<String, String>,
}

impl BenchmarkResult {
    /// Records a task outcome and, if given, its trace id.
    pub fn insert(&mut self, task_name: &str, outcome: TaskOutcome, trace_id: Option<&str>) {
        self.task_results.insert(task_name.to_string(), outcome);
        if let Some(trace_id) = trace_id {
            self.task_trace_ids
                .insert(task_name.to_string(), trace_id.to_string());
        }
    }
}

/// One benchmark of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub config: BenchmarkConfig,
    pub result: BenchmarkResult,
}

impl BenchmarkEntry {
    /// Tasks to report on: the configured list, or every recorded task when
    /// the configuration lists none.
    pub fn task_names(&self) -> Vec<String> {
        if self.config.tasks.is_empty() {
            self.result.task_results.keys().cloned().collect()
        } else {
            self.config.tasks.clone()
        }
    }
}

/// A complete benchmark run as handed to the report builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub llm: LlmDescriptor,
    /// Free-form model configuration copied into the JSON summary.
    #[serde(default)]
    pub model_config: Value,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkEntry>,
}

impl BenchmarkRun {
    pub fn new(llm: LlmDescriptor) -> Self {
        Self {
            llm,
            model_config: Value::Null,
            benchmarks: Vec::new(),
        }
    }

    pub fn with_benchmark(mut self, entry: BenchmarkEntry) -> Self {
        self.benchmarks.push(entry);
        self
    }

    /// Loads a run from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Model configuration for the summary, built from the LLM descriptor
    /// when none was recorded.
    pub fn effective_model_config(&self) -> Value {
        if self.model_config.is_null() {
            json!({
                "type": self.llm.provider,
                "model_name": self.llm.model_name,
            })
        } else {
            self.model_config.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_label() {
        assert_eq!(LlmDescriptor::new("openai", "gpt-4.1").label(), "openai: gpt-4.1");
    }

    #[test]
    fn test_task_names_default_to_recorded_tasks() {
        let mut entry = BenchmarkEntry::default();
        entry.result.insert("b", TaskOutcome::default(), None);
        entry.result.insert("a", TaskOutcome::default(), Some("trace-a"));
        assert_eq!(entry.task_names(), vec!["a", "b"]);

        entry.config.tasks = vec!["b".to_string()];
        assert_eq!(entry.task_names(), vec!["b"]);
        assert_eq!(entry.result.task_trace_ids.len(), 1);
    }

    #[test]
    fn test_run_from_json() {
        let run: BenchmarkRun = serde_json::from_str(
            r#"{
                "llm": {"type": "openai", "model_name": "gpt-4.1"},
                "benchmarks": [{
                    "config": {"description": "weather", "agent": "react", "tasks": ["t1"]},
                    "result": {
                        "task_results": {"t1": {"evaluation_results": [{"passed": true, "desc": "ok"}]}},
                        "task_trace_ids": {"t1": "abc"}
                    }
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(run.benchmarks.len(), 1);
        let outcome = &run.benchmarks[0].result.task_results["t1"];
        assert!(outcome.evaluation_results[0].passed);
        assert!(outcome.token_usage.is_none());
        assert_eq!(
            run.effective_model_config(),
            json!({"type": "openai", "model_name": "gpt-4.1"})
        );
    }
}
