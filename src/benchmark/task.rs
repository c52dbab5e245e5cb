//! Per-task statistics.
//!
//! A task's trace analysis is merged with its evaluation criteria into a
//! [`TaskStats`], including the detail lines shown in the report appendix.

use serde::Serialize;
use tracing::{debug, warn};

use super::types::{BenchmarkResult, EvaluationOutcome, TaskOutcome};
use crate::error::ReportError;
use crate::trace::{LlmKind, TraceAnalysis, TraceWalker};

/// Ratio text used when a task has no evaluation criteria.
pub const NO_RATIO: &str = "N/A";

/// Statistics for one task of a benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    pub task_name: String,
    pub trace_id: Option<String>,
    /// Criteria that passed.
    pub passed: usize,
    /// Criteria that did not pass.
    pub not_passed: usize,
    pub analysis: TraceAnalysis,
    /// Markdown lines for the details appendix.
    pub detail_lines: Vec<String>,
}

impl TaskStats {
    pub fn criteria(&self) -> usize {
        self.passed + self.not_passed
    }

    /// Passed fraction of the criteria; `None` when there are none.
    pub fn pass_ratio(&self) -> Option<f64> {
        match self.criteria() {
            0 => None,
            n => Some(self.passed as f64 / n as f64),
        }
    }

    /// Pass ratio to two decimals, or `N/A`.
    pub fn ratio_text(&self) -> String {
        self.pass_ratio()
            .map(|ratio| format!("{ratio:.2}"))
            .unwrap_or_else(|| NO_RATIO.to_string())
    }

    pub fn llm_call_count(&self) -> u64 {
        self.analysis.llm_call_count
    }

    pub fn total_turns(&self) -> u64 {
        self.analysis.total_turns
    }

    /// Count shown in the summary table.
    pub fn reported_call_count(&self) -> u64 {
        self.analysis.reported_call_count()
    }

    /// True if every criterion passed and there was at least one.
    pub fn all_passed(&self) -> bool {
        self.criteria() > 0 && self.not_passed == 0
    }
}

/// Builds [`TaskStats`] from traces and recorded outcomes.
pub struct TaskAggregator<'a> {
    walker: TraceWalker<'a>,
}

impl<'a> TaskAggregator<'a> {
    pub fn new(walker: TraceWalker<'a>) -> Self {
        Self { walker }
    }

    /// Builds statistics for `task_name` of the named benchmark.
    ///
    /// A task without a trace id gets zero trace statistics. A task without
    /// a recorded outcome is an error.
    pub fn build_task_stats(
        &self,
        benchmark: &str,
        task_name: &str,
        result: &BenchmarkResult,
    ) -> Result<TaskStats, ReportError> {
        let outcome =
            result
                .task_results
                .get(task_name)
                .ok_or_else(|| ReportError::MissingEvaluation {
                    benchmark: benchmark.to_string(),
                    task: task_name.to_string(),
                })?;

        let trace_id = result.task_trace_ids.get(task_name).cloned();
        let analysis = match &trace_id {
            Some(trace_id) => self.walker.analyze(trace_id),
            None => {
                warn!(task = task_name, "No trace id recorded for task");
                TraceAnalysis::default()
            }
        };

        Ok(self.merge(task_name, trace_id, analysis, outcome))
    }

    fn merge(
        &self,
        task_name: &str,
        trace_id: Option<String>,
        analysis: TraceAnalysis,
        outcome: &TaskOutcome,
    ) -> TaskStats {
        let passed = outcome
            .evaluation_results
            .iter()
            .filter(|e| e.passed)
            .count();
        let not_passed = outcome.evaluation_results.len() - passed;

        let mut stats = TaskStats {
            task_name: task_name.to_string(),
            trace_id,
            passed,
            not_passed,
            analysis,
            detail_lines: Vec::new(),
        };
        stats.detail_lines = detail_lines(&stats, outcome);

        debug!(
            task = task_name,
            passed,
            not_passed,
            llm_calls = stats.llm_call_count(),
            turns = stats.total_turns(),
            "Built task stats"
        );
        stats
    }
}

fn detail_lines(stats: &TaskStats, outcome: &TaskOutcome) -> Vec<String> {
    let analysis = &stats.analysis;
    let mut lines = vec![
        "### Task".to_string(),
        format!("- config: {}", stats.task_name),
        format!(
            "- Trace id: {}",
            stats.trace_id.as_deref().unwrap_or("none")
        ),
        format!(
            "- Criteria: {} passed, {} not passed (ratio {})",
            stats.passed,
            stats.not_passed,
            stats.ratio_text()
        ),
    ];

    if let Some(agent_time) = outcome.agent_execution_time {
        lines.push(format!(
            "- Timing: agent {:.2}s, task {:.2}s",
            agent_time, outcome.task_execution_time
        ));
    }
    lines.push(format!(
        "- Trace: {} spans, {:.2}s at root, {} prompt / {} completion tokens",
        analysis.span_count,
        analysis.root_running_time,
        analysis.usage.prompt_tokens,
        analysis.usage.completion_tokens
    ));
    if let Some(error) = &outcome.error_message {
        lines.push(format!("- Agent error: {error}"));
    }

    lines.push("- Agent Response:".to_string());
    for kind in [LlmKind::Prompt, LlmKind::Thought, LlmKind::Summary] {
        let count = analysis.count(kind);
        if count > 0 {
            lines.push(format!("  - {kind}: {count}"));
        }
    }
    lines.push(format!("  - llm_calls: {}", analysis.llm_call_count));
    lines.push(format!("  - turns: {}", analysis.total_turns));
    lines.push(format!("- Iterations: [{}]", analysis.iterations.join(", ")));

    lines.push("- Evaluation Results:".to_string());
    for (idx, evaluation) in outcome.evaluation_results.iter().enumerate() {
        evaluation_lines(&mut lines, idx + 1, evaluation);
    }

    if !analysis.children.is_empty() {
        lines.push("- Trace Tree:".to_string());
        for (parent, children) in &analysis.children {
            lines.push(format!("  - {parent}"));
            for child in children {
                let mut line = format!(
                    "    - [{}] {} ({}, {:.2}s, {} records)",
                    child.span_index, child.id, child.class, child.running_time, child.record_count
                );
                if let Some(tool) = &child.tool_name {
                    line.push_str(&format!(", tool {tool}"));
                }
                if let Some(usage) = &child.usage {
                    line.push_str(&format!(
                        ", tokens {}/{}",
                        usage.prompt_tokens, usage.completion_tokens
                    ));
                }
                if let Some(error) = &child.error {
                    line.push_str(&format!(", error: {error}"));
                }
                lines.push(line);
            }
        }
    }

    lines
}

fn evaluation_lines(lines: &mut Vec<String>, eval_id: usize, evaluation: &EvaluationOutcome) {
    lines.push(format!("  - Eval id: {eval_id}"));
    lines.push(format!("    - Evaluation Description: {}", evaluation.desc));
    if !evaluation.passed {
        if let Some(reason) = evaluation.reason.as_deref().filter(|r| !r.is_empty()) {
            lines.push(format!("    - Reason: {reason}"));
        }
        if let Some(error) = evaluation.error.as_deref().filter(|e| !e.is_empty()) {
            lines.push(format!("    - Error: {error}"));
        }
    }
    let passed = if evaluation.passed {
        r#"<span color="green">True</span>"#
    } else {
        r#"<span color="red">False</span>"#
    };
    lines.push(format!("    - Passed? {passed}"));
}
