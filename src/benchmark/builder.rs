//! Run assembly.
//!
//! [`ReportBuilder`] walks every benchmark of a run, builds per-task
//! statistics and turns them into the [`EvaluationReport`] the summary and
//! category rollups are computed from.

use serde::Serialize;
use tracing::info;

use super::task::{TaskAggregator, TaskStats};
use super::types::{BenchmarkRun, TaskOutcome};
use crate::error::ReportError;
use crate::results::{EvaluationReport, TaskResult, TokenUsage};
use crate::trace::{SpanClassifier, TraceStore, TraceWalker};

/// Statistics for one benchmark of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkSection {
    pub description: String,
    pub agent: String,
    pub tasks: Vec<TaskStats>,
}

/// Everything needed to render both report artifacts.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `type: model_name` label of the backing model.
    pub llm_label: String,
    pub sections: Vec<BenchmarkSection>,
    pub evaluation: EvaluationReport,
}

/// Builds a [`RunReport`] from a run and the traces it produced.
pub struct ReportBuilder<'a> {
    store: &'a dyn TraceStore,
    classifier: SpanClassifier,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(store: &'a dyn TraceStore) -> Self {
        Self {
            store,
            classifier: SpanClassifier::default(),
        }
    }

    /// Uses a custom classifier, e.g. one matching a different summarizer prompt.
    pub fn with_classifier(mut self, classifier: SpanClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Builds the report.
    ///
    /// Fails if any listed task lacks a recorded outcome.
    pub fn build(&self, run: &BenchmarkRun) -> Result<RunReport, ReportError> {
        let aggregator =
            TaskAggregator::new(TraceWalker::new(self.store, self.classifier.clone()));
        let mut sections = Vec::with_capacity(run.benchmarks.len());
        let mut task_results = Vec::new();

        for (idx, entry) in run.benchmarks.iter().enumerate() {
            let benchmark = if entry.config.description.is_empty() {
                format!("benchmark-{idx}")
            } else {
                entry.config.description.clone()
            };

            let mut tasks = Vec::new();
            for task_name in entry.task_names() {
                let stats = aggregator.build_task_stats(&benchmark, &task_name, &entry.result)?;
                // Outcome presence was checked by the aggregator.
                if let Some(outcome) = entry.result.task_results.get(&task_name) {
                    task_results.push(task_result(&stats, outcome));
                }
                tasks.push(stats);
            }

            sections.push(BenchmarkSection {
                description: entry.config.description.clone(),
                agent: entry.config.agent.clone(),
                tasks,
            });
        }

        let evaluation = EvaluationReport::new(
            run.llm.model_name.clone(),
            run.effective_model_config(),
            task_results,
        );
        info!(
            benchmarks = sections.len(),
            tasks = evaluation.total_tasks(),
            successful = evaluation.successful_tasks(),
            "Built run report"
        );

        Ok(RunReport {
            llm_label: run.llm.label(),
            sections,
            evaluation,
        })
    }
}

/// Combines a task's statistics with its recorded outcome.
pub fn task_result(stats: &TaskStats, outcome: &TaskOutcome) -> TaskResult {
    let analysis = &stats.analysis;

    let category_id = outcome.category_id.clone().or_else(|| {
        TaskResult::split_task_name(&stats.task_name).map(|(category, _)| category.to_string())
    });
    let task_id = TaskResult::split_task_name(&stats.task_name).map(|(_, task)| task.to_string());

    let token_usage = match outcome.token_usage {
        Some(usage) if !usage.is_empty() => usage,
        _ if analysis.usage.total() > 0 => {
            TokenUsage::new(analysis.usage.prompt_tokens, analysis.usage.completion_tokens)
        }
        _ => TokenUsage::default(),
    };

    let turn_count = outcome
        .turn_count
        .or((analysis.total_turns > 0).then_some(analysis.total_turns));

    TaskResult {
        task_name: stats.task_name.clone(),
        success: stats.all_passed() && outcome.error_message.is_none(),
        category_id,
        task_id,
        error_message: outcome.error_message.clone(),
        verification_error: outcome.verification_error.clone(),
        verification_output: outcome.verification_output.clone(),
        token_usage,
        turn_count,
        llm_call_count: Some(analysis.llm_call_count),
        agent_execution_time: outcome
            .agent_execution_time
            .unwrap_or(analysis.root_running_time)
            .max(0.0),
        task_execution_time: outcome.task_execution_time.max(0.0),
    }
}
