//! Machine-readable model summary.
//!
//! Numbers are rounded to two decimals here and nowhere else; the
//! aggregation layer keeps full precision.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ReportError;
use crate::results::{CategoryStats, EvaluationReport};

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenUsageSummary {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub total_reasoning_tokens: u64,
    pub avg_input_tokens: f64,
    pub avg_output_tokens: f64,
    pub avg_total_tokens: f64,
    pub avg_reasoning_tokens: f64,
}

/// Turn and model-call usage, kept as separate fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnUsageSummary {
    pub total_turns: u64,
    pub avg_turns: f64,
    pub total_llm_calls: u64,
    pub avg_llm_calls: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTokenUsage {
    pub total_input: u64,
    pub total_output: u64,
    pub total: u64,
    pub total_reasoning: u64,
    pub avg_input: f64,
    pub avg_output: f64,
    pub avg_total: f64,
    pub avg_reasoning: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub avg_time: f64,
    pub avg_agent_time: f64,
    pub token_usage: CategoryTokenUsage,
    pub turn_usage: TurnUsageSummary,
}

impl From<&CategoryStats> for CategorySummary {
    fn from(stats: &CategoryStats) -> Self {
        Self {
            total: stats.total,
            successful: stats.successful,
            failed: stats.failed,
            success_rate: round2(stats.success_rate),
            avg_time: round2(stats.avg_execution_time),
            avg_agent_time: round2(stats.avg_agent_execution_time),
            token_usage: CategoryTokenUsage {
                total_input: stats.total_input_tokens,
                total_output: stats.total_output_tokens,
                total: stats.total_tokens,
                total_reasoning: stats.total_reasoning_tokens,
                avg_input: round2(stats.avg_input_tokens),
                avg_output: round2(stats.avg_output_tokens),
                avg_total: round2(stats.avg_total_tokens),
                avg_reasoning: round2(stats.avg_reasoning_tokens),
            },
            turn_usage: TurnUsageSummary {
                total_turns: stats.total_turns,
                avg_turns: round2(stats.avg_turns),
                total_llm_calls: stats.total_llm_calls,
                avg_llm_calls: round2(stats.avg_llm_calls),
            },
        }
    }
}

/// JSON summary of one model's run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub model_name: String,
    pub model_config: Value,
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub success_rate: f64,
    pub total_task_execution_time: f64,
    pub average_task_execution_time: f64,
    pub total_agent_execution_time: f64,
    pub average_agent_execution_time: f64,
    pub token_usage: TokenUsageSummary,
    pub turn_usage: TurnUsageSummary,
    pub category_breakdown: BTreeMap<String, CategorySummary>,
}

impl ModelSummary {
    pub fn from_report(report: &EvaluationReport) -> Self {
        let overall = report.overall();
        let category_breakdown = report
            .category_stats()
            .iter()
            .map(|(category, stats)| (category.clone(), CategorySummary::from(stats)))
            .collect();

        Self {
            model_name: report.model_name().to_string(),
            model_config: report.model_config().clone(),
            total_tasks: report.total_tasks(),
            successful_tasks: report.successful_tasks(),
            failed_tasks: report.failed_tasks(),
            success_rate: round2(overall.success_rate),
            total_task_execution_time: round2(overall.total_execution_time),
            average_task_execution_time: round2(overall.avg_execution_time),
            total_agent_execution_time: round2(overall.total_agent_execution_time),
            average_agent_execution_time: round2(overall.avg_agent_execution_time),
            token_usage: TokenUsageSummary {
                total_input_tokens: report.total_input_tokens(),
                total_output_tokens: report.total_output_tokens(),
                total_tokens: report.total_tokens(),
                total_reasoning_tokens: report.total_reasoning_tokens(),
                avg_input_tokens: round2(report.avg_input_tokens()),
                avg_output_tokens: round2(report.avg_output_tokens()),
                avg_total_tokens: round2(report.avg_total_tokens()),
                avg_reasoning_tokens: round2(report.avg_reasoning_tokens()),
            },
            turn_usage: TurnUsageSummary {
                total_turns: overall.total_turns,
                avg_turns: round2(overall.avg_turns),
                total_llm_calls: overall.total_llm_calls,
                avg_llm_calls: round2(overall.avg_llm_calls),
            },
            category_breakdown,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
