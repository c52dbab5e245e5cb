//! Per-category rollups.
//!
//! Rollups are a fold over task results into a [`CategoryAccumulator`],
//! finished by [`CategoryAccumulator::finalize`]. Counters are integers and
//! timing sums are taken over sorted values, so the result does not depend
//! on the order tasks were fed in.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::TaskResult;

/// Running totals for one category.
#[derive(Debug, Clone, Default)]
pub struct CategoryAccumulator {
    total: usize,
    successful: usize,
    execution_times: Vec<f64>,
    agent_times: Vec<f64>,
    input_tokens: u64,
    output_tokens: u64,
    total_tokens: u64,
    reasoning_tokens: u64,
    turns: u64,
    llm_calls: u64,
}

impl CategoryAccumulator {
    /// Folds one task result in.
    pub fn push(mut self, result: &TaskResult) -> Self {
        self.total += 1;
        if result.success {
            self.successful += 1;
        }
        self.execution_times.push(result.task_execution_time);
        self.agent_times.push(result.agent_execution_time);

        let usage = &result.token_usage;
        self.input_tokens = self.input_tokens.saturating_add(usage.input());
        self.output_tokens = self.output_tokens.saturating_add(usage.output());
        self.total_tokens = self.total_tokens.saturating_add(usage.total());
        self.reasoning_tokens = self.reasoning_tokens.saturating_add(usage.reasoning());
        self.turns = self.turns.saturating_add(result.turn_count.unwrap_or(0));
        self.llm_calls = self
            .llm_calls
            .saturating_add(result.llm_call_count.unwrap_or(0));
        self
    }

    /// Turns the running totals into rates and averages.
    pub fn finalize(self) -> CategoryStats {
        let per_task = |value: f64| {
            if self.total == 0 {
                0.0
            } else {
                value / self.total as f64
            }
        };

        let total_execution_time = stable_sum(&self.execution_times);
        let total_agent_execution_time = stable_sum(&self.agent_times);

        CategoryStats {
            total: self.total,
            successful: self.successful,
            failed: self.total - self.successful,
            success_rate: if self.total == 0 {
                0.0
            } else {
                100.0 * self.successful as f64 / self.total as f64
            },
            total_execution_time,
            avg_execution_time: per_task(total_execution_time),
            total_agent_execution_time,
            avg_agent_execution_time: per_task(total_agent_execution_time),
            total_input_tokens: self.input_tokens,
            total_output_tokens: self.output_tokens,
            total_tokens: self.total_tokens,
            total_reasoning_tokens: self.reasoning_tokens,
            avg_input_tokens: per_task(self.input_tokens as f64),
            avg_output_tokens: per_task(self.output_tokens as f64),
            avg_total_tokens: per_task(self.total_tokens as f64),
            avg_reasoning_tokens: per_task(self.reasoning_tokens as f64),
            total_turns: self.turns,
            avg_turns: per_task(self.turns as f64),
            total_llm_calls: self.llm_calls,
            avg_llm_calls: per_task(self.llm_calls as f64),
        }
    }
}

/// Finished rollup for one category, or for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    pub total_execution_time: f64,
    pub avg_execution_time: f64,
    pub total_agent_execution_time: f64,
    pub avg_agent_execution_time: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub total_reasoning_tokens: u64,
    pub avg_input_tokens: f64,
    pub avg_output_tokens: f64,
    pub avg_total_tokens: f64,
    pub avg_reasoning_tokens: f64,
    pub total_turns: u64,
    pub avg_turns: f64,
    pub total_llm_calls: u64,
    pub avg_llm_calls: f64,
}

/// Groups results by category and finalizes each group.
pub fn aggregate(results: &[TaskResult]) -> BTreeMap<String, CategoryStats> {
    results
        .iter()
        .fold(
            BTreeMap::<String, CategoryAccumulator>::new(),
            |mut groups, result| {
                let slot = groups.entry(result.category().to_string()).or_default();
                *slot = std::mem::take(slot).push(result);
                groups
            },
        )
        .into_iter()
        .map(|(category, acc)| (category, acc.finalize()))
        .collect()
}

/// Sums floats in ascending order so the result is independent of input order.
pub(crate) fn stable_sum(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.iter().sum()
}
