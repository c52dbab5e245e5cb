//! Markdown report document.
//!
//! Each benchmark contributes a configuration section, a summary table with
//! one row per task and a details appendix, in run order.

use serde::Serialize;
use tera::{Context, Tera};

use crate::benchmark::{BenchmarkSection, RunReport};
use crate::error::ReportError;

/// Default document template (Tera syntax).
pub const REPORT_TEMPLATE: &str = r#"{% for section in sections %}## Benchmark Config

**Benchmark description:** {{ section.description }}

**Agent:** {{ section.agent }}

**LLM:** {{ llm }}

## Benchmark Summary

| Name | Passed | Not Passed | Score | LLM Calls |
| ---- | ------ | ---------- | ----- | --------- |
{% for row in section.rows %}| **{{ row.name }}** | {{ row.passed }} | {{ row.not_passed }} | {{ row.ratio }} | {{ row.calls }} |
{% endfor %}
## Appendix (Benchmark Details)

{% for line in section.details %}{{ line }}
{% endfor %}
{% endfor %}"#;

#[derive(Serialize)]
struct DocumentView<'a> {
    llm: &'a str,
    sections: Vec<SectionView<'a>>,
}

#[derive(Serialize)]
struct SectionView<'a> {
    description: &'a str,
    agent: &'a str,
    rows: Vec<RowView>,
    details: Vec<&'a str>,
}

#[derive(Serialize)]
struct RowView {
    name: String,
    passed: usize,
    not_passed: usize,
    ratio: String,
    calls: u64,
}

impl<'a> SectionView<'a> {
    fn from_section(section: &'a BenchmarkSection) -> Self {
        Self {
            description: &section.description,
            agent: &section.agent,
            rows: section
                .tasks
                .iter()
                .map(|task| RowView {
                    name: escape_cell(&task.task_name),
                    passed: task.passed,
                    not_passed: task.not_passed,
                    ratio: task.ratio_text(),
                    calls: task.reported_call_count(),
                })
                .collect(),
            details: section
                .tasks
                .iter()
                .flat_map(|task| task.detail_lines.iter().map(String::as_str))
                .collect(),
        }
    }
}

/// Makes text safe inside a table cell: pipes are escaped and line breaks
/// collapse to spaces.
fn escape_cell(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

/// Renders run reports to Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    template: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self {
            template: REPORT_TEMPLATE.to_string(),
        }
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom Tera template. It receives `llm` and `sections`.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn render(&self, report: &RunReport) -> Result<String, ReportError> {
        let view = DocumentView {
            llm: &report.llm_label,
            sections: report
                .sections
                .iter()
                .map(SectionView::from_section)
                .collect(),
        };
        let context = Context::from_serialize(&view)?;
        Ok(Tera::one_off(&self.template, &context, false)?)
    }
}
