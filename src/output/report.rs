//! Rendering of operation plans, apply reports and validation reports

use colored::Colorize;
use tabled::Tabled;

use super::formatters::{
    count, operation_detail, operation_marker, operation_target, status_label, status_marker,
};
use super::json::format_json;
use super::table::format_table;
use super::Formattable;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::reconcile::{ApplyReport, Operation, ValidationReport};

/// Operations planned by `update`, in apply order.
pub struct OperationList<'a>(pub &'a [Operation]);

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "OPERATION")]
    kind: &'static str,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "DETAIL")]
    detail: String,
}

impl Formattable for OperationList<'_> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(format_json(self.0)?);
        }
        if self.0.is_empty() {
            return Ok("No changes needed.".to_string());
        }
        match format {
            OutputFormat::Table => {
                let rows: Vec<OperationRow> = self
                    .0
                    .iter()
                    .enumerate()
                    .map(|(i, op)| OperationRow {
                        index: i + 1,
                        kind: op.kind(),
                        target: operation_target(op),
                        detail: operation_detail(op),
                    })
                    .collect();
                Ok(format_table(&rows))
            }
            _ => {
                let mut lines = vec![format!(
                    "Planned changes ({}):",
                    count(self.0.len(), "operation")
                )];
                for op in self.0 {
                    lines.push(format!("  {} {}", operation_marker(op), op));
                }
                Ok(lines.join("\n"))
            }
        }
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "STATUS")]
    status: &'static str,
    #[tabled(rename = "OPERATION")]
    operation: String,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

impl Formattable for ApplyReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(format_json(self)?),
            OutputFormat::Table => {
                let rows: Vec<OutcomeRow> = self
                    .outcomes
                    .iter()
                    .map(|o| OutcomeRow {
                        status: status_label(o.status),
                        operation: o.operation.to_string(),
                        message: o.message.clone().unwrap_or_default(),
                    })
                    .collect();
                Ok(format_table(&rows))
            }
            OutputFormat::Pretty => {
                let mut lines: Vec<String> = self
                    .outcomes
                    .iter()
                    .map(|o| match &o.message {
                        Some(message) => format!(
                            "  {} {}: {}",
                            status_marker(o.status),
                            o.operation,
                            message.dimmed()
                        ),
                        None => format!("  {} {}", status_marker(o.status), o.operation),
                    })
                    .collect();
                lines.push(String::new());
                lines.push(format!(
                    "Applied {}, {} failed, {} skipped",
                    count(self.applied(), "operation"),
                    self.failed(),
                    self.skipped()
                ));
                Ok(lines.join("\n"))
            }
        }
    }
}

#[derive(Tabled)]
struct ProblemRow {
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "FILE")]
    file: String,
    #[tabled(rename = "PROBLEM")]
    problem: String,
}

impl Formattable for ValidationReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(format_json(self)?),
            OutputFormat::Table => {
                if self.problems.is_empty() {
                    return Ok("No problems found.".to_string());
                }
                let rows: Vec<ProblemRow> = self
                    .problems
                    .iter()
                    .map(|p| ProblemRow {
                        category: p.category().to_string(),
                        file: p.path().display().to_string(),
                        problem: p.to_string(),
                    })
                    .collect();
                Ok(format_table(&rows))
            }
            OutputFormat::Pretty => {
                let mut lines = Vec::new();
                for key in &self.added {
                    lines.push(format!("{} Added {} to the users file", "ℹ".blue(), key));
                }
                if self.is_valid() {
                    lines.push(format!(
                        "{} {} and {} are valid",
                        "✓".green(),
                        count(self.teams, "team"),
                        count(self.users, "user")
                    ));
                } else {
                    lines.push(format!(
                        "{} Found {}:",
                        "✗".red(),
                        count(self.problems.len(), "problem")
                    ));
                    for problem in &self.problems {
                        lines.push(format!("  • [{}] {}", problem.category(), problem));
                    }
                }
                Ok(lines.join("\n"))
            }
        }
    }
}
