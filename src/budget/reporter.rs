//! Budget reporting.
//!
//! Renders batch evaluations as text or JSON summaries.

use crate::budget::status::{BatchReport, BudgetStatus, BudgetTier};
use crate::core::types::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// A point-in-time budget report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetReport {
    /// Generated timestamp
    pub generated: Timestamp,
    /// Worst tier across evaluated SLOs
    pub worst_tier: BudgetTier,
    /// Whether every SLO is healthy or unknown and nothing failed
    pub all_clear: bool,
    /// Per-SLO statuses
    pub statuses: Vec<BudgetStatus>,
    /// Evaluation failures carried through from the batch
    pub failure_notes: Vec<String>,
}

/// Budget reporter.
pub struct BudgetReporter {
    /// Reports generated
    reports: Vec<BudgetReport>,
}

impl BudgetReporter {
    /// Create a new reporter.
    pub fn new() -> Self {
        Self { reports: Vec::new() }
    }

    /// Generate a report from a batch evaluation.
    pub fn generate(&mut self, batch: &BatchReport) -> BudgetReport {
        let report = BudgetReport {
            generated: now(),
            worst_tier: batch.worst_tier().unwrap_or(BudgetTier::Unknown),
            all_clear: batch.all_clear(),
            statuses: batch.statuses.clone(),
            failure_notes: batch
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.slo_slug, f.error))
                .collect(),
        };
        self.reports.push(report.clone());
        report
    }

    /// All generated reports.
    pub fn reports(&self) -> &[BudgetReport] {
        &self.reports
    }

    /// Render a report as pretty JSON.
    pub fn to_json(report: &BudgetReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_default()
    }

    /// Render a report as text.
    pub fn to_text(report: &BudgetReport) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error Budget Report ({})\n", report.generated));
        output.push_str(&format!(
            "Overall: {} ({})\n",
            if report.all_clear { "CLEAR" } else { "ATTENTION" },
            report.worst_tier
        ));
        output.push_str("\nSLOs:\n");

        for status in &report.statuses {
            output.push_str(&format!(
                "  [{}] {}: current {:.3}% / target {:.3}%, remaining {:.3} of {:.3} pts\n",
                status.tier,
                status.slo_slug,
                status.current_value,
                status.target_percent,
                status.budget_remaining_percent,
                status.budget_total_percent,
            ));
        }

        if !report.failure_notes.is_empty() {
            output.push_str("\nFailures:\n");
            for note in &report.failure_notes {
                output.push_str(&format!("  {}\n", note));
            }
        }

        output
    }
}

impl Default for BudgetReporter {
    fn default() -> Self {
        Self::new()
    }
}
