//! Computed budget status.

use crate::core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Budget status tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BudgetTier {
    /// No events in the window; nothing to judge.
    Unknown,
    /// Remaining budget at or above half of total.
    Healthy,
    /// Remaining budget between 20% and 50% of total.
    Warning,
    /// Remaining budget below 20% of total but not spent.
    Critical,
    /// Budget fully spent.
    Exhausted,
}

impl BudgetTier {
    /// Whether this tier blocks gated deploys.
    pub fn is_blocking(&self) -> bool {
        matches!(self, BudgetTier::Critical | BudgetTier::Exhausted)
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetTier::Unknown => write!(f, "unknown"),
            BudgetTier::Healthy => write!(f, "healthy"),
            BudgetTier::Warning => write!(f, "warning"),
            BudgetTier::Critical => write!(f, "critical"),
            BudgetTier::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Classify a remaining/total budget pair into a tier.
///
/// Only meaningful when events were observed; callers map empty windows to
/// [`BudgetTier::Unknown`] before classification.
pub fn classify(remaining: f64, total: f64) -> BudgetTier {
    if remaining <= 0.0 {
        return BudgetTier::Exhausted;
    }
    let ratio = remaining / total;
    if ratio >= 0.5 {
        BudgetTier::Healthy
    } else if ratio >= 0.2 {
        BudgetTier::Warning
    } else {
        BudgetTier::Critical
    }
}

/// Point-in-time budget evaluation for one SLO.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// SLO slug
    pub slo_slug: String,
    /// Indicator slug
    pub sli_slug: String,
    /// Target percentage
    pub target_percent: f64,
    /// Current service level (percent)
    pub current_value: f64,
    /// Total budget in percentage points
    pub budget_total_percent: f64,
    /// Consumed budget in percentage points
    pub budget_consumed_percent: f64,
    /// Remaining budget in percentage points
    pub budget_remaining_percent: f64,
    /// Status tier
    pub tier: BudgetTier,
    /// Observed percentile value (threshold kind only)
    pub observed_percentile: Option<f64>,
    /// Good events in window (ratio kind)
    pub good: u64,
    /// Bad events in window (ratio kind)
    pub bad: u64,
    /// Latency samples in window (threshold kind)
    pub sample_count: u64,
    /// Window start (inclusive)
    pub window_start: Timestamp,
    /// Window end (inclusive)
    pub window_end: Timestamp,
    /// Evaluation timestamp
    pub evaluated_at: Timestamp,
}

/// A per-SLO failure inside a batch evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchFailure {
    /// SLO slug that failed to evaluate
    pub slo_slug: String,
    /// Error message
    pub error: String,
}

/// Result of evaluating every active SLO.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// Successful evaluations
    pub statuses: Vec<BudgetStatus>,
    /// Per-SLO failures; never abort the batch
    pub failures: Vec<BatchFailure>,
    /// Evaluation timestamp
    pub evaluated_at: Timestamp,
}

impl BatchReport {
    /// Worst tier across all evaluated SLOs.
    pub fn worst_tier(&self) -> Option<BudgetTier> {
        self.statuses.iter().map(|s| s.tier).max()
    }

    /// Whether every evaluated SLO is healthy or unknown and nothing failed.
    pub fn all_clear(&self) -> bool {
        self.failures.is_empty()
            && self
                .statuses
                .iter()
                .all(|s| matches!(s.tier, BudgetTier::Healthy | BudgetTier::Unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tiers() {
        // total = 1.0 percentage point
        assert_eq!(classify(1.0, 1.0), BudgetTier::Healthy);
        assert_eq!(classify(0.5, 1.0), BudgetTier::Healthy);
        assert_eq!(classify(0.49, 1.0), BudgetTier::Warning);
        assert_eq!(classify(0.2, 1.0), BudgetTier::Warning);
        assert_eq!(classify(0.19, 1.0), BudgetTier::Critical);
        assert_eq!(classify(0.0, 1.0), BudgetTier::Exhausted);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(BudgetTier::Exhausted > BudgetTier::Critical);
        assert!(BudgetTier::Critical > BudgetTier::Warning);
        assert!(BudgetTier::Warning > BudgetTier::Healthy);
        assert!(BudgetTier::Healthy > BudgetTier::Unknown);
    }

    #[test]
    fn test_tier_blocking() {
        assert!(BudgetTier::Critical.is_blocking());
        assert!(BudgetTier::Exhausted.is_blocking());
        assert!(!BudgetTier::Warning.is_blocking());
        assert!(!BudgetTier::Unknown.is_blocking());
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(BudgetTier::Exhausted.to_string(), "exhausted");
        assert_eq!(BudgetTier::Healthy.to_string(), "healthy");
    }
}
