//! SLO definitions.
//!
//! An SLO binds a target percentage and an evaluation window to exactly one
//! indicator.

use crate::core::error::{Error, Result};
use crate::core::types::{now, Timestamp};
use crate::indicator::bucket::Percentile;
use crate::indicator::definition::validate_slug;
use serde::{Deserialize, Serialize};

/// A service level objective bound to one indicator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SloDefinition {
    /// Unique slug
    pub slug: String,
    /// Indicator this SLO is bound to
    pub sli_slug: String,
    /// Target percentage, exclusive range (0, 100)
    pub target_percent: f64,
    /// Evaluation window in seconds
    pub window_seconds: u64,
    /// Active flag
    pub active: bool,
    /// Latency threshold for threshold-kind indicators
    pub latency_threshold: Option<f64>,
    /// Percentile evaluated for threshold-kind indicators
    pub percentile: Option<Percentile>,
    /// Registration timestamp
    pub created: Timestamp,
}

impl SloDefinition {
    /// Create a new SLO.
    ///
    /// The target must lie strictly between 0 and 100 and the window must be
    /// non-zero.
    pub fn new(slug: &str, sli_slug: &str, target_percent: f64, window_seconds: u64) -> Result<Self> {
        validate_slug(slug)?;
        if !target_percent.is_finite() || target_percent <= 0.0 || target_percent >= 100.0 {
            return Err(Error::InvalidTarget(format!(
                "target must be in (0, 100), got {}",
                target_percent
            )));
        }
        if window_seconds == 0 {
            return Err(Error::InvalidTarget("window must be non-zero".to_string()));
        }
        Ok(Self {
            slug: slug.to_string(),
            sli_slug: sli_slug.to_string(),
            target_percent,
            window_seconds,
            active: true,
            latency_threshold: None,
            percentile: None,
            created: now(),
        })
    }

    /// Configure threshold evaluation: samples at or under `threshold` count
    /// as good, and `percentile` is surfaced as the observed percentile.
    pub fn with_latency_threshold(mut self, threshold: f64, percentile: Percentile) -> Self {
        self.latency_threshold = Some(threshold);
        self.percentile = Some(percentile);
        self
    }

    /// Mark inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Total error budget in percentage points.
    pub fn budget_total(&self) -> f64 {
        100.0 - self.target_percent
    }
}
