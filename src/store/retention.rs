//! Bucket retention.
//!
//! Buckets are never deleted except by policy. Sweeps are explicit calls;
//! nothing prunes implicitly.

use crate::core::clock::Clock;
use crate::core::error::Result;
use crate::store::backend::EvaluatorStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Retention policy for indicator buckets.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Maximum bucket age in seconds
    pub max_age_seconds: u64,
}

impl RetentionPolicy {
    /// Create a policy with the given max age.
    pub fn new(max_age_seconds: u64) -> Self {
        Self { max_age_seconds }
    }

    /// Prune buckets older than `now - max_age`; returns the pruned count.
    pub async fn sweep(&self, store: &dyn EvaluatorStore, clock: &dyn Clock) -> Result<usize> {
        let cutoff = clock.now() - chrono::Duration::seconds(self.max_age_seconds as i64);
        let pruned = store.prune_buckets_before(cutoff).await?;
        if pruned > 0 {
            info!(pruned, %cutoff, "retention sweep removed buckets");
        }
        Ok(pruned)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        // 30 days
        Self::new(30 * 24 * 3600)
    }
}
