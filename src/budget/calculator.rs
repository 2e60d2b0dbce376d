//! Error budget calculation.
//!
//! Aggregates bucketed SLI data over an SLO's window and derives the
//! current service level, consumed and remaining budget, and a status
//! tier. Results are memoized per SLO and invalidated by new recordings.

use crate::budget::slo::SloDefinition;
use crate::budget::status::{classify, BatchFailure, BatchReport, BudgetStatus, BudgetTier};
use crate::core::clock::Clock;
use crate::core::error::{Error, Result};
use crate::indicator::bucket::{Percentile, SliEventBucket};
use crate::indicator::definition::{IndicatorKind, SliDefinition};
use crate::store::backend::EvaluatorStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Nearest-rank percentile over a sorted slice.
///
/// `Avg` maps to the arithmetic mean and `Max` to the largest sample.
pub fn percentile_of(sorted: &[f64], selector: Percentile) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    match selector {
        Percentile::Avg => Some(sorted.iter().sum::<f64>() / sorted.len() as f64),
        Percentile::Max => sorted.last().copied(),
        Percentile::P50 | Percentile::P95 | Percentile::P99 => {
            let p = match selector {
                Percentile::P50 => 50.0,
                Percentile::P95 => 95.0,
                _ => 99.0,
            };
            let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
            sorted.get(rank.saturating_sub(1).min(sorted.len() - 1)).copied()
        }
    }
}

struct CacheEntry {
    revision: u64,
    second: i64,
    status: BudgetStatus,
}

/// Computes error budgets for SLOs.
pub struct BudgetCalculator {
    store: Arc<dyn EvaluatorStore>,
    clock: Arc<dyn Clock>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl BudgetCalculator {
    /// Create a calculator.
    pub fn new(store: Arc<dyn EvaluatorStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register an SLO after validating it against its indicator.
    pub async fn register_slo(&self, slo: SloDefinition) -> Result<()> {
        let sli = self
            .store
            .get_indicator(&slo.sli_slug)
            .await?
            .ok_or_else(|| Error::UnknownIndicator(slo.sli_slug.clone()))?;
        if !sli.active {
            return Err(Error::UnknownIndicator(format!(
                "{} is inactive",
                slo.sli_slug
            )));
        }
        match sli.kind {
            IndicatorKind::Threshold if slo.latency_threshold.is_none() => {
                return Err(Error::InvalidTarget(format!(
                    "{} needs a latency threshold for threshold indicator {}",
                    slo.slug, slo.sli_slug
                )));
            }
            IndicatorKind::EventRatio if slo.latency_threshold.is_some() => {
                return Err(Error::InvalidTarget(format!(
                    "{} sets a latency threshold but {} is event_ratio",
                    slo.slug, slo.sli_slug
                )));
            }
            _ => {}
        }
        self.store.put_slo(slo).await
    }

    /// Get a registered SLO, failing when unknown.
    pub async fn slo(&self, slug: &str) -> Result<SloDefinition> {
        self.store
            .get_slo(slug)
            .await?
            .ok_or_else(|| Error::UnknownSlo(slug.to_string()))
    }

    /// Evaluate one SLO by slug.
    pub async fn calculate_slug(&self, slug: &str) -> Result<BudgetStatus> {
        let slo = self.slo(slug).await?;
        self.calculate(&slo).await
    }

    /// Evaluate one SLO.
    ///
    /// Repeated calls within the same clock second with no intervening
    /// recordings return the identical memoized result.
    pub async fn calculate(&self, slo: &SloDefinition) -> Result<BudgetStatus> {
        if !slo.active {
            return Err(Error::InactiveSlo(slo.slug.clone()));
        }
        let sli = self
            .store
            .get_indicator(&slo.sli_slug)
            .await?
            .ok_or_else(|| Error::UnknownIndicator(slo.sli_slug.clone()))?;
        if !sli.active {
            return Err(Error::UnknownIndicator(format!(
                "{} is inactive",
                slo.sli_slug
            )));
        }

        let now = self.clock.now();
        let revision = self.store.indicator_revision(&slo.sli_slug).await?;
        {
            let cache = self.cache.read().unwrap();
            if let Some(entry) = cache.get(&slo.slug) {
                if entry.revision == revision && entry.second == now.timestamp() {
                    return Ok(entry.status.clone());
                }
            }
        }

        let window_start = now - chrono::Duration::seconds(slo.window_seconds as i64);
        let buckets = self
            .store
            .buckets_in_range(&slo.sli_slug, window_start, now)
            .await?;

        let status = derive_status(slo, &sli, &buckets, window_start, now)?;
        debug!(
            slo = %slo.slug,
            current = status.current_value,
            remaining = status.budget_remaining_percent,
            tier = %status.tier,
            "evaluated budget"
        );

        let mut cache = self.cache.write().unwrap();
        cache.insert(
            slo.slug.clone(),
            CacheEntry {
                revision,
                second: now.timestamp(),
                status: status.clone(),
            },
        );
        Ok(status)
    }

    /// Evaluate every active SLO bound to an indicator.
    pub async fn calculate_for_indicator(&self, sli_slug: &str) -> Result<Vec<BudgetStatus>> {
        let bound: Vec<SloDefinition> = self
            .store
            .list_slos()
            .await?
            .into_iter()
            .filter(|s| s.active && s.sli_slug == sli_slug)
            .collect();
        if bound.is_empty() {
            return Err(Error::NoActiveSlo(sli_slug.to_string()));
        }
        let mut statuses = Vec::with_capacity(bound.len());
        for slo in &bound {
            statuses.push(self.calculate(slo).await?);
        }
        Ok(statuses)
    }

    /// Evaluate every active SLO, isolating per-SLO failures.
    pub async fn calculate_all(&self) -> Result<BatchReport> {
        let slos = self.store.list_slos().await?;
        let mut statuses = Vec::new();
        let mut failures = Vec::new();
        for slo in slos.iter().filter(|s| s.active) {
            match self.calculate(slo).await {
                Ok(status) => statuses.push(status),
                Err(err) => {
                    warn!(slo = %slo.slug, error = %err, "budget evaluation failed");
                    failures.push(BatchFailure {
                        slo_slug: slo.slug.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(BatchReport {
            statuses,
            failures,
            evaluated_at: self.clock.now(),
        })
    }

    /// Drop all memoized results. Fire-and-forget.
    pub fn clear_cache(&self) {
        self.cache.write().unwrap().clear();
    }
}

fn derive_status(
    slo: &SloDefinition,
    sli: &SliDefinition,
    buckets: &[SliEventBucket],
    window_start: chrono::DateTime<chrono::Utc>,
    window_end: chrono::DateTime<chrono::Utc>,
) -> Result<BudgetStatus> {
    let budget_total = slo.budget_total();
    let mut good = 0u64;
    let mut bad = 0u64;
    let mut sample_count = 0u64;
    let mut observed_percentile = None;

    let current_value = match sli.kind {
        IndicatorKind::EventRatio => {
            for bucket in buckets {
                good += bucket.good;
                bad += bucket.bad;
            }
            let total = good + bad;
            if total == 0 {
                None
            } else {
                Some(good as f64 / total as f64 * 100.0)
            }
        }
        IndicatorKind::Threshold => {
            let threshold = slo.latency_threshold.ok_or_else(|| {
                Error::InvalidTarget(format!("{} has no latency threshold", slo.slug))
            })?;
            let selector = slo.percentile.unwrap_or(Percentile::P99);

            let mut samples: Vec<f64> = buckets.iter().flat_map(|b| b.samples.iter().copied()).collect();
            if !samples.is_empty() {
                samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
                sample_count = samples.len() as u64;
                observed_percentile = percentile_of(&samples, selector);
                let within = samples.iter().filter(|s| **s <= threshold).count();
                Some(within as f64 / samples.len() as f64 * 100.0)
            } else {
                // No raw samples; fall back to pre-aggregated percentiles,
                // judging each aggregate at the configured selector.
                let values: Vec<f64> = buckets
                    .iter()
                    .filter_map(|b| b.percentiles.as_ref())
                    .map(|p| p.value_at(selector))
                    .collect();
                if values.is_empty() {
                    None
                } else {
                    sample_count = buckets.iter().map(|b| b.aggregate_count).sum();
                    observed_percentile =
                        values.iter().copied().fold(None, |acc: Option<f64>, v| {
                            Some(acc.map_or(v, |a| a.max(v)))
                        });
                    let within = values.iter().filter(|v| **v <= threshold).count();
                    Some(within as f64 / values.len() as f64 * 100.0)
                }
            }
        }
    };

    let (current_value, consumed, tier) = match current_value {
        // Empty window: defined placeholder, never a division error.
        None => (100.0, 0.0, BudgetTier::Unknown),
        Some(value) => {
            let consumed = (slo.target_percent - value).clamp(0.0, budget_total);
            let remaining = budget_total - consumed;
            (value, consumed, classify(remaining, budget_total))
        }
    };
    let remaining = budget_total - consumed;

    Ok(BudgetStatus {
        slo_slug: slo.slug.clone(),
        sli_slug: slo.sli_slug.clone(),
        target_percent: slo.target_percent,
        current_value,
        budget_total_percent: budget_total,
        budget_consumed_percent: consumed,
        budget_remaining_percent: remaining,
        tier,
        observed_percentile,
        good,
        bad,
        sample_count,
        window_start,
        window_end,
        evaluated_at: window_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::types::Timestamp;
    use crate::indicator::recorder::{RecorderConfig, SliRecorder};
    use crate::store::factory::create_memory_store;
    use chrono::TimeZone;

    fn epoch_plus(secs: i64) -> Timestamp {
        chrono::Utc.timestamp_opt(secs, 0).unwrap()
    }

    struct Fixture {
        store: Arc<dyn EvaluatorStore>,
        clock: Arc<ManualClock>,
        recorder: SliRecorder,
        calculator: BudgetCalculator,
    }

    async fn fixture(kind: IndicatorKind, sli: &str) -> Fixture {
        let store = create_memory_store();
        store
            .put_indicator(SliDefinition::new(sli, sli, kind).unwrap())
            .await
            .unwrap();
        let clock = Arc::new(ManualClock::new(epoch_plus(3_600)));
        Fixture {
            store: store.clone(),
            clock: clock.clone(),
            recorder: SliRecorder::new(store.clone(), clock.clone(), RecorderConfig::default()),
            calculator: BudgetCalculator::new(store, clock),
        }
    }

    #[tokio::test]
    async fn test_healthy_ratio_budget() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99_9", "api", 99.9, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();

        f.recorder.record_good_bad("api", 999, 1, None).await.unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert!((status.current_value - 99.9).abs() < 1e-9);
        assert!(status.budget_consumed_percent.abs() < 1e-9);
        assert!((status.budget_remaining_percent - 0.1).abs() < 1e-9);
        assert_eq!(status.tier, BudgetTier::Healthy);
        assert_eq!(status.good, 999);
        assert_eq!(status.bad, 1);
    }

    #[tokio::test]
    async fn test_exhausted_ratio_budget_clamps() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();

        f.recorder.record_good_bad("api", 900, 100, None).await.unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert!((status.current_value - 90.0).abs() < 1e-9);
        // target - current = 9 points, clamped to the 1-point budget.
        assert!((status.budget_consumed_percent - 1.0).abs() < 1e-9);
        assert!(status.budget_remaining_percent.abs() < 1e-9);
        assert_eq!(status.tier, BudgetTier::Exhausted);
    }

    #[tokio::test]
    async fn test_empty_window_is_unknown() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(status.tier, BudgetTier::Unknown);
        assert_eq!(status.current_value, 100.0);
        assert_eq!(status.budget_consumed_percent, 0.0);
    }

    #[tokio::test]
    async fn test_remaining_plus_consumed_equals_total() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-98_5", "api", 98.5, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();
        f.recorder.record_good_bad("api", 980, 20, None).await.unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        let sum = status.budget_remaining_percent + status.budget_consumed_percent;
        assert!((sum - status.budget_total_percent).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_over_performing_consumes_nothing() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();
        f.recorder.record_good_bad("api", 1_000, 0, None).await.unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(status.budget_consumed_percent, 0.0);
        assert_eq!(status.tier, BudgetTier::Healthy);
    }

    #[tokio::test]
    async fn test_idempotent_within_second() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();
        f.recorder.record_good_bad("api", 50, 1, None).await.unwrap();

        let first = f.calculator.calculate(&slo).await.unwrap();
        let second = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_new_events_invalidate_cache() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();

        f.recorder.record_good_bad("api", 100, 0, None).await.unwrap();
        let before = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(before.bad, 0);

        f.recorder.record_good_bad("api", 0, 50, None).await.unwrap();
        let after = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(after.bad, 50);
        assert!(after.current_value < before.current_value);
    }

    #[tokio::test]
    async fn test_clear_cache_recomputes() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();
        f.recorder.record_good_bad("api", 10, 0, None).await.unwrap();

        let first = f.calculator.calculate(&slo).await.unwrap();
        f.calculator.clear_cache();
        let second = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(first.good, second.good);
    }

    #[tokio::test]
    async fn test_window_excludes_old_buckets() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        // One-hour window; clock starts at t=3600.
        let slo = SloDefinition::new("api-99", "api", 99.0, 3_600).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();

        // Lands in the bucket at t=3600.
        f.recorder.record_good_bad("api", 0, 100, None).await.unwrap();

        // Move the clock so that bucket falls outside the window.
        f.clock.set(epoch_plus(3_600 + 3_700));
        f.recorder.record_good_bad("api", 100, 0, None).await.unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(status.bad, 0);
        assert_eq!(status.good, 100);
        assert_eq!(status.tier, BudgetTier::Healthy);
    }

    #[tokio::test]
    async fn test_boundary_bucket_included() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 3_600).unwrap();
        f.calculator.register_slo(slo.clone()).await.unwrap();

        // Bucket at exactly now - window.
        f.clock.set(epoch_plus(3_600));
        f.recorder.record_good_bad("api", 7, 0, None).await.unwrap();
        f.clock.set(epoch_plus(7_200));

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(status.good, 7);
    }

    #[tokio::test]
    async fn test_threshold_budget_from_samples() {
        let f = fixture(IndicatorKind::Threshold, "checkout-latency").await;
        let slo = SloDefinition::new("checkout-p99", "checkout-latency", 99.0, 86_400)
            .unwrap()
            .with_latency_threshold(250.0, Percentile::P99);
        f.calculator.register_slo(slo.clone()).await.unwrap();

        for _ in 0..99 {
            f.recorder
                .record_latency("checkout-latency", Some(100.0), None, None)
                .await
                .unwrap();
        }
        f.recorder
            .record_latency("checkout-latency", Some(900.0), None, None)
            .await
            .unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert!((status.current_value - 99.0).abs() < 1e-9);
        // Nearest-rank p99 over 100 samples is the 99th smallest.
        assert_eq!(status.observed_percentile, Some(100.0));
        assert_eq!(status.sample_count, 100);
        // Exactly on target: nothing consumed yet.
        assert_eq!(status.tier, BudgetTier::Healthy);
    }

    #[tokio::test]
    async fn test_threshold_budget_from_aggregates() {
        use crate::indicator::bucket::PercentileSet;

        let f = fixture(IndicatorKind::Threshold, "checkout-latency").await;
        let slo = SloDefinition::new("checkout-p95", "checkout-latency", 99.0, 86_400)
            .unwrap()
            .with_latency_threshold(200.0, Percentile::P95);
        f.calculator.register_slo(slo.clone()).await.unwrap();

        let within = PercentileSet { p50: 40.0, p95: 150.0, p99: 190.0, avg: 60.0, max: 210.0 };
        f.recorder
            .record_latency("checkout-latency", None, Some(within), None)
            .await
            .unwrap();

        let status = f.calculator.calculate(&slo).await.unwrap();
        assert_eq!(status.current_value, 100.0);
        assert_eq!(status.observed_percentile, Some(150.0));
        assert_eq!(status.tier, BudgetTier::Healthy);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        f.calculator
            .register_slo(SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap())
            .await
            .unwrap();
        f.recorder.record_good_bad("api", 10, 0, None).await.unwrap();

        // An SLO whose indicator disappears from under it.
        f.store
            .put_indicator(SliDefinition::new("ghost", "ghost", IndicatorKind::EventRatio).unwrap())
            .await
            .unwrap();
        f.calculator
            .register_slo(SloDefinition::new("ghost-99", "ghost", 99.0, 86_400).unwrap())
            .await
            .unwrap();
        f.store.set_indicator_active("ghost", false).await.unwrap();

        let report = f.calculator.calculate_all().await.unwrap();
        assert_eq!(report.statuses.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].slo_slug, "ghost-99");
    }

    #[tokio::test]
    async fn test_no_active_slo_for_indicator() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let err = f.calculator.calculate_for_indicator("api").await.unwrap_err();
        assert!(matches!(err, Error::NoActiveSlo(_)));
    }

    #[tokio::test]
    async fn test_inactive_slo_refused() {
        let f = fixture(IndicatorKind::EventRatio, "api").await;
        let slo = SloDefinition::new("api-99", "api", 99.0, 86_400).unwrap().inactive();
        let err = f.calculator.calculate(&slo).await.unwrap_err();
        assert!(matches!(err, Error::InactiveSlo(_)));
    }

    #[test]
    fn test_percentile_of() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        assert_eq!(percentile_of(&sorted, Percentile::P50), Some(50.0));
        assert_eq!(percentile_of(&sorted, Percentile::P95), Some(100.0));
        assert_eq!(percentile_of(&sorted, Percentile::P99), Some(100.0));
        assert_eq!(percentile_of(&sorted, Percentile::Max), Some(100.0));
        assert_eq!(percentile_of(&sorted, Percentile::Avg), Some(55.0));
        assert_eq!(percentile_of(&[], Percentile::P50), None);
    }
}
