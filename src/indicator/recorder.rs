//! SLI recording.
//!
//! Validates and persists good/bad counts and latency observations into
//! time-aligned buckets. Every accepted call is a durable append through
//! the store backend; nothing is buffered in the recorder itself.

use crate::core::clock::Clock;
use crate::core::error::{Error, Result};
use crate::core::types::Timestamp;
use crate::indicator::bucket::{bucket_start, PercentileSet};
use crate::indicator::definition::IndicatorKind;
use crate::store::backend::{BucketDelta, EvaluatorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Recorder configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Bucket width in seconds
    pub bucket_width_seconds: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            bucket_width_seconds: 60,
        }
    }
}

/// Records SLI events into time-bucketed counters.
pub struct SliRecorder {
    store: Arc<dyn EvaluatorStore>,
    clock: Arc<dyn Clock>,
    config: RecorderConfig,
}

impl SliRecorder {
    /// Create a recorder.
    pub fn new(store: Arc<dyn EvaluatorStore>, clock: Arc<dyn Clock>, config: RecorderConfig) -> Self {
        Self { store, clock, config }
    }

    /// Start of the bucket the current instant falls into.
    pub fn current_bucket_start(&self) -> Timestamp {
        bucket_start(self.clock.now(), self.config.bucket_width_seconds)
    }

    /// Record good/bad event counts for a ratio-kind indicator.
    ///
    /// Counts cross the API as `i64` so negative inputs are rejected with
    /// [`Error::InvalidCount`] instead of silently wrapping.
    pub async fn record_good_bad(
        &self,
        slug: &str,
        good: i64,
        bad: i64,
        source: Option<&str>,
    ) -> Result<()> {
        let def = self
            .store
            .get_indicator(slug)
            .await?
            .ok_or_else(|| Error::UnknownIndicator(slug.to_string()))?;
        if def.kind != IndicatorKind::EventRatio {
            return Err(Error::WrongIndicatorKind(format!(
                "{} is {}, expected event_ratio",
                slug, def.kind
            )));
        }
        if good < 0 || bad < 0 {
            return Err(Error::InvalidCount(format!(
                "negative counts for {}: good={}, bad={}",
                slug, good, bad
            )));
        }

        let bucket_ts = self.current_bucket_start();
        self.store
            .add_to_bucket(slug, bucket_ts, BucketDelta::counts(good as u64, bad as u64, source))
            .await?;
        debug!(%slug, good, bad, %bucket_ts, "recorded ratio events");
        Ok(())
    }

    /// Record a latency observation and/or pre-aggregated percentiles for a
    /// threshold-kind indicator.
    pub async fn record_latency(
        &self,
        slug: &str,
        value: Option<f64>,
        percentiles: Option<PercentileSet>,
        source: Option<&str>,
    ) -> Result<()> {
        let def = self
            .store
            .get_indicator(slug)
            .await?
            .ok_or_else(|| Error::UnknownIndicator(slug.to_string()))?;
        if def.kind != IndicatorKind::Threshold {
            return Err(Error::WrongIndicatorKind(format!(
                "{} is {}, expected threshold",
                slug, def.kind
            )));
        }
        if value.is_none() && percentiles.is_none() {
            return Err(Error::InvalidCount(format!(
                "latency recording for {} carries neither a value nor percentiles",
                slug
            )));
        }
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidCount(format!(
                    "invalid latency for {}: {}",
                    slug, value
                )));
            }
        }

        let bucket_ts = self.current_bucket_start();
        self.store
            .add_to_bucket(slug, bucket_ts, BucketDelta::latency(value, percentiles, source))
            .await?;
        debug!(%slug, ?value, %bucket_ts, "recorded latency");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::indicator::definition::SliDefinition;
    use crate::store::factory::create_memory_store;
    use chrono::TimeZone;

    fn epoch() -> Timestamp {
        chrono::Utc.timestamp_opt(0, 0).unwrap()
    }

    async fn recorder_with(
        kind: IndicatorKind,
        slug: &str,
    ) -> (SliRecorder, Arc<dyn EvaluatorStore>, Arc<ManualClock>) {
        let store = create_memory_store();
        store
            .put_indicator(SliDefinition::new(slug, slug, kind).unwrap())
            .await
            .unwrap();
        let clock = Arc::new(ManualClock::new(epoch() + chrono::Duration::seconds(90)));
        let recorder = SliRecorder::new(store.clone(), clock.clone(), RecorderConfig::default());
        (recorder, store, clock)
    }

    #[tokio::test]
    async fn test_record_good_bad() {
        let (recorder, store, _) = recorder_with(IndicatorKind::EventRatio, "api").await;
        recorder.record_good_bad("api", 10, 2, Some("web")).await.unwrap();

        let buckets = store
            .buckets_in_range("api", epoch(), epoch() + chrono::Duration::seconds(120))
            .await
            .unwrap();
        assert_eq!(buckets.len(), 1);
        // 90s aligns down to the 60s bucket.
        assert_eq!(buckets[0].bucket_ts.timestamp(), 60);
        assert_eq!(buckets[0].good, 10);
        assert_eq!(buckets[0].bad, 2);
    }

    #[tokio::test]
    async fn test_unknown_indicator() {
        let (recorder, _, _) = recorder_with(IndicatorKind::EventRatio, "api").await;
        let err = recorder.record_good_bad("nope", 1, 0, None).await.unwrap_err();
        assert!(matches!(err, Error::UnknownIndicator(_)));
    }

    #[tokio::test]
    async fn test_negative_counts_rejected() {
        let (recorder, store, _) = recorder_with(IndicatorKind::EventRatio, "api").await;
        let err = recorder.record_good_bad("api", -1, 0, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCount(_)));
        assert!(!store.has_events("api").await.unwrap());
    }

    #[tokio::test]
    async fn test_kind_mismatch_both_directions() {
        let (recorder, _, _) = recorder_with(IndicatorKind::EventRatio, "api").await;
        let err = recorder
            .record_latency("api", Some(100.0), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WrongIndicatorKind(_)));

        let (recorder, _, _) = recorder_with(IndicatorKind::Threshold, "latency").await;
        let err = recorder.record_good_bad("latency", 1, 0, None).await.unwrap_err();
        assert!(matches!(err, Error::WrongIndicatorKind(_)));
    }

    #[tokio::test]
    async fn test_latency_requires_payload() {
        let (recorder, _, _) = recorder_with(IndicatorKind::Threshold, "latency").await;
        let err = recorder.record_latency("latency", None, None, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCount(_)));
    }

    #[tokio::test]
    async fn test_latency_rejects_negative() {
        let (recorder, _, _) = recorder_with(IndicatorKind::Threshold, "latency").await;
        let err = recorder
            .record_latency("latency", Some(-5.0), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCount(_)));
    }

    #[tokio::test]
    async fn test_bucket_rolls_with_clock() {
        let (recorder, store, clock) = recorder_with(IndicatorKind::EventRatio, "api").await;
        recorder.record_good_bad("api", 1, 0, None).await.unwrap();
        clock.advance_seconds(60);
        recorder.record_good_bad("api", 1, 0, None).await.unwrap();

        let buckets = store
            .buckets_in_range("api", epoch(), epoch() + chrono::Duration::seconds(300))
            .await
            .unwrap();
        assert_eq!(buckets.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_zero_validates_but_stores_nothing() {
        let (recorder, store, _) = recorder_with(IndicatorKind::EventRatio, "api").await;
        recorder.record_good_bad("api", 0, 0, None).await.unwrap();
        // The bucket exists but holds no events.
        assert!(!store.has_events("api").await.unwrap());
    }
}
