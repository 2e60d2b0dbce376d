//! Time-bucketed indicator counters.
//!
//! Each recording call lands in the bucket whose timestamp is the call time
//! aligned down to the configured bucket width. Buckets are additive and are
//! only removed by the retention policy.

use crate::core::types::Timestamp;
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Percentile selector for threshold indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Percentile {
    P50,
    P95,
    P99,
    Avg,
    Max,
}

impl std::fmt::Display for Percentile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Percentile::P50 => write!(f, "p50"),
            Percentile::P95 => write!(f, "p95"),
            Percentile::P99 => write!(f, "p99"),
            Percentile::Avg => write!(f, "avg"),
            Percentile::Max => write!(f, "max"),
        }
    }
}

/// Pre-aggregated latency percentile values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentileSet {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub avg: f64,
    pub max: f64,
}

impl PercentileSet {
    /// Value for a percentile selector.
    pub fn value_at(&self, percentile: Percentile) -> f64 {
        match percentile {
            Percentile::P50 => self.p50,
            Percentile::P95 => self.p95,
            Percentile::P99 => self.p99,
            Percentile::Avg => self.avg,
            Percentile::Max => self.max,
        }
    }

    /// Merge another set, keeping the worse (larger) value per field.
    pub fn merge_worst(&mut self, other: &PercentileSet) {
        self.p50 = self.p50.max(other.p50);
        self.p95 = self.p95.max(other.p95);
        self.p99 = self.p99.max(other.p99);
        self.avg = self.avg.max(other.avg);
        self.max = self.max.max(other.max);
    }
}

/// Align a timestamp down to the start of its bucket.
pub fn bucket_start(ts: Timestamp, width_seconds: u64) -> Timestamp {
    let width = width_seconds.max(1) as i64;
    let secs = ts.timestamp();
    let aligned = secs - secs.rem_euclid(width);
    chrono::Utc.timestamp_opt(aligned, 0).unwrap()
}

/// Time-bucketed counters for one indicator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SliEventBucket {
    /// Indicator slug
    pub sli_slug: String,
    /// Aligned bucket timestamp
    pub bucket_ts: Timestamp,
    /// Good event count (ratio kind)
    pub good: u64,
    /// Bad event count (ratio kind)
    pub bad: u64,
    /// Raw latency samples (threshold kind)
    pub samples: Vec<f64>,
    /// Worst pre-aggregated percentiles seen (threshold kind)
    pub percentiles: Option<PercentileSet>,
    /// Number of percentile aggregates merged in
    pub aggregate_count: u64,
    /// Source tags that contributed to this bucket
    pub sources: BTreeSet<String>,
}

impl SliEventBucket {
    /// Create an empty bucket.
    pub fn new(sli_slug: &str, bucket_ts: Timestamp) -> Self {
        Self {
            sli_slug: sli_slug.to_string(),
            bucket_ts,
            good: 0,
            bad: 0,
            samples: Vec::new(),
            percentiles: None,
            aggregate_count: 0,
            sources: BTreeSet::new(),
        }
    }

    /// Add good/bad counts.
    pub fn add_counts(&mut self, good: u64, bad: u64, source: Option<&str>) {
        self.good += good;
        self.bad += bad;
        if let Some(source) = source {
            self.sources.insert(source.to_string());
        }
    }

    /// Add a latency observation and/or pre-aggregated percentiles.
    pub fn add_latency(
        &mut self,
        value: Option<f64>,
        percentiles: Option<&PercentileSet>,
        source: Option<&str>,
    ) {
        if let Some(value) = value {
            self.samples.push(value);
        }
        if let Some(incoming) = percentiles {
            match self.percentiles.as_mut() {
                Some(existing) => existing.merge_worst(incoming),
                None => self.percentiles = Some(*incoming),
            }
            self.aggregate_count += 1;
        }
        if let Some(source) = source {
            self.sources.insert(source.to_string());
        }
    }

    /// Total ratio events in this bucket.
    pub fn total_events(&self) -> u64 {
        self.good + self.bad
    }

    /// Whether anything has been recorded into this bucket.
    pub fn is_empty(&self) -> bool {
        self.total_events() == 0 && self.samples.is_empty() && self.aggregate_count == 0
    }
}
