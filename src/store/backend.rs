//! EvaluatorStore trait definition.
//!
//! Core trait that all storage backends must implement: indicator and SLO
//! catalogs, time-bucketed counters, and the append-only decision log.

use crate::budget::slo::SloDefinition;
use crate::core::error::Result;
use crate::core::types::Timestamp;
use crate::gate::decision::{DecisionId, DeployDecision};
use crate::indicator::bucket::{PercentileSet, SliEventBucket};
use crate::indicator::definition::SliDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Backend type identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    /// In-memory store; default and test vehicle.
    Memory,
    /// PostgreSQL counters and decision tables.
    PostgreSQL,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::PostgreSQL => write!(f, "postgresql"),
        }
    }
}

/// Additive payload applied to one bucket.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BucketDelta {
    /// Good events to add
    pub good: u64,
    /// Bad events to add
    pub bad: u64,
    /// Raw latency sample
    pub latency: Option<f64>,
    /// Pre-aggregated percentile values
    pub percentiles: Option<PercentileSet>,
    /// Source tag
    pub source: Option<String>,
}

impl BucketDelta {
    /// Delta carrying good/bad counts.
    pub fn counts(good: u64, bad: u64, source: Option<&str>) -> Self {
        Self {
            good,
            bad,
            source: source.map(str::to_string),
            ..Default::default()
        }
    }

    /// Delta carrying a latency observation.
    pub fn latency(
        value: Option<f64>,
        percentiles: Option<PercentileSet>,
        source: Option<&str>,
    ) -> Self {
        Self {
            latency: value,
            percentiles,
            source: source.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Core trait for evaluator storage backends.
///
/// Bucket writes for the same (slug, bucket timestamp) key must be additive
/// under concurrent callers: the backend performs the read-modify-write
/// inside its own lock or statement. Every accepted bucket write bumps the
/// indicator's revision counter, which calculators use for cache
/// invalidation.
#[async_trait]
pub trait EvaluatorStore: Send + Sync {
    // Indicators

    /// Register a new indicator. Fails on slug collision.
    async fn put_indicator(&self, def: SliDefinition) -> Result<()>;

    /// Read an indicator by slug.
    async fn get_indicator(&self, slug: &str) -> Result<Option<SliDefinition>>;

    /// List all indicators.
    async fn list_indicators(&self) -> Result<Vec<SliDefinition>>;

    /// Metadata-only edit: display name and metadata map.
    async fn update_indicator_metadata(
        &self,
        slug: &str,
        name: Option<String>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()>;

    /// Replace an indicator definition wholesale.
    ///
    /// Used for kind changes; callers enforce the immutability rule first.
    async fn replace_indicator(&self, def: SliDefinition) -> Result<()>;

    /// Flip the active flag.
    async fn set_indicator_active(&self, slug: &str, active: bool) -> Result<()>;

    // SLOs

    /// Register a new SLO. Fails on slug collision.
    async fn put_slo(&self, slo: SloDefinition) -> Result<()>;

    /// Read an SLO by slug.
    async fn get_slo(&self, slug: &str) -> Result<Option<SloDefinition>>;

    /// List all SLOs.
    async fn list_slos(&self) -> Result<Vec<SloDefinition>>;

    // Buckets

    /// Additively apply a delta to the bucket at (slug, bucket_ts).
    async fn add_to_bucket(
        &self,
        slug: &str,
        bucket_ts: Timestamp,
        delta: BucketDelta,
    ) -> Result<()>;

    /// Buckets for `slug` with `from <= bucket_ts <= to`.
    async fn buckets_in_range(
        &self,
        slug: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<SliEventBucket>>;

    /// Monotonic write revision for an indicator; 0 if never written.
    async fn indicator_revision(&self, slug: &str) -> Result<u64>;

    /// Whether any bucket references the indicator.
    async fn has_events(&self, slug: &str) -> Result<bool>;

    /// Delete buckets older than `cutoff`; returns the pruned count.
    async fn prune_buckets_before(&self, cutoff: Timestamp) -> Result<usize>;

    // Decisions

    /// Append a decision to the audit log.
    async fn append_decision(&self, decision: DeployDecision) -> Result<DecisionId>;

    /// Read a decision by ID.
    async fn get_decision(&self, id: &DecisionId) -> Result<Option<DeployDecision>>;

    /// ID of the most recently appended decision.
    async fn last_decision_id(&self) -> Result<Option<DecisionId>>;

    /// Persist the blocked-to-overridden transition of an existing decision.
    async fn update_decision(&self, decision: DeployDecision) -> Result<()>;

    /// All decisions in append order.
    async fn list_decisions(&self) -> Result<Vec<DeployDecision>>;

    // Misc

    /// Get the backend type.
    fn kind(&self) -> StoreKind;

    /// Health check for the backend.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
