//! PostgreSQL backend implementation.
//!
//! Counters in an upsert table, decisions in an append-only table.
//! In production, would use sqlx or tokio-postgres; the storage behavior
//! here mirrors the memory backend behind the same contract.

use crate::budget::slo::SloDefinition;
use crate::core::error::Result;
use crate::core::types::Timestamp;
use crate::gate::decision::{DecisionId, DeployDecision};
use crate::indicator::bucket::SliEventBucket;
use crate::indicator::definition::SliDefinition;
use crate::store::backend::{BucketDelta, EvaluatorStore, StoreKind};
use crate::store::config::PostgresConfig;
use crate::store::memory::MemoryStore;
use async_trait::async_trait;
use std::collections::HashMap;

/// PostgreSQL evaluator store.
///
/// The additive bucket contract maps to a single upsert per recording call,
/// which is what keeps concurrent recorders safe in production:
///
/// ```sql
/// INSERT INTO sli_event_buckets (sli_slug, bucket_ts, good, bad)
/// VALUES ($1, $2, $3, $4)
/// ON CONFLICT (sli_slug, bucket_ts)
/// DO UPDATE SET good = sli_event_buckets.good + EXCLUDED.good,
///               bad  = sli_event_buckets.bad  + EXCLUDED.bad
/// ```
pub struct PostgresStore {
    /// Configuration
    config: PostgresConfig,
    /// In-memory storage (mock for now)
    inner: MemoryStore,
    /// Connected flag
    connected: bool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store.
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        // In production: establish database connection pool
        // let pool = PgPoolOptions::new()
        //     .max_connections(config.max_connections)
        //     .connect(&config.url)
        //     .await?;

        Ok(Self {
            config,
            inner: MemoryStore::new(),
            connected: true,
        })
    }

    /// Get connection URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Get the counters table name.
    pub fn counters_table(&self) -> &str {
        &self.config.counters_table
    }

    /// Get the decisions table name.
    pub fn decisions_table(&self) -> &str {
        &self.config.decisions_table
    }
}

#[async_trait]
impl EvaluatorStore for PostgresStore {
    async fn put_indicator(&self, def: SliDefinition) -> Result<()> {
        // In production: INSERT INTO sli_definitions ... with a unique
        // constraint on slug surfacing DuplicateIndicator.
        self.inner.put_indicator(def).await
    }

    async fn get_indicator(&self, slug: &str) -> Result<Option<SliDefinition>> {
        self.inner.get_indicator(slug).await
    }

    async fn list_indicators(&self) -> Result<Vec<SliDefinition>> {
        self.inner.list_indicators().await
    }

    async fn update_indicator_metadata(
        &self,
        slug: &str,
        name: Option<String>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        self.inner.update_indicator_metadata(slug, name, metadata).await
    }

    async fn replace_indicator(&self, def: SliDefinition) -> Result<()> {
        self.inner.replace_indicator(def).await
    }

    async fn set_indicator_active(&self, slug: &str, active: bool) -> Result<()> {
        self.inner.set_indicator_active(slug, active).await
    }

    async fn put_slo(&self, slo: SloDefinition) -> Result<()> {
        self.inner.put_slo(slo).await
    }

    async fn get_slo(&self, slug: &str) -> Result<Option<SloDefinition>> {
        self.inner.get_slo(slug).await
    }

    async fn list_slos(&self) -> Result<Vec<SloDefinition>> {
        self.inner.list_slos().await
    }

    async fn add_to_bucket(
        &self,
        slug: &str,
        bucket_ts: Timestamp,
        delta: BucketDelta,
    ) -> Result<()> {
        // In production: the upsert shown in the type docs, plus a revision
        // bump on sli_definitions in the same transaction.
        self.inner.add_to_bucket(slug, bucket_ts, delta).await
    }

    async fn buckets_in_range(
        &self,
        slug: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<SliEventBucket>> {
        // In production:
        // SELECT * FROM sli_event_buckets
        // WHERE sli_slug = $1 AND bucket_ts BETWEEN $2 AND $3
        // ORDER BY bucket_ts
        self.inner.buckets_in_range(slug, from, to).await
    }

    async fn indicator_revision(&self, slug: &str) -> Result<u64> {
        self.inner.indicator_revision(slug).await
    }

    async fn has_events(&self, slug: &str) -> Result<bool> {
        self.inner.has_events(slug).await
    }

    async fn prune_buckets_before(&self, cutoff: Timestamp) -> Result<usize> {
        // In production: DELETE FROM sli_event_buckets WHERE bucket_ts < $1
        self.inner.prune_buckets_before(cutoff).await
    }

    async fn append_decision(&self, decision: DeployDecision) -> Result<DecisionId> {
        // In production: INSERT INTO deploy_decisions ... (append-only; no
        // UPDATE grants except the override transition).
        self.inner.append_decision(decision).await
    }

    async fn get_decision(&self, id: &DecisionId) -> Result<Option<DeployDecision>> {
        self.inner.get_decision(id).await
    }

    async fn last_decision_id(&self) -> Result<Option<DecisionId>> {
        self.inner.last_decision_id().await
    }

    async fn update_decision(&self, decision: DeployDecision) -> Result<()> {
        self.inner.update_decision(decision).await
    }

    async fn list_decisions(&self) -> Result<Vec<DeployDecision>> {
        self.inner.list_decisions().await
    }

    fn kind(&self) -> StoreKind {
        StoreKind::PostgreSQL
    }

    async fn health_check(&self) -> Result<bool> {
        // In production: SELECT 1
        Ok(self.connected)
    }
}
