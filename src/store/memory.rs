//! In-memory backend.
//!
//! Default backend and the test vehicle. Bucket merges happen under the
//! write lock, so concurrent recorders are additive.

use crate::budget::slo::SloDefinition;
use crate::core::error::{Error, Result};
use crate::core::types::Timestamp;
use crate::gate::decision::{DecisionId, DeployDecision};
use crate::indicator::bucket::SliEventBucket;
use crate::indicator::definition::SliDefinition;
use crate::store::backend::{BucketDelta, EvaluatorStore, StoreKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory evaluator store.
#[derive(Default)]
pub struct MemoryStore {
    indicators: RwLock<HashMap<String, SliDefinition>>,
    slos: RwLock<HashMap<String, SloDefinition>>,
    buckets: RwLock<HashMap<(String, i64), SliEventBucket>>,
    revisions: RwLock<HashMap<String, u64>>,
    decisions: RwLock<HashMap<String, DeployDecision>>,
    decision_order: RwLock<Vec<DecisionId>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvaluatorStore for MemoryStore {
    async fn put_indicator(&self, def: SliDefinition) -> Result<()> {
        let mut indicators = self.indicators.write().unwrap();
        if indicators.contains_key(&def.slug) {
            return Err(Error::DuplicateIndicator(def.slug));
        }
        indicators.insert(def.slug.clone(), def);
        Ok(())
    }

    async fn get_indicator(&self, slug: &str) -> Result<Option<SliDefinition>> {
        Ok(self.indicators.read().unwrap().get(slug).cloned())
    }

    async fn list_indicators(&self) -> Result<Vec<SliDefinition>> {
        let mut all: Vec<SliDefinition> = self.indicators.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(all)
    }

    async fn update_indicator_metadata(
        &self,
        slug: &str,
        name: Option<String>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        let mut indicators = self.indicators.write().unwrap();
        let def = indicators
            .get_mut(slug)
            .ok_or_else(|| Error::UnknownIndicator(slug.to_string()))?;
        if let Some(name) = name {
            def.name = name;
        }
        if let Some(metadata) = metadata {
            def.metadata = metadata;
        }
        Ok(())
    }

    async fn replace_indicator(&self, def: SliDefinition) -> Result<()> {
        let mut indicators = self.indicators.write().unwrap();
        if !indicators.contains_key(&def.slug) {
            return Err(Error::UnknownIndicator(def.slug));
        }
        indicators.insert(def.slug.clone(), def);
        Ok(())
    }

    async fn set_indicator_active(&self, slug: &str, active: bool) -> Result<()> {
        let mut indicators = self.indicators.write().unwrap();
        let def = indicators
            .get_mut(slug)
            .ok_or_else(|| Error::UnknownIndicator(slug.to_string()))?;
        def.active = active;
        Ok(())
    }

    async fn put_slo(&self, slo: SloDefinition) -> Result<()> {
        let mut slos = self.slos.write().unwrap();
        if slos.contains_key(&slo.slug) {
            return Err(Error::DuplicateSlo(slo.slug));
        }
        slos.insert(slo.slug.clone(), slo);
        Ok(())
    }

    async fn get_slo(&self, slug: &str) -> Result<Option<SloDefinition>> {
        Ok(self.slos.read().unwrap().get(slug).cloned())
    }

    async fn list_slos(&self) -> Result<Vec<SloDefinition>> {
        let mut all: Vec<SloDefinition> = self.slos.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(all)
    }

    async fn add_to_bucket(
        &self,
        slug: &str,
        bucket_ts: Timestamp,
        delta: BucketDelta,
    ) -> Result<()> {
        // Merge and revision bump under one write lock so concurrent
        // recorders stay additive.
        let mut buckets = self.buckets.write().unwrap();
        let key = (slug.to_string(), bucket_ts.timestamp());
        let bucket = buckets
            .entry(key)
            .or_insert_with(|| SliEventBucket::new(slug, bucket_ts));
        bucket.add_counts(delta.good, delta.bad, delta.source.as_deref());
        if delta.latency.is_some() || delta.percentiles.is_some() {
            bucket.add_latency(delta.latency, delta.percentiles.as_ref(), None);
        }

        let mut revisions = self.revisions.write().unwrap();
        *revisions.entry(slug.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn buckets_in_range(
        &self,
        slug: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<SliEventBucket>> {
        let buckets = self.buckets.read().unwrap();
        let mut hits: Vec<SliEventBucket> = buckets
            .values()
            .filter(|b| b.sli_slug == slug && b.bucket_ts >= from && b.bucket_ts <= to)
            .cloned()
            .collect();
        hits.sort_by_key(|b| b.bucket_ts);
        Ok(hits)
    }

    async fn indicator_revision(&self, slug: &str) -> Result<u64> {
        Ok(*self.revisions.read().unwrap().get(slug).unwrap_or(&0))
    }

    async fn has_events(&self, slug: &str) -> Result<bool> {
        Ok(self
            .buckets
            .read()
            .unwrap()
            .values()
            .any(|b| b.sli_slug == slug && !b.is_empty()))
    }

    async fn prune_buckets_before(&self, cutoff: Timestamp) -> Result<usize> {
        let mut buckets = self.buckets.write().unwrap();
        let before = buckets.len();
        buckets.retain(|_, b| b.bucket_ts >= cutoff);
        Ok(before - buckets.len())
    }

    async fn append_decision(&self, decision: DeployDecision) -> Result<DecisionId> {
        let id = decision.id.clone();
        let mut decisions = self.decisions.write().unwrap();
        decisions.insert(id.as_str().to_string(), decision);
        self.decision_order.write().unwrap().push(id.clone());
        Ok(id)
    }

    async fn get_decision(&self, id: &DecisionId) -> Result<Option<DeployDecision>> {
        Ok(self.decisions.read().unwrap().get(id.as_str()).cloned())
    }

    async fn last_decision_id(&self) -> Result<Option<DecisionId>> {
        Ok(self.decision_order.read().unwrap().last().cloned())
    }

    async fn update_decision(&self, decision: DeployDecision) -> Result<()> {
        let mut decisions = self.decisions.write().unwrap();
        if !decisions.contains_key(decision.id.as_str()) {
            return Err(Error::UnknownDecision(decision.id.to_string()));
        }
        decisions.insert(decision.id.as_str().to_string(), decision);
        Ok(())
    }

    async fn list_decisions(&self) -> Result<Vec<DeployDecision>> {
        let decisions = self.decisions.read().unwrap();
        let order = self.decision_order.read().unwrap();
        Ok(order
            .iter()
            .filter_map(|id| decisions.get(id.as_str()).cloned())
            .collect())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}
