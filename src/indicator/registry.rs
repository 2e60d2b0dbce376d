//! Indicator registration and lookup.

use crate::core::error::{Error, Result};
use crate::indicator::definition::{validate_slug, IndicatorKind, SliDefinition};
use crate::store::backend::EvaluatorStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Registry of service level indicators, backed by the evaluator store.
pub struct IndicatorRegistry {
    store: Arc<dyn EvaluatorStore>,
}

impl IndicatorRegistry {
    /// Create a registry over a store.
    pub fn new(store: Arc<dyn EvaluatorStore>) -> Self {
        Self { store }
    }

    /// Register a new indicator.
    pub async fn register(&self, def: SliDefinition) -> Result<()> {
        validate_slug(&def.slug)?;
        let slug = def.slug.clone();
        self.store.put_indicator(def).await?;
        info!(%slug, "registered indicator");
        Ok(())
    }

    /// Look up an indicator, `None` when unregistered.
    pub async fn lookup(&self, slug: &str) -> Result<Option<SliDefinition>> {
        self.store.get_indicator(slug).await
    }

    /// Get an indicator, failing when unregistered.
    pub async fn get(&self, slug: &str) -> Result<SliDefinition> {
        self.lookup(slug)
            .await?
            .ok_or_else(|| Error::UnknownIndicator(slug.to_string()))
    }

    /// List all indicators.
    pub async fn list(&self) -> Result<Vec<SliDefinition>> {
        self.store.list_indicators().await
    }

    /// List active indicators.
    pub async fn list_active(&self) -> Result<Vec<SliDefinition>> {
        Ok(self
            .store
            .list_indicators()
            .await?
            .into_iter()
            .filter(|d| d.active)
            .collect())
    }

    /// Edit display name and/or metadata. Always allowed.
    pub async fn update_metadata(
        &self,
        slug: &str,
        name: Option<String>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        self.store.update_indicator_metadata(slug, name, metadata).await
    }

    /// Change the measurement kind.
    ///
    /// Refused with [`Error::ImmutableIndicator`] once any event references
    /// the indicator.
    pub async fn update_kind(&self, slug: &str, kind: IndicatorKind) -> Result<()> {
        let mut def = self.get(slug).await?;
        if def.kind == kind {
            return Ok(());
        }
        if self.store.has_events(slug).await? {
            return Err(Error::ImmutableIndicator(slug.to_string()));
        }
        def.kind = kind;
        self.store.replace_indicator(def).await
    }

    /// Flip the active flag.
    pub async fn set_active(&self, slug: &str, active: bool) -> Result<()> {
        self.store.set_indicator_active(slug, active).await
    }
}
