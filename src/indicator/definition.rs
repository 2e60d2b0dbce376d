//! Indicator definitions.
//!
//! A service level indicator (SLI) is a measurable signal identified by a
//! unique slug.

use crate::core::error::{Error, Result};
use crate::core::types::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Measurement kind of an indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    /// Good/bad event counts, evaluated as a success ratio.
    EventRatio,
    /// Latency samples, evaluated against a threshold.
    Threshold,
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorKind::EventRatio => write!(f, "event_ratio"),
            IndicatorKind::Threshold => write!(f, "threshold"),
        }
    }
}

/// A registered service level indicator.
///
/// The slug and kind are immutable once events reference the indicator;
/// display name and metadata remain editable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SliDefinition {
    /// Unique slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Measurement kind
    pub kind: IndicatorKind,
    /// Active flag
    pub active: bool,
    /// Registration timestamp
    pub created: Timestamp,
    /// Free-form metadata
    pub metadata: HashMap<String, String>,
}

impl SliDefinition {
    /// Create a new indicator definition.
    pub fn new(slug: &str, name: &str, kind: IndicatorKind) -> Result<Self> {
        validate_slug(slug)?;
        Ok(Self {
            slug: slug.to_string(),
            name: name.to_string(),
            kind,
            active: true,
            created: now(),
            metadata: HashMap::new(),
        })
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Mark inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Validate an indicator or SLO slug.
///
/// Slugs are lowercase ASCII, digits, `-` and `_`, non-empty.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::InvalidSlug("slug is empty".to_string()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(Error::InvalidSlug(slug.to_string()));
    }
    Ok(())
}
