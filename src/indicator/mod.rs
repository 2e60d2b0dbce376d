//! Indicator Module
//!
//! Service level indicators:
//! - Definitions and slug validation
//! - Time-bucketed counters
//! - Registration and lookup
//! - Event recording

pub mod bucket;
pub mod definition;
pub mod recorder;
pub mod registry;

pub use bucket::{bucket_start, Percentile, PercentileSet, SliEventBucket};
pub use definition::{IndicatorKind, SliDefinition};
pub use recorder::{RecorderConfig, SliRecorder};
pub use registry::IndicatorRegistry;
