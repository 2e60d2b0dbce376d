//! # slogate - SLO and Error-Budget Evaluation
//!
//! A deploy-gating evaluator built from three pieces:
//! - **SliRecorder**: persists good/bad counts and latency samples as
//!   time-bucketed counters
//! - **BudgetCalculator**: aggregates a window of buckets into current
//!   service level, consumed and remaining budget, and a status tier
//! - **DeployGate**: turns the worst-case tier into an allow/warn/block
//!   decision with an audited override path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slogate::budget::{BudgetCalculator, SloDefinition};
//! use slogate::core::SystemClock;
//! use slogate::indicator::{IndicatorKind, RecorderConfig, SliDefinition, SliRecorder};
//! use slogate::store::{create_memory_store, EvaluatorStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = create_memory_store();
//!     let clock = Arc::new(SystemClock);
//!
//!     store
//!         .put_indicator(SliDefinition::new("api", "API availability", IndicatorKind::EventRatio).unwrap())
//!         .await
//!         .unwrap();
//!
//!     let recorder = SliRecorder::new(store.clone(), clock.clone(), RecorderConfig::default());
//!     recorder.record_good_bad("api", 999, 1, Some("web")).await.unwrap();
//!
//!     let calculator = BudgetCalculator::new(store, clock);
//!     calculator
//!         .register_slo(SloDefinition::new("api-99_9", "api", 99.9, 86_400).unwrap())
//!         .await
//!         .unwrap();
//!     let status = calculator.calculate_slug("api-99_9").await.unwrap();
//!     println!("{}: {} remaining", status.slo_slug, status.budget_remaining_percent);
//! }
//! ```

pub mod budget;
pub mod core;
pub mod gate;
pub mod indicator;
pub mod store;

pub use crate::core::error::{Error, Result};

/// Install a default tracing subscriber for binaries and examples.
///
/// Call once at startup; later calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::util::SubscriberInitExt;
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .finish()
        .try_init();
}
