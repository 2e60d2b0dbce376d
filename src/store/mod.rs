//! Store Module
//!
//! Durable storage behind the evaluator:
//! - Backend trait over indicators, SLOs, buckets, and decisions
//! - Memory and PostgreSQL backends
//! - Configuration-driven construction
//! - Bucket retention policy

pub mod backend;
pub mod config;
pub mod factory;
pub mod memory;
pub mod postgres;
pub mod retention;

pub use backend::{BucketDelta, EvaluatorStore, StoreKind};
pub use config::{PostgresConfig, StoreConfig};
pub use factory::{create_memory_store, create_store};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use retention::RetentionPolicy;
