//! Store factory.
//!
//! Creates evaluator stores based on configuration.

use crate::core::error::Result;
use crate::store::backend::{EvaluatorStore, StoreKind};
use crate::store::config::StoreConfig;
use crate::store::memory::MemoryStore;
use crate::store::postgres::PostgresStore;
use std::sync::Arc;

/// Create an evaluator store from configuration.
///
/// Returns an Arc-wrapped store for shared ownership across recorder,
/// calculator, and gate.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn EvaluatorStore>> {
    match config.backend {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::PostgreSQL => {
            let pg_config = config.postgresql.clone().unwrap_or_default();
            let store = PostgresStore::new(pg_config).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Create an in-memory store (convenience function).
pub fn create_memory_store() -> Arc<dyn EvaluatorStore> {
    Arc::new(MemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_memory() {
        let store = create_store(&StoreConfig::memory()).await.unwrap();
        assert_eq!(store.kind(), StoreKind::Memory);
    }

    #[tokio::test]
    async fn test_factory_postgresql() {
        let config = StoreConfig::postgresql("postgresql://localhost/test");
        let store = create_store(&config).await.unwrap();
        assert_eq!(store.kind(), StoreKind::PostgreSQL);
    }

    #[test]
    fn test_memory_convenience() {
        let store = create_memory_store();
        assert_eq!(store.kind(), StoreKind::Memory);
    }
}
