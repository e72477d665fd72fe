//! In-memory catalog store with lock-free reloads.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use uuid::Uuid;

use crate::store::catalog::Catalog;
use crate::store::types::{Mapping, ResponseMapping, Source, Target};
use crate::store::{ConfigStore, StoreError};

/// [`ConfigStore`] serving lookups from the current [`Catalog`] snapshot.
pub struct CatalogStore {
    catalog: ArcSwap<Catalog>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: ArcSwap::from_pointee(catalog),
        }
    }

    /// Atomically replace the catalog. In-flight lookups keep the old one.
    pub fn replace(&self, catalog: Catalog) {
        let sources = catalog.source_count();
        self.catalog.store(Arc::new(catalog));
        tracing::info!(sources, "Catalog swapped");
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.catalog.load_full()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

fn parse(id: &str) -> Option<Uuid> {
    Uuid::try_parse(id).ok()
}

#[async_trait]
impl ConfigStore for CatalogStore {
    async fn source(&self, id: &str) -> Result<Option<Arc<Source>>, StoreError> {
        Ok(parse(id).and_then(|id| self.catalog.load().sources.get(&id).cloned()))
    }

    async fn mapping(&self, id: &str) -> Result<Option<Arc<Mapping>>, StoreError> {
        Ok(parse(id).and_then(|id| self.catalog.load().mappings.get(&id).cloned()))
    }

    async fn target(&self, id: &str) -> Result<Option<Arc<Target>>, StoreError> {
        Ok(parse(id).and_then(|id| self.catalog.load().targets.get(&id).cloned()))
    }

    async fn response_mapping(&self, id: &str) -> Result<Option<Arc<ResponseMapping>>, StoreError> {
        Ok(parse(id).and_then(|id| self.catalog.load().responses.get(&id).cloned()))
    }
}
