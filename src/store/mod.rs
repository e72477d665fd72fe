//! Configuration store subsystem.
//!
//! # Data Flow
//! ```text
//! catalog.toml
//!     → catalog.rs (parse, index by id, reject duplicates)
//!     → memory.rs (CatalogStore, ArcSwap snapshot)
//!     → ConfigStore lookups from the gateway handler
//! ```
//!
//! # Design Decisions
//! - Lookups return `Ok(None)` for unknown or malformed ids; only a store
//!   that cannot be reached returns an error
//! - Entities are handed out as `Arc` snapshots and never mutated
//! - Other backends (a database, a remote registry) plug in behind the trait

pub mod catalog;
pub mod memory;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use catalog::{load_catalog, Catalog, CatalogError};
pub use memory::CatalogStore;
pub use types::{Encoding, Flow, Mapping, ResponseMapping, Source, Target};

/// Transport-level store failure.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("configuration store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to configured entities by id.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn source(&self, id: &str) -> Result<Option<Arc<Source>>, StoreError>;

    async fn mapping(&self, id: &str) -> Result<Option<Arc<Mapping>>, StoreError>;

    async fn target(&self, id: &str) -> Result<Option<Arc<Target>>, StoreError>;

    async fn response_mapping(&self, id: &str) -> Result<Option<Arc<ResponseMapping>>, StoreError>;
}
