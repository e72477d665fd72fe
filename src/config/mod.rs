//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared to subsystems at startup
//!
//! Catalog file (sources, mappings, targets, responses):
//!     watcher.rs detects change
//!     → store::catalog loads new catalog
//!     → atomic swap inside CatalogStore
//!     → next gateway invocation observes it
//! ```
//!
//! # Design Decisions
//! - Process config is immutable once loaded; catalog is hot-reloadable
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DispatchConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, StoreConfig,
    TemplateConfig, TimeoutConfig,
};
pub use watcher::ConfigWatcher;
