//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the initial catalog
//! - Build the gateway (store, renderer, dispatcher)
//! - Start the catalog watcher
//! - Hand the listener to the HTTP server

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigWatcher, GatewayConfig};
use crate::gateway::{DispatchError, Dispatcher, Gateway};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::store::{load_catalog, Catalog, CatalogError, CatalogStore};
use crate::template::TemplateRenderer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("failed to watch catalog: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully wired gateway, ready to serve.
pub struct Application {
    config: GatewayConfig,
    catalog_path: Option<PathBuf>,
    store: Arc<CatalogStore>,
    gateway: Gateway,
}

impl Application {
    /// Load the catalog named by `config.store.path` and build every subsystem.
    pub fn build(config: GatewayConfig) -> Result<Self, StartupError> {
        let catalog_path = config.store.path.as_deref().map(PathBuf::from);
        let catalog = match &catalog_path {
            Some(path) => load_catalog(path)?,
            None => {
                tracing::warn!("No catalog configured; every source id will be unknown");
                Catalog::default()
            }
        };

        let store = Arc::new(CatalogStore::new(catalog));
        let renderer = Arc::new(TemplateRenderer::new(&config.templates));
        let dispatcher = Dispatcher::new(&config.dispatch)?;
        let gateway = Gateway::new(store.clone(), renderer, dispatcher);

        Ok(Self {
            config,
            catalog_path,
            store,
            gateway,
        })
    }

    pub fn store(&self) -> Arc<CatalogStore> {
        self.store.clone()
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// The HTTP router without binding a listener.
    pub fn router(&self) -> Router {
        HttpServer::new(self.config.clone(), self.gateway.clone()).router()
    }

    /// Serve on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        // Dropping the handle stops the watcher.
        let _watcher = self.watch_catalog()?;

        let server = HttpServer::new(self.config, self.gateway);
        server.run(listener, shutdown.signalled()).await?;
        Ok(())
    }

    fn watch_catalog(&self) -> Result<Option<RecommendedWatcher>, StartupError> {
        let Some(path) = self.catalog_path.as_deref().filter(|_| self.config.store.watch) else {
            return Ok(None);
        };

        let (watcher, mut updates) = ConfigWatcher::new(path, load_catalog);
        let handle = watcher.run()?;

        let store = self.store.clone();
        tokio::spawn(async move {
            while let Some(catalog) = updates.recv().await {
                store.replace(catalog);
            }
        });

        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use std::io::Write;

    #[test]
    fn test_build_without_catalog() {
        let app = Application::build(GatewayConfig::default()).unwrap();
        assert_eq!(app.store().snapshot().source_count(), 0);
    }

    #[test]
    fn test_missing_catalog_is_fatal() {
        let config = GatewayConfig {
            store: StoreConfig {
                path: Some("/definitely/not/here.toml".into()),
                watch: false,
            },
            ..Default::default()
        };
        assert!(matches!(Application::build(config), Err(StartupError::Catalog(_))));
    }

    #[test]
    fn test_build_with_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[sources]]
id = "6f1c2f0e-8d3b-4a53-9a59-7b7f7bb1f0aa"
name = "orders"
"#
        )
        .unwrap();

        let config = GatewayConfig {
            store: StoreConfig {
                path: Some(file.path().to_string_lossy().into_owned()),
                watch: false,
            },
            ..Default::default()
        };
        let app = Application::build(config).unwrap();
        assert_eq!(app.store().snapshot().source_count(), 1);
    }
}
