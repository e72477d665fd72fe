//! File watcher for hot reload.
//!
//! Generic over what is being reloaded: the gateway uses it for the
//! catalog, whose contents change far more often than process settings.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A watcher that re-parses a file whenever it changes.
pub struct ConfigWatcher<T, L> {
    path: PathBuf,
    loader: L,
    update_tx: mpsc::UnboundedSender<T>,
}

impl<T, L, E> ConfigWatcher<T, L>
where
    T: Send + 'static,
    L: Fn(&Path) -> Result<T, E> + Send + 'static,
    E: Display,
{
    /// Create a new watcher around `loader`.
    ///
    /// Returns the watcher and a receiver for successfully loaded values.
    pub fn new(path: &Path, loader: L) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                loader,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned handle must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            loader,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "File change detected, reloading...");
                        match loader(&path) {
                            Ok(value) => {
                                let _ = update_tx.send(value);
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload. Keeping current version."
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "File watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_change_triggers_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(file.path(), |p: &Path| {
            std::fs::read_to_string(p).map(|s| s.trim().to_string())
        });
        let _handle = watcher.run().unwrap();

        // Give the backend a moment to register the watch.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut handle = file.reopen().unwrap();
        writeln!(handle, "second").unwrap();
        handle.sync_all().unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no reload observed")
            .unwrap();
        assert!(!reloaded.is_empty());
    }
}
