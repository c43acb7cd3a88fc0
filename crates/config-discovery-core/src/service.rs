use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::watcher::ConfigChangeWatcher;

/// Errors surfaced to producers on the discovery feed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("configuration discovery service is not running")]
    ServiceUnavailable,
}

pub enum DiscoveryCommand {
    Register(Arc<dyn ConfigChangeWatcher>),
    Deliver {
        key: String,
        value: Option<String>,
    },
    Shutdown,
}

/// Cloneable producer side of the discovery feed.
#[derive(Clone)]
pub struct DiscoveryHandle {
    tx: mpsc::UnboundedSender<DiscoveryCommand>,
}

impl DiscoveryHandle {
    /// Registers a watcher for its key. If a value for that key has already
    /// been delivered, the watcher is brought up to date immediately.
    pub fn register_watcher(
        &self,
        watcher: Arc<dyn ConfigChangeWatcher>,
    ) -> Result<(), DeliveryError> {
        self.tx
            .send(DiscoveryCommand::Register(watcher))
            .map_err(|_| DeliveryError::ServiceUnavailable)
    }

    /// Forwards one delivery from the backend. `None` marks the key absent
    /// from the delivered configuration.
    pub fn deliver(&self, key: &str, value: Option<String>) -> Result<(), DeliveryError> {
        self.tx
            .send(DiscoveryCommand::Deliver {
                key: key.to_string(),
                value,
            })
            .map_err(|_| DeliveryError::ServiceUnavailable)
    }

    pub fn shutdown(&self) {
        // Nothing to do if the service already stopped.
        let _ = self.tx.send(DiscoveryCommand::Shutdown);
    }
}

/// Service task owning the watcher registry and per-key delivery history.
pub struct DiscoveryService {
    rx: mpsc::UnboundedReceiver<DiscoveryCommand>,
    watchers: HashMap<String, Vec<Arc<dyn ConfigChangeWatcher>>>,
    last_values: HashMap<String, Option<String>>,
}

impl DiscoveryService {
    pub fn new() -> (Self, DiscoveryHandle) {
        let (tx, rx) = mpsc::unbounded_channel();

        let service = Self {
            rx,
            watchers: HashMap::new(),
            last_values: HashMap::new(),
        };

        (service, DiscoveryHandle { tx })
    }

    /// Drains commands until `Shutdown` or every handle is dropped.
    pub async fn run(mut self) {
        debug!("Configuration discovery service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                DiscoveryCommand::Register(watcher) => self.register(watcher),
                DiscoveryCommand::Deliver { key, value } => self.deliver(&key, value),
                DiscoveryCommand::Shutdown => {
                    debug!("Configuration discovery service shutting down");
                    break;
                }
            }
        }
    }

    fn register(&mut self, watcher: Arc<dyn ConfigChangeWatcher>) {
        let key = watcher.watch_key().to_string();

        // Late registrations catch up on the latest accepted value.
        if let Some(last) = self.last_values.get(&key) {
            watcher.notify(last.as_deref());
        }

        debug!("Registered configuration watcher for key {key}");
        self.watchers.entry(key).or_default().push(watcher);
    }

    fn deliver(&mut self, key: &str, value: Option<String>) {
        let Some(watchers) = self.watchers.get(key) else {
            debug!("Dropping configuration delivery for unwatched key {key}");
            return;
        };

        // Backends re-send the full configuration on every sync; an
        // unchanged value is an idempotent no-op for the watchers.
        if self.last_values.get(key) == Some(&value) {
            return;
        }

        for watcher in watchers {
            watcher.notify(value.as_deref());
        }

        self.last_values.insert(key.to_string(), value);
    }
}
