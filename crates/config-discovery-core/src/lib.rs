//! Dynamic configuration discovery for the tracing agent.
//!
//! The backend pushes key/value configuration updates at its own cadence.
//! This crate owns the inbound side of that feed: components register a
//! [`ConfigChangeWatcher`] for the key they care about, and the transport
//! layer forwards each delivery through a [`DiscoveryHandle`]. Watchers are
//! notified on a dedicated service task so a slow watcher never blocks the
//! transport, and repeated deliveries of an unchanged value are dropped
//! before they reach any watcher.

pub mod service;
pub mod watcher;

pub use service::{DeliveryError, DiscoveryCommand, DiscoveryHandle, DiscoveryService};
pub use watcher::ConfigChangeWatcher;
