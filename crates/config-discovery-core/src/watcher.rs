/// A consumer of one dynamically configured key.
///
/// Implementations are registered with the [`crate::DiscoveryService`] and
/// invoked from its service task whenever the backend delivers a new value
/// for [`ConfigChangeWatcher::watch_key`]. `None` means the key is absent
/// from the delivered configuration; watchers decide what absence means for
/// their policy (the agent's policy watchers treat it as "no change").
pub trait ConfigChangeWatcher: Send + Sync {
    /// The configuration key this watcher subscribes to.
    fn watch_key(&self) -> &str;

    /// Called with each accepted delivery for the watched key.
    ///
    /// Must not block: every watcher registered for the key runs on the same
    /// service task, in registration order.
    fn notify(&self, value: Option<&str>);
}
