// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Connectivity state of the backend channel.
//!
//! The transport layer is the only writer; it reports each status transition
//! through [`ConnectivityHandle::report_status`]. Readers take lock-free
//! snapshots of the current value, and registered [`ChannelListener`]s are
//! fanned the new status on a dedicated dispatch task so a stalled listener
//! can never hold up the transport's status reporting.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Status of the channel to the trace-reporting backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelStatus {
    Connected = 0,
    /// Initial state until the transport layer reports otherwise.
    Disconnected = 1,
}

impl ChannelStatus {
    pub(crate) fn from_u8(raw: u8) -> ChannelStatus {
        match raw {
            0 => ChannelStatus::Connected,
            _ => ChannelStatus::Disconnected,
        }
    }
}

/// Observer of channel status transitions.
///
/// Callbacks run on the monitor's dispatch task in registration order. They
/// may cache the status into their own shared state but must not call back
/// into [`ConnectivityHandle::report_status`].
pub trait ChannelListener: Send + Sync {
    fn status_changed(&self, status: ChannelStatus);
}

enum MonitorCommand {
    Observe(Arc<dyn ChannelListener>),
    Dispatch(ChannelStatus),
}

/// Cloneable entry point for both the transport layer (writes) and any
/// status reader.
#[derive(Clone)]
pub struct ConnectivityHandle {
    status: Arc<AtomicU8>,
    tx: mpsc::UnboundedSender<MonitorCommand>,
}

impl ConnectivityHandle {
    /// Last published status. Never blocks on the writer.
    pub fn current_status(&self) -> ChannelStatus {
        ChannelStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Registers a listener; it will observe every transition reported after
    /// registration, in registration order relative to other listeners.
    pub fn observe_status(&self, listener: Arc<dyn ChannelListener>) {
        if self.tx.send(MonitorCommand::Observe(listener)).is_err() {
            error!("Connectivity monitor is not running; listener dropped");
        }
    }

    /// Transport-layer entry point: publishes the new status.
    ///
    /// The shared value is updated before this returns, so readers
    /// immediately see it; listener fan-out happens on the dispatch task.
    pub fn report_status(&self, status: ChannelStatus) {
        self.status.store(status as u8, Ordering::Release);
        if self.tx.send(MonitorCommand::Dispatch(status)).is_err() {
            debug!("Connectivity monitor stopped; skipping listener dispatch");
        }
    }
}

/// Dispatch task owning the listener registry.
pub struct ConnectivityMonitor {
    rx: mpsc::UnboundedReceiver<MonitorCommand>,
    listeners: Vec<Arc<dyn ChannelListener>>,
}

impl ConnectivityMonitor {
    pub fn new() -> (Self, ConnectivityHandle) {
        let (tx, rx) = mpsc::unbounded_channel();

        let monitor = Self {
            rx,
            listeners: Vec::new(),
        };

        let handle = ConnectivityHandle {
            status: Arc::new(AtomicU8::new(ChannelStatus::Disconnected as u8)),
            tx,
        };

        (monitor, handle)
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        debug!("Connectivity monitor started");

        loop {
            tokio::select! {
                command = self.rx.recv() => {
                    match command {
                        Some(MonitorCommand::Observe(listener)) => {
                            self.listeners.push(listener);
                        }
                        Some(MonitorCommand::Dispatch(status)) => {
                            for listener in &self.listeners {
                                listener.status_changed(status);
                            }
                        }
                        None => break,
                    }
                }
                () = shutdown.cancelled() => {
                    debug!("Connectivity monitor shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct OrderedListener {
        tag: usize,
        log: Arc<Mutex<Vec<(usize, ChannelStatus)>>>,
    }

    impl ChannelListener for OrderedListener {
        fn status_changed(&self, status: ChannelStatus) {
            self.log.lock().unwrap().push((self.tag, status));
        }
    }

    struct CountingListener {
        calls: AtomicUsize,
    }

    impl ChannelListener for CountingListener {
        fn status_changed(&self, _status: ChannelStatus) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn starts_disconnected() {
        let (_monitor, handle) = ConnectivityMonitor::new();
        assert_eq!(handle.current_status(), ChannelStatus::Disconnected);
    }

    #[test]
    fn report_is_visible_before_dispatch_runs() {
        // No task is draining the channel here; the read must still see the
        // new value.
        let (_monitor, handle) = ConnectivityMonitor::new();
        handle.report_status(ChannelStatus::Connected);
        assert_eq!(handle.current_status(), ChannelStatus::Connected);
    }

    #[tokio::test]
    async fn listeners_observe_transitions_in_registration_order() {
        let (monitor, handle) = ConnectivityMonitor::new();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(monitor.run(shutdown.clone()));

        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..3 {
            handle.observe_status(Arc::new(OrderedListener {
                tag,
                log: log.clone(),
            }));
        }

        handle.report_status(ChannelStatus::Connected);
        handle.report_status(ChannelStatus::Disconnected);

        for _ in 0..100 {
            if log.lock().unwrap().len() == 6 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        shutdown.cancel();
        task.await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                (0, ChannelStatus::Connected),
                (1, ChannelStatus::Connected),
                (2, ChannelStatus::Connected),
                (0, ChannelStatus::Disconnected),
                (1, ChannelStatus::Disconnected),
                (2, ChannelStatus::Disconnected),
            ]
        );
    }

    #[tokio::test]
    async fn listener_registered_after_transition_misses_it() {
        let (monitor, handle) = ConnectivityMonitor::new();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(monitor.run(shutdown.clone()));

        handle.report_status(ChannelStatus::Connected);

        let listener = Arc::new(CountingListener {
            calls: AtomicUsize::new(0),
        });
        handle.observe_status(listener.clone());
        handle.report_status(ChannelStatus::Disconnected);

        for _ in 0..100 {
            if listener.calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        shutdown.cancel();
        task.await.unwrap();

        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
    }
}
