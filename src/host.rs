//! Host runtime boundary.
//!
//! The host application drives the plugin's lifecycle and sequences protocol
//! steps; the plugin only ever sees it through the [`HostContext`] capability
//! trait. The controller receives the context at construction instead of
//! reaching for a global accessor, so tests can supply [`MockHost`].
//!
//! The one signal flowing the other way is [`HostSignal::StepComplete`]: the
//! host waits for it from every plugin before advancing to the next step.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::settings::{MemoryStore, SettingsStore};

/// Identity under which the host registers a plugin.
///
/// Compared by equality; the host passes it back into
/// `on_step_options_changed` to tell plugins whose options changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginId(String);

impl PluginId {
    /// Creates an identifier from the host's registered plugin name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signals emitted by the plugin back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostSignal {
    /// Emitted exactly once per `on_step_run` invocation, after this plugin
    /// has finished reacting to the step. `result` is always `None` for this
    /// plugin.
    StepComplete {
        plugin: PluginId,
        result: Option<Value>,
    },
}

/// Capabilities the host exposes to the plugin.
///
/// All calls are synchronous; the host invokes plugin callbacks serially on
/// its own event loop, so implementations only need interior mutability to
/// satisfy the `&self` receivers.
pub trait HostContext: Send + Sync {
    /// The host's settings persistence API.
    fn settings(&self) -> &dyn SettingsStore;

    /// Whether a protocol is currently loaded.
    fn protocol_loaded(&self) -> bool;

    /// Index of the step the host is currently executing.
    fn current_step(&self) -> usize;

    /// Whether the host is in realtime preview mode.
    fn realtime_mode(&self) -> bool;

    /// Whether the host is actively running a protocol.
    fn running(&self) -> bool;

    /// Requests a refresh of the host's step-grid view.
    fn request_grid_refresh(&self);

    /// Delivers a signal to the host's signal bus.
    fn emit(&self, signal: HostSignal);
}

/// In-process host double for tests.
///
/// Records grid-refresh requests and emitted signals, and lets tests flip
/// the protocol/mode flags the controller gates on.
#[derive(Default)]
pub struct MockHost {
    store: MemoryStore,
    protocol_loaded: AtomicBool,
    realtime_mode: AtomicBool,
    running: AtomicBool,
    current_step: AtomicUsize,
    grid_refreshes: AtomicUsize,
    signals: Mutex<Vec<HostSignal>>,
}

impl MockHost {
    /// Creates a host with no protocol loaded and both mode flags off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a protocol as loaded (or unloaded).
    pub fn set_protocol_loaded(&self, loaded: bool) {
        self.protocol_loaded.store(loaded, Ordering::SeqCst);
    }

    /// Sets the realtime preview flag.
    pub fn set_realtime_mode(&self, realtime: bool) {
        self.realtime_mode.store(realtime, Ordering::SeqCst);
    }

    /// Sets the protocol-running flag.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Sets the step the host reports as currently executing.
    pub fn set_current_step(&self, step: usize) {
        self.current_step.store(step, Ordering::SeqCst);
    }

    /// Number of grid-refresh requests received so far.
    pub fn grid_refresh_count(&self) -> usize {
        self.grid_refreshes.load(Ordering::SeqCst)
    }

    /// Copy of the signals emitted so far, in order.
    pub fn emitted_signals(&self) -> Vec<HostSignal> {
        self.signals.lock().unwrap().clone()
    }
}

impl HostContext for MockHost {
    fn settings(&self) -> &dyn SettingsStore {
        &self.store
    }

    fn protocol_loaded(&self) -> bool {
        self.protocol_loaded.load(Ordering::SeqCst)
    }

    fn current_step(&self) -> usize {
        self.current_step.load(Ordering::SeqCst)
    }

    fn realtime_mode(&self) -> bool {
        self.realtime_mode.load(Ordering::SeqCst)
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn request_grid_refresh(&self) {
        self.grid_refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn emit(&self, signal: HostSignal) {
        self.signals.lock().unwrap().push(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mock_host_records_signals_in_order() {
        let host = MockHost::new();
        host.emit(HostSignal::StepComplete {
            plugin: PluginId::new("a"),
            result: None,
        });
        host.emit(HostSignal::StepComplete {
            plugin: PluginId::new("b"),
            result: Some(json!(1)),
        });

        let signals = host.emitted_signals();
        assert_eq!(signals.len(), 2);
        assert_eq!(
            signals[0],
            HostSignal::StepComplete {
                plugin: PluginId::new("a"),
                result: None,
            }
        );
    }

    #[test]
    fn mock_host_counts_grid_refreshes() {
        let host = MockHost::new();
        assert_eq!(host.grid_refresh_count(), 0);
        host.request_grid_refresh();
        host.request_grid_refresh();
        assert_eq!(host.grid_refresh_count(), 2);
    }
}
