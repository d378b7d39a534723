//! Observation and fault injection for the fixture extension

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Shared by every fixture collaborator of one extension instance
#[derive(Debug, Default)]
pub struct Probe {
    events: Mutex<Vec<String>>,
    configurations_created: AtomicUsize,
    connections: AtomicUsize,
    validations: AtomicUsize,
    resolver_calls: AtomicUsize,
    fail_connect: AtomicBool,
    fail_validation: AtomicBool,
    connect_delay: Mutex<Duration>,
    /// Signalled when the blocking value provider starts
    pub entered: Notify,
    /// Releases the blocking value provider
    pub gate: Notify,
}

impl Probe {
    /// Fresh probe
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    /// Lifecycle events in order (`create:`, `connect:`, `disconnect:`, `dispose:`)
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub(crate) fn configuration_created(&self) {
        self.configurations_created.fetch_add(1, Ordering::SeqCst);
    }

    /// Configurations instantiated so far
    #[must_use]
    pub fn configurations_created(&self) -> usize {
        self.configurations_created.load(Ordering::SeqCst)
    }

    pub(crate) fn connected(&self) {
        self.connections.fetch_add(1, Ordering::SeqCst);
    }

    /// Connection attempts so far
    #[must_use]
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub(crate) fn validated(&self) {
        self.validations.fetch_add(1, Ordering::SeqCst);
    }

    /// Connection validations so far
    #[must_use]
    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    pub(crate) fn resolver_called(&self) {
        self.resolver_calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Resolver and value provider invocations so far
    #[must_use]
    pub fn resolver_calls(&self) -> usize {
        self.resolver_calls.load(Ordering::SeqCst)
    }

    /// Make connection attempts fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_connect(&self) -> bool {
        self.fail_connect.load(Ordering::SeqCst)
    }

    /// Make connection validation fail
    pub fn set_fail_validation(&self, fail: bool) {
        self.fail_validation.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_validation(&self) -> bool {
        self.fail_validation.load(Ordering::SeqCst)
    }

    /// Delay every connection attempt
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock() = delay;
    }

    pub(crate) fn connect_delay(&self) -> Duration {
        *self.connect_delay.lock()
    }
}
