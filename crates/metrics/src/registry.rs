//! The service's metric registry
//!
//! One `FanoutMetrics` instance is shared by every component. Family and
//! label names follow the upstream scrape contract: received traffic is
//! broken down by flow, delivered traffic and listener lifecycle by flow
//! and user.

use crate::family::{Counter, CounterVec, Gauge};

/// Metric name prefix.
const NAMESPACE: &str = "log_socket";

/// Placeholder user label for rejections that happen before
/// authentication produced an identity.
pub const UNKNOWN_USER: &str = "N/A";

const FLOW_LABELS: &[&str] = &["kind", "namespace", "name"];
const DELIVERY_LABELS: &[&str] = &["status", "kind", "namespace", "name", "user"];

/// All counters and gauges exported by the service.
#[derive(Debug)]
pub struct FanoutMetrics {
    bytes_received: CounterVec,
    records_received: CounterVec,
    delivered_bytes: CounterVec,
    delivered_records: CounterVec,
    listeners: CounterVec,
    current_listeners: Gauge,
    healthchecks: Counter,
    errors: Counter,
}

impl FanoutMetrics {
    pub fn new() -> Self {
        Self {
            bytes_received: CounterVec::new("bytes_received", FLOW_LABELS),
            records_received: CounterVec::new("records_received", FLOW_LABELS),
            delivered_bytes: CounterVec::new("bytes", DELIVERY_LABELS),
            delivered_records: CounterVec::new("records", DELIVERY_LABELS),
            listeners: CounterVec::new("listeners", DELIVERY_LABELS),
            current_listeners: Gauge::new("current_listeners"),
            healthchecks: Counter::new("healthchecks"),
            errors: Counter::new("errors"),
        }
    }

    /// Account one record arriving on the ingest path.
    pub fn record_received(&self, kind: &str, namespace: &str, name: &str, bytes: usize) {
        let labels = [kind, namespace, name];
        self.records_received.inc(&labels);
        self.bytes_received.add(&labels, bytes as u64);
    }

    /// Account one record delivered to a listener verbatim.
    pub fn record_transmitted(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
        user: &str,
        bytes: usize,
    ) {
        let labels = ["transmitted", kind, namespace, name, user];
        self.delivered_records.inc(&labels);
        self.delivered_bytes.add(&labels, bytes as u64);
    }

    /// Account one record replaced by a permission-denied payload.
    pub fn record_redacted(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
        user: &str,
        bytes: usize,
    ) {
        let labels = ["redacted", kind, namespace, name, user];
        self.delivered_records.inc(&labels);
        self.delivered_bytes.add(&labels, bytes as u64);
    }

    pub fn listener_accepted(&self, kind: &str, namespace: &str, name: &str, user: &str) {
        self.listeners.inc(&["accepted", kind, namespace, name, user]);
    }

    pub fn listener_rejected(&self, kind: &str, namespace: &str, name: &str) {
        self.listeners
            .inc(&["rejected", kind, namespace, name, UNKNOWN_USER]);
    }

    pub fn listener_removed(&self, kind: &str, namespace: &str, name: &str, user: &str) {
        self.listeners.inc(&["removed", kind, namespace, name, user]);
    }

    pub fn current_listeners(&self, count: usize) {
        self.current_listeners.set(count as i64);
    }

    pub fn health_check(&self) {
        self.healthchecks.inc();
    }

    pub fn error(&self) {
        self.errors.inc();
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.bytes_received.render(NAMESPACE, &mut out);
        self.records_received.render(NAMESPACE, &mut out);
        self.delivered_bytes.render(NAMESPACE, &mut out);
        self.delivered_records.render(NAMESPACE, &mut out);
        self.listeners.render(NAMESPACE, &mut out);
        self.current_listeners.render(NAMESPACE, &mut out);
        self.healthchecks.render(NAMESPACE, &mut out);
        self.errors.render(NAMESPACE, &mut out);
        out
    }

    // Accessors used by tests and the exposition handler's assertions.

    pub fn records_received_for(&self, kind: &str, namespace: &str, name: &str) -> u64 {
        self.records_received.get(&[kind, namespace, name])
    }

    pub fn bytes_received_for(&self, kind: &str, namespace: &str, name: &str) -> u64 {
        self.bytes_received.get(&[kind, namespace, name])
    }

    pub fn delivered_records_for(
        &self,
        status: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        user: &str,
    ) -> u64 {
        self.delivered_records
            .get(&[status, kind, namespace, name, user])
    }

    pub fn listeners_for(
        &self,
        status: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        user: &str,
    ) -> u64 {
        self.listeners.get(&[status, kind, namespace, name, user])
    }

    pub fn current_listeners_value(&self) -> i64 {
        self.current_listeners.get()
    }

    pub fn healthchecks_value(&self) -> u64 {
        self.healthchecks.get()
    }

    pub fn errors_value(&self) -> u64 {
        self.errors.get()
    }
}

impl Default for FanoutMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
