use commonware_runtime::Metrics as RuntimeMetrics;
use prometheus_client::metrics::{counter::Counter, gauge::Gauge};

/// Metrics for the [Dispatcher](super::Dispatcher).
#[derive(Default)]
pub struct Metrics {
    /// Number of completions dispatched
    pub completions: Counter,
    /// Number of sectors with a pending completion
    pub pending: Gauge,
    /// Number of callers waiting on a pending completion
    pub waiters: Gauge,
    /// Number of live subscriptions
    pub subscribers: Gauge,
    /// Number of waiters released
    pub released: Counter,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given context.
    pub fn init<E: RuntimeMetrics>(context: E) -> Self {
        let metrics = Self::default();
        context.register(
            "completions",
            "Number of completions dispatched",
            metrics.completions.clone(),
        );
        context.register(
            "pending",
            "Number of sectors with a pending completion",
            metrics.pending.clone(),
        );
        context.register(
            "waiters",
            "Number of callers waiting on a pending completion",
            metrics.waiters.clone(),
        );
        context.register(
            "subscribers",
            "Number of live subscriptions",
            metrics.subscribers.clone(),
        );
        context.register(
            "released",
            "Number of waiters released",
            metrics.released.clone(),
        );
        metrics
    }
}
