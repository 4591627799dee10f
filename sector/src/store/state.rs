use super::{metrics::Metrics, subscribers::Subscribers, waiters::Waiters};
use std::hash::Hash;

/// State shared by the [Dispatcher](super::Dispatcher) and every handle to its
/// [Store](super::Store).
///
/// Every mutation happens under a single lock, so a completion is fired and broadcast as one step
/// with respect to the requests of the [Store](super::Store).
pub struct State<I, T> {
    /// Sectors with a pending completion and the callers waiting on them.
    pub waiters: Waiters<I>,

    /// Live subscriptions.
    pub subscribers: Subscribers<T>,

    /// Set once the [Dispatcher](super::Dispatcher) has stopped. Nothing is tracked or subscribed
    /// afterwards.
    pub stopped: bool,

    pub metrics: Metrics,
}

impl<I: Eq + Hash, T: Clone> State<I, T> {
    pub fn new(subscription_size: usize, metrics: Metrics) -> Self {
        Self {
            waiters: Waiters::new(),
            subscribers: Subscribers::new(subscription_size),
            stopped: false,
            metrics,
        }
    }

    /// Refresh the gauges tracking the size of the state.
    pub fn update_gauges(&self) {
        self.metrics.pending.set(self.waiters.pending() as i64);
        self.metrics.waiters.set(self.waiters.waiting() as i64);
        self.metrics.subscribers.set(self.subscribers.len() as i64);
    }
}
