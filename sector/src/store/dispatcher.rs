use super::{ingress::Store, metrics, state::State, Config};
use crate::{Sealed, Sealer};
use commonware_macros::select;
use commonware_runtime::{Handle, Metrics, Spawner};
use futures::{channel::oneshot, lock::Mutex, StreamExt};
use std::sync::Arc;
use tracing::{debug, trace};

/// Dispatches the completions reported by a [Sealer] to the callers observing them.
///
/// It is responsible for:
/// - Releasing callers waiting on a sector once it completes
/// - Forwarding every completion to all live subscriptions
/// - Ending all subscriptions and releasing all waiters once stopped
pub struct Dispatcher<E: Spawner + Metrics, S: Sealer> {
    ////////////////////////////////////////
    // Interfaces
    ////////////////////////////////////////
    context: E,
    sealer: S,

    ////////////////////////////////////////
    // Messaging
    ////////////////////////////////////////
    /// Resolves once the [Store] is stopped or every handle to it is dropped.
    shutdown: oneshot::Receiver<()>,

    ////////////////////////////////////////
    // State
    ////////////////////////////////////////
    /// Waiters and subscriptions, shared with the [Store].
    state: Arc<Mutex<State<S::SectorId, Sealed<S::SectorId, S::Status>>>>,
}

impl<E: Spawner + Metrics, S: Sealer> Dispatcher<E, S> {
    /// Creates a new dispatcher for `sealer`.
    ///
    /// Returns the dispatcher and the [Store] used to interact with it. The [Store] is usable
    /// right away, but no completion is dispatched until [Dispatcher::start] is called.
    pub fn new(context: E, cfg: Config, sealer: S) -> (Self, Store<S>) {
        let (stop, shutdown) = oneshot::channel();
        let metrics = metrics::Metrics::init(context.clone());
        let state = Arc::new(Mutex::new(State::new(cfg.subscription_size, metrics)));
        let store = Store::new(
            sealer.clone(),
            state.clone(),
            stop,
            cfg.temp_dir,
            cfg.temp_prefix,
        );

        (
            Self {
                context,
                sealer,
                shutdown,
                state,
            },
            store,
        )
    }

    /// Starts dispatching completions.
    ///
    /// Returns a handle that resolves once the dispatcher stops.
    pub fn start(self) -> Handle<()> {
        let context = self.context.clone();
        context.spawn(|_| self.run())
    }

    /// Inner run loop called by `start`.
    async fn run(mut self) {
        let mut completions = self.sealer.completions();
        debug!("started");

        loop {
            select! {
                // Handle shutdown signal
                _ = &mut self.shutdown => {
                    debug!("shutdown");
                    break;
                },

                // Handle completions
                completion = completions.next() => {
                    let Some(completion) = completion else {
                        debug!("completions closed");
                        break;
                    };
                    self.handle_completion(completion).await;
                },
            }
        }

        // Nothing will ever complete again
        let mut state = self.state.lock().await;
        state.stopped = true;
        let closed = state.subscribers.close_all();
        let released = state.waiters.release_all();
        state.metrics.released.inc_by(released as u64);
        state.update_gauges();
        debug!(closed, released, "stopped");
    }

    ////////////////////////////////////////
    // Handling
    ////////////////////////////////////////

    /// Handles a completion reported by the [Sealer].
    ///
    /// Waiters on the sector are released before any subscriber observes the completion.
    async fn handle_completion(&mut self, completion: Sealed<S::SectorId, S::Status>) {
        let mut state = self.state.lock().await;
        state.metrics.completions.inc();

        // Forget callers that stopped waiting
        let dropped = state.waiters.cleanup();
        if dropped > 0 {
            trace!(dropped, "forgot canceled waiters");
        }
        if let Some(released) = state.waiters.fire(&completion.sector) {
            trace!(sector = ?completion.sector, released, "fired");
            state.metrics.released.inc_by(released as u64);
        }

        // Blocks until every subscription has room for the completion
        let delivered = state.subscribers.broadcast(completion).await;
        trace!(delivered, "broadcast completion");
        state.update_gauges();
    }
}
