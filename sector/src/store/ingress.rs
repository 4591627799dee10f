use super::{state::State, subscribers::Subscription, temp::with_temp, Error};
use crate::{Sealed, Sealer};
use commonware_macros::select;
use futures::{channel::oneshot, io::AsyncRead, lock::Mutex};
use std::{
    future::Future,
    path::PathBuf,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};
use tracing::{debug, trace};

type Shared<S> = Arc<
    Mutex<State<<S as Sealer>::SectorId, Sealed<<S as Sealer>::SectorId, <S as Sealer>::Status>>>,
>;

/// Handle used to add pieces to a [Sealer] and observe their completion.
///
/// Created by [Dispatcher::new](super::Dispatcher::new). Every request is answered as soon as it
/// is made, even before the [Dispatcher](super::Dispatcher) is started, but completions are only
/// observed once it is.
#[derive(Clone)]
pub struct Store<S: Sealer> {
    sealer: S,
    state: Shared<S>,
    stop: Arc<SyncMutex<Option<oneshot::Sender<()>>>>,
    temp_dir: PathBuf,
    temp_prefix: String,
}

impl<S: Sealer> Store<S> {
    pub(super) fn new(
        sealer: S,
        state: Shared<S>,
        stop: oneshot::Sender<()>,
        temp_dir: PathBuf,
        temp_prefix: String,
    ) -> Self {
        Self {
            sealer,
            state,
            stop: Arc::new(SyncMutex::new(Some(stop))),
            temp_dir,
            temp_prefix,
        }
    }

    /// Add a piece of `size` bytes read from `reader` to the [Sealer].
    ///
    /// The piece is staged in a temporary file for the duration of the call. Once the [Sealer]
    /// accepts the piece, the completion of the returned sector is tracked so that
    /// [Store::wait_seal] blocks until it completes.
    pub async fn add_piece(
        &mut self,
        reference: &str,
        size: u64,
        reader: impl AsyncRead,
    ) -> Result<S::SectorId, Error> {
        let mut sealer = self.sealer.clone();
        let sector = with_temp(
            &self.temp_dir,
            &self.temp_prefix,
            reader,
            size,
            |path| async move {
                sealer
                    .add_piece(reference, size, &path)
                    .await
                    .map_err(Error::engine)
            },
        )
        .await?;

        // Track the sector (if not already tracked)
        let mut state = self.state.lock().await;
        if state.stopped {
            debug!(?sector, "dispatcher stopped, not tracking sector");
        } else if !state.waiters.ensure(sector.clone()) {
            debug!(?sector, "sector already tracked");
        }
        state.update_gauges();
        Ok(sector)
    }

    /// Wait for `sector` to complete and return its status.
    ///
    /// If `sector` is not tracked (because it already completed or was never added here), the
    /// status is returned immediately. If `canceled` resolves first, [Error::Canceled] is returned
    /// and other callers waiting on `sector` are unaffected.
    pub async fn wait_seal(
        &mut self,
        sector: S::SectorId,
        canceled: impl Future<Output = ()>,
    ) -> Result<S::Status, Error> {
        let state = &self.state;
        let released = async {
            let (responder, receiver) = oneshot::channel();
            {
                let mut state = state.lock().await;
                state.waiters.cleanup();
                if !state.waiters.wait(&sector, responder) {
                    trace!(?sector, "sector not tracked, querying status");
                    return;
                }
                state.update_gauges();
            }

            // A dropped responder means the dispatcher stopped
            let _ = receiver.await;
        };
        select! {
            _ = canceled => {
                return Err(Error::Canceled);
            },
            _ = released => {},
        }

        self.sealer
            .seal_status(&sector)
            .await
            .map_err(Error::engine)
    }

    /// Subscribe to every completion reported after this call.
    ///
    /// If the [Dispatcher](super::Dispatcher) has stopped, the returned [Subscription] is already
    /// ended.
    pub async fn subscribe(&mut self) -> Subscription<Sealed<S::SectorId, S::Status>> {
        let mut state = self.state.lock().await;
        if state.stopped {
            debug!("dispatcher stopped, subscription closed");
            return Subscription::closed();
        }
        let subscription = state.subscribers.subscribe();
        trace!(id = subscription.id(), "subscribed");
        state.update_gauges();
        subscription
    }

    /// Remove `subscription`, returning whether it was a live subscription of this store.
    ///
    /// Once this returns, no further completions are sent to `subscription`. Completions it already
    /// buffered are still yielded before it ends.
    pub async fn unsubscribe(
        &mut self,
        subscription: &Subscription<Sealed<S::SectorId, S::Status>>,
    ) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.subscribers.unsubscribe(subscription.id());
        trace!(id = subscription.id(), removed, "unsubscribed");
        state.update_gauges();
        removed
    }

    /// Stop the [Dispatcher](super::Dispatcher).
    ///
    /// Returns `false` if the store was already stopped (by this handle or any of its clones).
    pub fn stop(&self) -> bool {
        let stop = self
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(stop) = stop else {
            debug!("already stopped");
            return false;
        };
        let _ = stop.send(());
        true
    }
}
