use futures::{channel::mpsc, SinkExt, Stream, StreamExt};
use std::{
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
};
use tracing::trace;

/// Source of subscription identifiers, shared by every store in the process.
static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A stream of every item broadcast after it was created.
///
/// The stream ends once it is unsubscribed or its store stops, after any buffered items are
/// yielded.
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    /// A subscription that never yields anything.
    ///
    /// Its identifier is never added to a live set, so unsubscribing it is always a no-op.
    pub(super) fn closed() -> Self {
        let (_, receiver) = mpsc::channel(0);
        Self {
            id: next_id(),
            receiver,
        }
    }

    /// Identifier of the subscription, unique across every store in the process.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_next_unpin(cx)
    }
}

/// The set of live subscriptions.
pub struct Subscribers<T> {
    capacity: usize,
    live: Vec<(u64, mpsc::Sender<T>)>,
}

impl<T: Clone> Subscribers<T> {
    /// Create an empty set where each subscription buffers up to `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: Vec::new(),
        }
    }

    /// Add a new subscription.
    pub fn subscribe(&mut self) -> Subscription<T> {
        let id = next_id();

        // A bounded channel holds its buffer plus one slot per sender
        let (sender, receiver) = mpsc::channel(self.capacity.saturating_sub(1));
        self.live.push((id, sender));
        Subscription { id, receiver }
    }

    /// Remove the subscription with `id`.
    ///
    /// Returns `false` if no such subscription is live.
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let Some(index) = self.live.iter().position(|(live, _)| *live == id) else {
            return false;
        };

        // Order among subscriptions is not significant
        self.live.swap_remove(index);
        true
    }

    /// Send `item` to every live subscription, waiting for room in each one's buffer.
    ///
    /// Subscriptions that were dropped by their consumer are removed. Returns the number of
    /// subscriptions `item` was delivered to.
    pub async fn broadcast(&mut self, item: T) -> usize {
        let mut index = 0;
        while index < self.live.len() {
            let (id, sender) = &mut self.live[index];
            // Waits for room in the buffer, not for the item to be received
            if sender.feed(item.clone()).await.is_err() {
                trace!(id = *id, "subscription dropped");

                // The subscription swapped into `index` has not been sent to yet
                self.live.swap_remove(index);
                continue;
            }
            index += 1;
        }
        self.live.len()
    }

    /// End every live subscription.
    ///
    /// Returns the number of subscriptions ended.
    pub fn close_all(&mut self) -> usize {
        self.live.drain(..).count()
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.live.len()
    }
}
