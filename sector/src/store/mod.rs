//! Wait on and subscribe to the completions of a [Sealer](crate::Sealer).
//!
//! # Overview
//!
//! The core of the module is the [Dispatcher]. It is the only reader of the [Sealer](crate::Sealer)'s
//! completions and is responsible for:
//! - Releasing callers waiting on a specific sector
//! - Forwarding every completion to all live subscriptions
//!
//! The [Store] is used to make requests. It stages pieces in temporary files, hands them to the
//! [Sealer](crate::Sealer), and tracks the completion of the resulting sectors. The [Store] and the
//! [Dispatcher] share their state behind a single lock, so every request is answered without
//! waiting on the [Dispatcher], even before it is started.
//!
//! # Details
//!
//! A sector is tracked from the moment it is returned by [Store::add_piece] until its first
//! completion. Any number of callers may [Store::wait_seal] on a tracked sector: all of them are
//! released by that completion and then query the [Sealer](crate::Sealer) for the sector's status.
//! Waiting on a sector that is not tracked queries its status immediately, so waiting on a sector
//! that already completed never blocks.
//!
//! Subscriptions receive every completion reported after they were created, in the order the
//! [Sealer](crate::Sealer) reported them. Each subscription buffers a fixed number of completions.
//! When a buffer is full, the [Dispatcher] waits for the subscriber to catch up, stalling every
//! other subscriber and waiter in the meantime.
//!
//! Waiters on a sector are always released before any subscriber observes its completion.
//!
//! # Shutdown
//!
//! [Store::stop] stops the [Dispatcher] (as does dropping every handle to the [Store]). On stop,
//! every subscription ends and every waiter is released.

mod config;
pub use config::Config;
mod dispatcher;
pub use dispatcher::Dispatcher;
mod ingress;
pub use ingress::Store;
mod metrics;
mod state;
mod subscribers;
pub use subscribers::Subscription;
mod temp;
mod waiters;

use thiserror::Error;

/// Errors that can occur when interacting with a [Store].
#[derive(Error, Debug)]
pub enum Error {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("sealer failure: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("canceled")]
    Canceled,
}

impl Error {
    pub(crate) fn engine(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Engine(Box::new(err))
    }
}
