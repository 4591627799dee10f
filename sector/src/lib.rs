//! Coordinate sealing jobs with the callers that observe them.
//!
//! A [Sealer] ingests pieces, seals them into sectors, and reports each completion exactly once
//! on a single stream. The [store] module wraps a [Sealer] with everything needed to observe those
//! completions: waiting on one specific sector, or subscribing to every completion as it happens.
//!
//! # Status
//!
//! `commonware-sector` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

#![doc(
    html_logo_url = "https://commonware.xyz/imgs/rustdoc_logo.svg",
    html_favicon_url = "https://commonware.xyz/favicon.ico"
)]

use futures::Stream;
use std::{fmt::Debug, future::Future, hash::Hash, path::Path};

pub mod store;

#[cfg(test)]
mod mocks;

/// A completion reported by a [Sealer].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sealed<I, S> {
    /// The sector the completion refers to.
    pub sector: I,

    /// The status of the sector, as reported by the [Sealer].
    ///
    /// The status is never interpreted, only routed.
    pub status: S,
}

/// A [Sealer] turns pieces into sealed sectors.
///
/// The sealing algorithm, the layout of sectors, and the meaning of a status are all owned by the
/// [Sealer]. Callers only rely on the contract below.
pub trait Sealer: Clone + Send + Sync + 'static {
    /// Opaque identifier of a sector.
    ///
    /// Identifiers are never reused for different sectors within the lifetime of a process.
    type SectorId: Clone + Debug + Eq + Hash + Send + Sync + 'static;

    /// Status of a sector.
    type Status: Clone + Debug + Send + Sync + 'static;

    /// Error returned by the [Sealer].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stream of completions.
    type Completions: Stream<Item = Sealed<Self::SectorId, Self::Status>> + Send + Unpin + 'static;

    /// Ingest the piece stored at `path`, returning the sector it was assigned to.
    ///
    /// The file at `path` is only guaranteed to exist until the returned future resolves.
    fn add_piece(
        &mut self,
        reference: &str,
        size: u64,
        path: &Path,
    ) -> impl Future<Output = Result<Self::SectorId, Self::Error>> + Send;

    /// Query the current status of a sector.
    fn seal_status(
        &mut self,
        sector: &Self::SectorId,
    ) -> impl Future<Output = Result<Self::Status, Self::Error>> + Send;

    /// Return the stream of completions.
    ///
    /// This is called at most once per [Sealer].
    fn completions(&mut self) -> Self::Completions;
}
