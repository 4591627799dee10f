use futures::channel::oneshot;
use std::{collections::HashMap, hash::Hash};

/// Tracks sectors with a pending completion and the callers waiting on them.
///
/// A sector is tracked from [Waiters::ensure] until its first completion is fired. Any number of
/// callers may wait on a tracked sector and are all released together. Callers waiting on an
/// untracked sector (never added or already completed) are released immediately.
pub struct Waiters<I> {
    pending: HashMap<I, Vec<oneshot::Sender<()>>>,
}

impl<I: Eq + Hash> Waiters<I> {
    /// Create an empty set of waiters.
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Track `sector`, if it is not already tracked.
    ///
    /// Returns `true` if the sector was not tracked before.
    pub fn ensure(&mut self, sector: I) -> bool {
        let mut created = false;
        self.pending.entry(sector).or_insert_with(|| {
            created = true;
            Vec::new()
        });
        created
    }

    /// Register `responder` to be released once `sector` completes.
    ///
    /// If `sector` is not tracked, `responder` is released immediately and `false` is returned.
    pub fn wait(&mut self, sector: &I, responder: oneshot::Sender<()>) -> bool {
        let Some(responders) = self.pending.get_mut(sector) else {
            let _ = responder.send(());
            return false;
        };
        responders.push(responder);
        true
    }

    /// Release all callers waiting on `sector` and stop tracking it.
    ///
    /// Returns the number of released callers, or `None` if `sector` was not tracked.
    pub fn fire(&mut self, sector: &I) -> Option<usize> {
        let responders = self.pending.remove(sector)?;
        Some(release(responders))
    }

    /// Release every waiting caller and stop tracking all sectors.
    ///
    /// Returns the number of released callers.
    pub fn release_all(&mut self) -> usize {
        self.pending.drain().map(|(_, responders)| release(responders)).sum()
    }

    /// Forget callers that stopped waiting.
    ///
    /// Sectors stay tracked even if nobody is waiting on them anymore. Returns the number of
    /// forgotten callers.
    pub fn cleanup(&mut self) -> usize {
        let mut dropped = 0;
        for responders in self.pending.values_mut() {
            let before = responders.len();
            responders.retain(|responder| !responder.is_canceled());
            dropped += before - responders.len();
        }
        dropped
    }

    /// Number of tracked sectors.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of waiting callers.
    pub fn waiting(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }
}

impl<I: Eq + Hash> Default for Waiters<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Release responders, ignoring the ones that stopped waiting.
fn release(responders: Vec<oneshot::Sender<()>>) -> usize {
    responders
        .into_iter()
        .filter_map(|responder| responder.send(()).ok())
        .count()
}
