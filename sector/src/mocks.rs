//! Mock implementations for testing.

use crate::Sealed;
use futures::{channel::mpsc, io::AsyncRead};
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};
use thiserror::Error;

/// Status reported by the mock [Sealer].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Pending,
    Sealed,
    Failed,
}

/// Errors returned by the mock [Sealer].
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown sector: {0}")]
    UnknownSector(u64),
    #[error("piece rejected")]
    Rejected,
    #[error("unable to read piece: {0}")]
    Read(#[from] io::Error),
}

/// A piece ingested by the mock [Sealer].
#[derive(Clone, Debug)]
pub struct Piece {
    pub reference: String,
    pub size: u64,
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub sector: u64,
}

struct State {
    next: u64,
    reject: bool,
    pieces: Vec<Piece>,
    statuses: HashMap<u64, Status>,
    sender: mpsc::UnboundedSender<Sealed<u64, Status>>,
    completions: Option<mpsc::UnboundedReceiver<Sealed<u64, Status>>>,
}

/// A mock [crate::Sealer] that assigns sequential sectors and seals them on demand.
#[derive(Clone)]
pub struct Sealer {
    state: Arc<Mutex<State>>,
}

impl Sealer {
    /// Create a new [Sealer].
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded();
        Self {
            state: Arc::new(Mutex::new(State {
                next: 0,
                reject: false,
                pieces: Vec::new(),
                statuses: HashMap::new(),
                sender,
                completions: Some(receiver),
            })),
        }
    }

    /// Assign `sector` to the next ingested piece.
    pub fn set_next(&self, sector: u64) {
        self.state.lock().unwrap().next = sector;
    }

    /// Reject (or stop rejecting) all ingested pieces.
    pub fn reject(&self, reject: bool) {
        self.state.lock().unwrap().reject = reject;
    }

    /// Return all pieces ingested so far.
    pub fn pieces(&self) -> Vec<Piece> {
        self.state.lock().unwrap().pieces.clone()
    }

    /// Update the status of `sector` and report the completion.
    pub fn seal(&self, sector: u64, status: Status) {
        let mut state = self.state.lock().unwrap();
        state.statuses.insert(sector, status.clone());
        let _ = state.sender.unbounded_send(Sealed { sector, status });
    }

    /// End the completion stream.
    pub fn close(&self) {
        self.state.lock().unwrap().sender.close_channel();
    }
}

impl crate::Sealer for Sealer {
    type SectorId = u64;
    type Status = Status;
    type Error = Error;
    type Completions = mpsc::UnboundedReceiver<Sealed<u64, Status>>;

    async fn add_piece(&mut self, reference: &str, size: u64, path: &Path) -> Result<u64, Error> {
        let data = fs::read(path)?;
        let mut state = self.state.lock().unwrap();
        if state.reject {
            return Err(Error::Rejected);
        }
        let sector = state.next;
        state.next += 1;
        state.statuses.insert(sector, Status::Pending);
        state.pieces.push(Piece {
            reference: reference.to_string(),
            size,
            path: path.to_path_buf(),
            data,
            sector,
        });
        Ok(sector)
    }

    async fn seal_status(&mut self, sector: &u64) -> Result<Status, Error> {
        self.state
            .lock()
            .unwrap()
            .statuses
            .get(sector)
            .cloned()
            .ok_or(Error::UnknownSector(*sector))
    }

    fn completions(&mut self) -> Self::Completions {
        self.state
            .lock()
            .unwrap()
            .completions
            .take()
            .expect("completions already taken")
    }
}

/// A reader that yields its data once and then fails.
pub struct FailingReader {
    data: Vec<u8>,
    served: bool,
}

impl FailingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            served: false,
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        if self.served {
            return Poll::Ready(Err(io::Error::other("reader failed")));
        }
        let n = self.data.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.served = true;
        Poll::Ready(Ok(n))
    }
}
