//! In-process process group: every rank runs on its own OS thread with its
//! own private state, and ranks talk only through channels.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::matrix::Element;

use super::{Communicator, MessageKind};

/// How often a blocked receive checks whether the group was aborted
const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Envelope {
    source: usize,
    kind: MessageKind,
    payload: Vec<Element>,
}

/// Endpoint of one rank in a group created by [`LocalCommunicator::group`].
///
/// A blocked receive fails instead of waiting forever once the group is
/// aborted (some rank failed) or every peer has hung up. A rank holds no
/// sender to itself.
#[derive(Debug)]
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    peers: Vec<Option<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
    /// Messages that arrived before anyone asked for them
    unmatched: RefCell<VecDeque<Envelope>>,
    aborted: Arc<AtomicBool>,
    epoch: Instant,
}

impl LocalCommunicator {
    /// Create the fully connected endpoints of a `size`-rank group, indexed
    /// by rank.
    pub fn group(size: usize) -> Vec<LocalCommunicator> {
        let epoch = Instant::now();
        let aborted = Arc::new(AtomicBool::new(false));
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| channel()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalCommunicator {
                rank,
                size,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(dest, sender)| (dest != rank).then(|| sender.clone()))
                    .collect(),
                inbox,
                unmatched: RefCell::new(VecDeque::new()),
                aborted: Arc::clone(&aborted),
                epoch,
            })
            .collect()
    }

    /// Fail every receive in the group that is blocked now or blocks later
    /// without a matching message.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn take_unmatched(&self, source: usize, kind: MessageKind) -> Option<Envelope> {
        let mut unmatched = self.unmatched.borrow_mut();
        let position = unmatched
            .iter()
            .position(|env| env.source == source && env.kind == kind)?;
        unmatched.remove(position)
    }

    fn next_matching(&self, source: usize, kind: MessageKind) -> Result<Envelope> {
        if let Some(envelope) = self.take_unmatched(source, kind) {
            return Ok(envelope);
        }
        loop {
            let envelope = match self.inbox.recv_timeout(ABORT_POLL_INTERVAL) {
                Ok(envelope) => envelope,
                Err(RecvTimeoutError::Timeout) if self.is_aborted() => {
                    return Err(Error::Transport(format!(
                        "rank {} waiting for {} from rank {}, but the group was aborted",
                        self.rank, kind, source
                    )))
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Transport(format!(
                        "rank {} waiting for {} from rank {}, but every peer has exited",
                        self.rank, kind, source
                    )))
                }
            };
            if envelope.source == source && envelope.kind == kind {
                return Ok(envelope);
            }
            self.unmatched.borrow_mut().push_back(envelope);
        }
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, kind: MessageKind, payload: &[Element]) -> Result<()> {
        let sender = match self.peers.get(dest) {
            Some(Some(sender)) => sender,
            Some(None) => {
                return Err(Error::Transport(format!(
                    "rank {} attempted to send {} to itself",
                    self.rank, kind
                )))
            }
            None => {
                return Err(Error::Transport(format!(
                    "rank {} is outside a group of {}",
                    dest, self.size
                )))
            }
        };
        trace!("rank {} -> rank {}: {} ({} elements)", self.rank, dest, kind, payload.len());
        sender
            .send(Envelope {
                source: self.rank,
                kind,
                payload: payload.to_vec(),
            })
            .map_err(|_| Error::Transport(format!("rank {} has exited", dest)))
    }

    fn receive_into(&self, source: usize, kind: MessageKind, buffer: &mut [Element]) -> Result<()> {
        if source >= self.size || source == self.rank {
            return Err(Error::Transport(format!(
                "rank {} cannot receive from rank {}",
                self.rank, source
            )));
        }
        let envelope = self.next_matching(source, kind)?;
        if envelope.payload.len() != buffer.len() {
            return Err(Error::Transport(format!(
                "rank {} expected {} of {} elements from rank {}, got {}",
                self.rank,
                kind,
                buffer.len(),
                source,
                envelope.payload.len()
            )));
        }
        trace!("rank {} <- rank {}: {} ({} elements)", self.rank, source, kind, buffer.len());
        buffer.copy_from_slice(&envelope.payload);
        Ok(())
    }

    fn wall_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Bootstrap a `size`-rank group, run `rank_main` on every rank concurrently
/// and tear the group down once all ranks have returned.
///
/// Results are indexed by rank. A rank that returns an error or panics
/// aborts the group, so peers blocked on it fail with a transport error. A
/// panicking rank is itself reported as a transport failure.
pub fn launch<T, F>(size: usize, rank_main: F) -> Result<Vec<Result<T>>>
where
    T: Send,
    F: Fn(LocalCommunicator) -> Result<T> + Sync,
{
    if size == 0 {
        return Err(Error::Configuration(
            "a process group needs at least one process".to_string(),
        ));
    }
    debug!("launching local process group of {} ranks", size);

    let rank_main = &rank_main;
    thread::scope(|scope| -> Result<Vec<Result<T>>> {
        let mut handles = Vec::with_capacity(size);
        for comm in LocalCommunicator::group(size) {
            let rank = comm.rank();
            let guard = AbortOnFailure {
                aborted: Arc::clone(&comm.aborted),
                armed: true,
            };
            let handle = thread::Builder::new()
                .name(format!("rank-{}", rank))
                .spawn_scoped(scope, move || {
                    let mut guard = guard;
                    let result = rank_main(comm);
                    guard.armed = result.is_err();
                    result
                })?;
            handles.push(handle);
        }

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle.join().unwrap_or_else(|_| {
                    warn!("rank {} aborted", rank);
                    Err(Error::Transport(format!("rank {} aborted", rank)))
                })
            })
            .collect())
    })
}

/// Aborts the group when dropped armed, which covers both an error return
/// and unwinding out of a panicking rank.
struct AbortOnFailure {
    aborted: Arc<AtomicBool>,
    armed: bool,
}

impl Drop for AbortOnFailure {
    fn drop(&mut self) {
        if self.armed {
            self.aborted.store(true, Ordering::SeqCst);
        }
    }
}
