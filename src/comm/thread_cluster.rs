//! In-process transport: one thread per task, connected by mpsc channels.
//!
//! Used to run multi-task scenarios inside a single process. Each task owns
//! one inbox; messages are matched on `(source, tag)` and anything that
//! arrives early is parked until the matching receive is posted, so
//! per-pair, per-tag ordering is FIFO.
//!
//! When a task started by [`ThreadCluster::run`] returns, its endpoint tells
//! every peer. A receive from a task that has exited fails, and once any task
//! has failed every pending receive on the other tasks fails too.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use log::{debug, trace};
use crate::comm::{Communicator, MessageTag};
use crate::utils::GravityError;

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: MessageTag,
    payload: Vec<u8>,
}

#[derive(Debug)]
enum Packet {
    Message(Envelope),
    /// The sending task has returned; `failed` when it returned an error or panicked.
    Exit { source: usize, failed: bool },
}

/// Endpoint of one task in a [`ThreadCluster`].
pub struct ThreadCommunicator {
    rank: usize,
    /// One sender per peer; `None` at the own rank, whose messages go straight to `parked`.
    outboxes: Vec<Option<Sender<Packet>>>,
    inbox: Receiver<Packet>,
    parked: RefCell<VecDeque<Envelope>>,
    exited: RefCell<Vec<bool>>,
    failed: Cell<Option<usize>>,
}

/// Factory for a fully connected set of in-process tasks.
pub struct ThreadCluster;

impl ThreadCluster {
    /// Creates `size` connected endpoints, one per task.
    ///
    /// Endpoints used outside [`ThreadCluster::run`] only notice a peer
    /// leaving once every peer has dropped its endpoint.
    pub fn endpoints(size: usize) -> Vec<ThreadCommunicator> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| channel::<Packet>()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadCommunicator {
                rank,
                outboxes: senders
                    .iter()
                    .enumerate()
                    .map(|(target, sender)| (target != rank).then(|| sender.clone()))
                    .collect(),
                inbox,
                parked: RefCell::new(VecDeque::new()),
                exited: RefCell::new(vec![false; size]),
                failed: Cell::new(None),
            })
            .collect()
    }

    /// Runs `task` once per rank on its own thread and returns the results in rank order.
    ///
    /// A task that returns an error or panics releases peers blocked on it
    /// with `GravityError::Transport`.
    ///
    /// # Example
    /// ```
    /// use rs_gravity::comm::{Communicator, ThreadCluster};
    ///
    /// let sums = ThreadCluster::run(3, |comm| {
    ///     let all = comm.all_gather(&[comm.rank() as u64])?;
    ///     Ok(all.iter().sum::<u64>())
    /// });
    /// assert!(sums.iter().all(|s| *s == Ok(3)));
    /// ```
    pub fn run<F, R>(size: usize, task: F) -> Vec<Result<R, GravityError>>
    where
        F: Fn(&ThreadCommunicator) -> Result<R, GravityError> + Sync,
        R: Send,
    {
        let endpoints = Self::endpoints(size);
        let task = &task;
        thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|comm| {
                    scope.spawn(move || {
                        let result = catch_unwind(AssertUnwindSafe(|| task(&comm))).unwrap_or_else(|_| {
                            Err(GravityError::Transport { partner: comm.rank, reason: "task panicked".to_string() })
                        });
                        comm.leave(result.is_err());
                        result
                    })
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(GravityError::Transport { partner: rank, reason: "task panicked".to_string() })
                    })
                })
                .collect()
        })
    }
}

impl ThreadCommunicator {
    fn post(&self, target: usize, tag: MessageTag, payload: Vec<u8>) -> Result<(), GravityError> {
        let outbox = self.outboxes.get(target).ok_or_else(|| GravityError::Transport {
            partner: target,
            reason: format!("no such task (size {})", self.outboxes.len()),
        })?;
        let envelope = Envelope { source: self.rank, tag, payload };
        match outbox {
            Some(sender) => sender
                .send(Packet::Message(envelope))
                .map_err(|_| GravityError::Transport { partner: target, reason: "inbox closed".to_string() }),
            None => {
                self.parked.borrow_mut().push_back(envelope);
                Ok(())
            }
        }
    }

    /// Tells every peer that this task has returned.
    fn leave(&self, failed: bool) {
        if failed {
            debug!("task {}: failed, releasing peers", self.rank);
        }
        for sender in self.outboxes.iter().flatten() {
            // Peers that have already gone need no notice.
            let _ = sender.send(Packet::Exit { source: self.rank, failed });
        }
    }

    fn take_parked(&self, source: usize, tag: MessageTag) -> Option<Envelope> {
        let mut parked = self.parked.borrow_mut();
        let pos = parked.iter().position(|e| e.source == source && e.tag == tag)?;
        parked.remove(pos)
    }

    /// Blocks until a message from `source` with `tag` is available.
    fn wait_for(&self, source: usize, tag: MessageTag) -> Result<Vec<u8>, GravityError> {
        if let Some(envelope) = self.take_parked(source, tag) {
            return Ok(envelope.payload);
        }
        loop {
            if let Some(failed) = self.failed.get() {
                return Err(GravityError::Transport { partner: failed, reason: "task failed".to_string() });
            }
            if self.exited.borrow().get(source).copied().unwrap_or(false) {
                return Err(GravityError::Transport { partner: source, reason: "task exited".to_string() });
            }
            match self.inbox.recv() {
                Ok(Packet::Message(envelope)) => {
                    if envelope.source == source && envelope.tag == tag {
                        return Ok(envelope.payload);
                    }
                    self.parked.borrow_mut().push_back(envelope);
                }
                Ok(Packet::Exit { source: peer, failed }) => {
                    if let Some(flag) = self.exited.borrow_mut().get_mut(peer) {
                        *flag = true;
                    }
                    if failed && self.failed.get().is_none() {
                        self.failed.set(Some(peer));
                    }
                }
                Err(_) => {
                    return Err(GravityError::Transport {
                        partner: source,
                        reason: "all peers have exited".to_string(),
                    })
                }
            }
        }
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn all_gather(&self, local: &[u64]) -> Result<Vec<u64>, GravityError> {
        let payload: Vec<u8> = local.iter().flat_map(|v| v.to_le_bytes()).collect();
        for target in 0..self.size() {
            self.post(target, MessageTag::Collective, payload.clone())?;
        }

        let mut gathered = Vec::with_capacity(local.len() * self.size());
        for source in 0..self.size() {
            let bytes = self.wait_for(source, MessageTag::Collective)?;
            if bytes.len() != payload.len() {
                return Err(GravityError::BufferLengthMismatch { expected: payload.len(), actual: bytes.len() });
            }
            gathered.extend(bytes.chunks_exact(8).map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                u64::from_le_bytes(raw)
            }));
        }
        Ok(gathered)
    }

    fn sendrecv(&self, partner: usize, tag: MessageTag, send: &[u8], recv: &mut [u8]) -> Result<(), GravityError> {
        trace!("task {}: sendrecv {:?} with task {} ({} out, {} in)", self.rank, tag, partner, send.len(), recv.len());
        self.post(partner, tag, send.to_vec())?;
        let incoming = self.wait_for(partner, tag)?;
        if incoming.len() != recv.len() {
            return Err(GravityError::BufferLengthMismatch { expected: recv.len(), actual: incoming.len() });
        }
        recv.copy_from_slice(&incoming);
        Ok(())
    }
}
