// src/comm/communicator.rs

use crate::utils::GravityError;

/// Distinguishes traffic classes so that messages of different phases never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// All-gather collectives (topology check, send counts, done counts).
    Collective,
    /// Export records going out for remote evaluation.
    PotentialRequest,
    /// Evaluated results coming back.
    PotentialResult,
}

/// Blocking message-passing transport between cooperating tasks.
///
/// Every call is a rendezvous: it returns only once the matching partner(s)
/// have made the corresponding call. There is no timeout; a stalled peer
/// blocks the caller indefinitely.
pub trait Communicator {
    /// This task's id in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of cooperating tasks.
    fn size(&self) -> usize;

    /// Gathers `local` from every task; the result is the concatenation of all
    /// rows in rank order. Every task must pass a row of the same length.
    fn all_gather(&self, local: &[u64]) -> Result<Vec<u64>, GravityError>;

    /// Sends `send` to `partner` and fills `recv` with the partner's message
    /// carrying the same tag. `recv.len()` must equal the incoming length.
    fn sendrecv(&self, partner: usize, tag: MessageTag, send: &[u8], recv: &mut [u8]) -> Result<(), GravityError>;
}

/// Transport for a run consisting of a single task.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather(&self, local: &[u64]) -> Result<Vec<u64>, GravityError> {
        Ok(local.to_vec())
    }

    fn sendrecv(&self, partner: usize, _tag: MessageTag, send: &[u8], recv: &mut [u8]) -> Result<(), GravityError> {
        if partner != 0 {
            return Err(GravityError::Transport {
                partner,
                reason: "single-process run has no other tasks".to_string(),
            });
        }
        if send.len() != recv.len() {
            return Err(GravityError::BufferLengthMismatch { expected: recv.len(), actual: send.len() });
        }
        recv.copy_from_slice(send);
        Ok(())
    }
}

/// NTask × NTask table of export counts; row `from` lists what `from` sends to each task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCounts {
    tasks: usize,
    counts: Vec<usize>,
}

impl SendCounts {
    /// Builds the table by all-gathering this task's per-destination counts.
    pub fn exchange<C: Communicator + ?Sized>(comm: &C, local: &[usize]) -> Result<Self, GravityError> {
        let row: Vec<u64> = local.iter().map(|&c| c as u64).collect();
        let gathered = comm.all_gather(&row)?;
        Self::from_rows(comm.size(), gathered.into_iter().map(|c| c as usize).collect())
    }

    pub fn from_rows(tasks: usize, counts: Vec<usize>) -> Result<Self, GravityError> {
        if counts.len() != tasks * tasks {
            return Err(GravityError::BufferLengthMismatch { expected: tasks * tasks, actual: counts.len() });
        }
        Ok(Self { tasks, counts })
    }

    pub fn tasks(&self) -> usize {
        self.tasks
    }

    /// Number of records `from` sends to `to`.
    pub fn get(&self, from: usize, to: usize) -> usize {
        self.counts[from * self.tasks + to]
    }
}
