use std::ops::Range;
use crate::comm::SendCounts;
use crate::utils::GravityError;

/// Pairwise exchange plan over the levels `1 .. 2^ceil(log2 NTask)`.
///
/// At level `l` task `r` pairs with `r XOR l`; pairs whose partner falls
/// outside `0..NTask` sit the level out. Consecutive levels are merged into
/// one batch while no task would receive `capacity` or more records, so
/// every task runs the same sequence of batches from the shared count table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypercubeSchedule {
    tasks: usize,
    levels: usize,
    next_level: usize,
}

/// Consecutive hypercube levels exchanged before one remote evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelBatch {
    pub levels: Range<usize>,
}

/// One pairwise swap of a batch as seen from a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub level: usize,
    pub partner: usize,
    /// First import slot filled by this swap.
    pub offset: usize,
    /// Records received from `partner`.
    pub recv: usize,
    /// Records sent to `partner`.
    pub send: usize,
}

impl HypercubeSchedule {
    pub fn new(tasks: usize) -> Self {
        Self {
            tasks,
            levels: tasks.max(1).next_power_of_two(),
            next_level: 1,
        }
    }

    /// One past the highest level, `2^ceil(log2 NTask)`.
    pub fn level_limit(&self) -> usize {
        self.levels
    }

    pub fn is_finished(&self) -> bool {
        self.next_level >= self.levels
    }

    /// Exchange partner of `rank` at `level`, if it exists.
    pub fn partner(&self, rank: usize, level: usize) -> Option<usize> {
        let partner = rank ^ level;
        (partner < self.tasks && partner != rank).then_some(partner)
    }

    /// Advances to the next batch of levels.
    ///
    /// Returns `Ok(None)` once every level has been scheduled, and
    /// `GravityError::CapacityExceeded` when even a single level would fill
    /// some task's import buffer.
    pub fn next_batch(&mut self, counts: &SendCounts, capacity: usize) -> Result<Option<LevelBatch>, GravityError> {
        if self.is_finished() {
            return Ok(None);
        }

        let start = self.next_level;
        let mut fill = vec![0usize; self.tasks];
        let mut end = start;
        let mut maxfill = 0;
        while end < self.levels {
            maxfill = (0..self.tasks)
                .filter_map(|j| self.partner(j, end).map(|p| fill[j] + counts.get(p, j)))
                .max()
                .unwrap_or(0);
            if maxfill >= capacity {
                break;
            }
            for (j, f) in fill.iter_mut().enumerate() {
                if let Some(p) = self.partner(j, end) {
                    *f += counts.get(p, j);
                }
            }
            end += 1;
        }

        if end == start {
            return Err(GravityError::CapacityExceeded { level: start, required: maxfill, capacity });
        }
        self.next_level = end;
        Ok(Some(LevelBatch { levels: start..end }))
    }
}

impl LevelBatch {
    /// Swaps `rank` takes part in, with import offsets in level order.
    ///
    /// Pairs with no traffic in either direction are left out, but their
    /// (empty) share still counts towards the offsets.
    pub fn placements(&self, counts: &SendCounts, rank: usize) -> Vec<Placement> {
        let mut offset = 0;
        let mut placements = Vec::new();
        for level in self.levels.clone() {
            let partner = rank ^ level;
            if partner >= counts.tasks() || partner == rank {
                continue;
            }
            let recv = counts.get(partner, rank);
            let send = counts.get(rank, partner);
            if recv > 0 || send > 0 {
                placements.push(Placement { level, partner, offset, recv, send });
            }
            offset += recv;
        }
        placements
    }

    /// Records `rank` imports during this batch.
    pub fn import_total(&self, counts: &SendCounts, rank: usize) -> usize {
        self.levels
            .clone()
            .map(|level| rank ^ level)
            .filter(|&partner| partner < counts.tasks() && partner != rank)
            .map(|partner| counts.get(partner, rank))
            .sum()
    }
}
