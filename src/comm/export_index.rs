use crate::utils::GravityError;

/// Bookkeeping for one export record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportIndexEntry {
    /// Task the record is sent to.
    pub task: usize,
    /// Index of the originating local particle.
    pub index: usize,
    /// Slot of the record in the unsorted staging buffer.
    pub sort_index: usize,
}

/// Bounded table of export entries, sortable into contiguous per-task runs.
#[derive(Debug, Clone)]
pub struct ExportIndex {
    entries: Vec<ExportIndexEntry>,
    capacity: usize,
}

impl ExportIndex {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), capacity }
    }

    /// Appends an entry whose `sort_index` is the current length.
    pub fn push(&mut self, task: usize, index: usize) -> Result<usize, GravityError> {
        let slot = self.entries.len();
        if slot >= self.capacity {
            return Err(GravityError::SlotOutOfRange { slot, capacity: self.capacity });
        }
        self.entries.push(ExportIndexEntry { task, index, sort_index: slot });
        Ok(slot)
    }

    /// Orders entries by destination task, then by staging slot.
    pub fn sort_by_destination(&mut self) {
        self.entries.sort_unstable_by_key(|e| (e.task, e.sort_index));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[ExportIndexEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&ExportIndexEntry> {
        self.entries.get(position)
    }

    /// Offset of each task's run in the sorted table, given per-task counts.
    pub fn offsets(counts: &[usize]) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(counts.len());
        let mut running = 0;
        for &count in counts {
            offsets.push(running);
            running += count;
        }
        offsets
    }
}
