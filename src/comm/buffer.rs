use std::marker::PhantomData;
use std::ops::Range;
use crate::comm::WireRecord;
use crate::utils::GravityError;

/// Fixed-capacity, slot-addressed staging area for records crossing task
/// boundaries.
///
/// Slots are `R::SIZE` bytes wide and stored back to back, so a range of
/// slots is a contiguous byte range that can be handed to the transport
/// as-is. The capacity never changes after construction.
#[derive(Debug, Clone)]
pub struct CommunicationBuffer<R> {
    bytes: Vec<u8>,
    capacity: usize,
    _record: PhantomData<R>,
}

impl<R: WireRecord> CommunicationBuffer<R> {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity * R::SIZE],
            capacity,
            _record: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record_size(&self) -> usize {
        R::SIZE
    }

    pub fn write(&mut self, slot: usize, record: &R) -> Result<(), GravityError> {
        let range = self.byte_range(slot..slot + 1)?;
        record.encode(&mut self.bytes[range]);
        Ok(())
    }

    pub fn read(&self, slot: usize) -> Result<R, GravityError> {
        let range = self.byte_range(slot..slot + 1)?;
        Ok(R::decode(&self.bytes[range]))
    }

    /// Copies slot `src` of `other` into slot `dst` of `self` without decoding.
    pub fn copy_slot_from(&mut self, dst: usize, other: &CommunicationBuffer<R>, src: usize) -> Result<(), GravityError> {
        let to = self.byte_range(dst..dst + 1)?;
        let from = other.byte_range(src..src + 1)?;
        self.bytes[to].copy_from_slice(&other.bytes[from]);
        Ok(())
    }

    /// Contiguous raw view of the given slots.
    pub fn slots(&self, slots: Range<usize>) -> Result<&[u8], GravityError> {
        let range = self.byte_range(slots)?;
        Ok(&self.bytes[range])
    }

    /// Mutable raw view of the given slots, for receiving bulk transfers.
    pub fn slots_mut(&mut self, slots: Range<usize>) -> Result<&mut [u8], GravityError> {
        let range = self.byte_range(slots)?;
        Ok(&mut self.bytes[range])
    }

    fn byte_range(&self, slots: Range<usize>) -> Result<Range<usize>, GravityError> {
        if slots.start > slots.end || slots.end > self.capacity {
            return Err(GravityError::SlotOutOfRange {
                slot: slots.end.saturating_sub(1).max(slots.start),
                capacity: self.capacity,
            });
        }
        Ok(slots.start * R::SIZE..slots.end * R::SIZE)
    }
}
