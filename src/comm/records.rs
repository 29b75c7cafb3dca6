// src/comm/records.rs

use crate::utils::HighPrecision;

/// Fixed-size record that can be staged in a [`crate::comm::CommunicationBuffer`].
///
/// `SIZE` must be identical on every process; records are shipped as raw
/// bytes and decoded on the other side with the same layout.
pub trait WireRecord: Sized {
    const SIZE: usize;

    /// Writes exactly `SIZE` bytes into `out`.
    fn encode(&self, out: &mut [u8]);

    /// Reads a record from exactly `SIZE` bytes.
    fn decode(bytes: &[u8]) -> Self;
}

/// Data a remote task needs to evaluate the potential at an exported particle.
///
/// Little-endian layout, `W = T::WIDTH`:
///
/// | offset | size | field        |
/// |--------|------|--------------|
/// | 0      | 3W   | `position`   |
/// | 3W     | W    | `softening`  |
/// | 4W     | W    | `old_acc`    |
/// | 5W     | 4    | `ptype`      |
/// | 5W + 4 | 4    | reserved (0) |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityRequest<T> {
    pub position: [T; 3],
    /// Zero unless the particle carries an adaptive softening.
    pub softening: T,
    pub old_acc: T,
    pub ptype: u32,
}

impl<T: HighPrecision> WireRecord for GravityRequest<T> {
    const SIZE: usize = 5 * T::WIDTH + 8;

    fn encode(&self, out: &mut [u8]) {
        let w = T::WIDTH;
        for (k, x) in self.position.iter().enumerate() {
            x.write_le(&mut out[k * w..]);
        }
        self.softening.write_le(&mut out[3 * w..]);
        self.old_acc.write_le(&mut out[4 * w..]);
        out[5 * w..5 * w + 4].copy_from_slice(&self.ptype.to_le_bytes());
        out[5 * w + 4..5 * w + 8].fill(0);
    }

    fn decode(bytes: &[u8]) -> Self {
        let w = T::WIDTH;
        let position = [
            T::read_le(&bytes[0..]),
            T::read_le(&bytes[w..]),
            T::read_le(&bytes[2 * w..]),
        ];
        let mut ptype = [0u8; 4];
        ptype.copy_from_slice(&bytes[5 * w..5 * w + 4]);
        Self {
            position,
            softening: T::read_le(&bytes[3 * w..]),
            old_acc: T::read_le(&bytes[4 * w..]),
            ptype: u32::from_le_bytes(ptype),
        }
    }
}

/// Potential contribution computed by a remote task for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityResult<T> {
    pub potential: T,
}

impl<T: HighPrecision> WireRecord for GravityResult<T> {
    const SIZE: usize = T::WIDTH;

    fn encode(&self, out: &mut [u8]) {
        self.potential.write_le(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self { potential: T::read_le(bytes) }
    }
}
