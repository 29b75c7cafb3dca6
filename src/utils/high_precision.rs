use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Scalar type used for times, positions and accumulated potentials.
///
/// Internal state and accumulation stay in `Self`; every call into a
/// lower-precision routine (the quadrature, `powf` on parameters) goes
/// through [`HighPrecision::to_approx`] and [`HighPrecision::from_approx`].
/// The fixed `WIDTH` and little-endian encoding make the type usable in wire
/// records shared between processes.
pub trait HighPrecision:
    Copy
    + Debug
    + Default
    + PartialOrd
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Encoded size in bytes.
    const WIDTH: usize;

    fn zero() -> Self;
    fn one() -> Self;

    /// Lossless for every value representable as `f64`.
    fn from_approx(value: f64) -> Self;

    /// Lossy conversion to ordinary floating point.
    fn to_approx(self) -> f64;

    fn from_int(value: i64) -> Self;

    /// Truncation toward zero, saturating at the `i64` range.
    fn trunc_to_int(self) -> i64;

    fn sqrt(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn abs(self) -> Self;
    fn powf(self, exponent: Self) -> Self;

    fn is_finite(self) -> bool;

    /// Writes exactly `WIDTH` bytes into the front of `out`.
    fn write_le(self, out: &mut [u8]);

    /// Reads exactly `WIDTH` bytes from the front of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;

    fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }
}

impl HighPrecision for f64 {
    const WIDTH: usize = 8;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn from_approx(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_approx(self) -> f64 {
        self
    }

    #[inline]
    fn from_int(value: i64) -> Self {
        value as f64
    }

    #[inline]
    fn trunc_to_int(self) -> i64 {
        self as i64
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn exp(self) -> Self {
        f64::exp(self)
    }

    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }

    #[inline]
    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    fn write_le(self, out: &mut [u8]) {
        out[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(raw)
    }
}
