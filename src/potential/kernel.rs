use crate::utils::{HighPrecision, SPLINE_SUPPORT_FACTOR};

/// Potential of a point mass seen at distance `r`, softened with a cubic spline.
///
/// `softening` is the Plummer-equivalent length ε; the spline support is
/// `h = 2.8 ε`. Beyond `h` this is the Newtonian `-mass / r`, and at `r = 0`
/// it is `-mass / ε`, which the self-potential correction removes again.
/// The result is not multiplied by the gravitational constant.
pub fn softened_potential<T: HighPrecision>(mass: T, r: T, softening: T) -> T {
    if r == T::zero() {
        return -mass / softening;
    }
    let h = softening * T::from_approx(SPLINE_SUPPORT_FACTOR);
    if r >= h {
        return -mass / r;
    }

    let c = T::from_approx;
    let u = r / h;
    let wp = if u < c(0.5) {
        c(-2.8) + u * u * (c(16.0 / 3.0) + u * u * (c(6.4) * u - c(9.6)))
    } else {
        c(-3.2) + c(1.0 / 15.0) / u + u * u * (c(32.0 / 3.0) + u * (c(-16.0) + u * (c(9.6) - c(32.0 / 15.0) * u)))
    };
    mass * wp / h
}
