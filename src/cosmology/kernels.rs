//! Friedmann-equation integrands for the drift and kick tables.
//!
//! All kernels take the scale factor `a` in plain `f64`; they are only ever
//! evaluated by the quadrature.

use crate::cosmology::Cosmology;

/// Integrand of the drift factor, `1 / (H(a) a³)`.
#[inline]
pub fn drift_kernel(cosmology: &Cosmology, a: f64) -> f64 {
    1.0 / (cosmology.hubble_rate(a) * a * a * a)
}

/// Integrand of the gravitational kick factor, `1 / (H(a) a²)`.
#[inline]
pub fn gravkick_kernel(cosmology: &Cosmology, a: f64) -> f64 {
    1.0 / (cosmology.hubble_rate(a) * a * a)
}

/// Integrand of the hydrodynamical kick factor, `1 / (H(a) a^(3(γ-1)) a)`.
#[inline]
pub fn hydrokick_kernel(cosmology: &Cosmology, a: f64) -> f64 {
    1.0 / (cosmology.hubble_rate(a) * a.powf(3.0 * (cosmology.gamma - 1.0)) * a)
}

/// Integrand of the linear growth factor, `(sqrt(a) / sqrt(Ω_m + Ω_k a + Ω_Λ a³))³`.
#[inline]
pub fn growth_factor_kernel(cosmology: &Cosmology, a: f64) -> f64 {
    let s = (cosmology.omega0 + cosmology.curvature() * a + cosmology.omega_lambda * a * a * a).sqrt();
    (a.sqrt() / s).powi(3)
}
