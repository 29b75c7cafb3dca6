use crate::cosmology::{growth_factor_kernel, Cosmology};
use crate::utils::{integrate_adaptive, GravityError, QuadratureConfig};

/// Linear growth factor D(a), normalised so that D(a) = a for Einstein–de Sitter.
///
/// D(a) = 5/2 · Ω_m · H(a)/H0 · ∫₀ᵃ (a' H(a')/H0)⁻³ da'
pub fn linear_growth_factor(cosmology: &Cosmology, a: f64, config: &QuadratureConfig) -> Result<f64, GravityError> {
    cosmology.validate()?;
    if !(a > 0.0) {
        return Err(GravityError::InvalidParameter(format!("scale factor must be positive, got {}", a)));
    }
    let integral = integrate_adaptive(|x| growth_factor_kernel(cosmology, x), 0.0, a, config)?;
    let hubble_ratio = cosmology.hubble_rate(a) / cosmology.hubble;
    Ok(2.5 * cosmology.omega0 * hubble_ratio * integral.value)
}
