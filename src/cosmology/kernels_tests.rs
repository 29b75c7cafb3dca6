use approx::assert_relative_eq;
use crate::cosmology::{drift_kernel, gravkick_kernel, growth_factor_kernel, hydrokick_kernel, Cosmology};

#[test]
fn test_hubble_rate_today_is_hubble_constant() {
    // Ω_m + Ω_k + Ω_Λ = 1 at a = 1.
    let cosmology = Cosmology::new(Some(0.25), Some(0.6), Some(0.1), None);
    assert_relative_eq!(cosmology.hubble_rate(1.0), 0.1, epsilon = 1e-15);
}

#[test]
fn test_kernels_in_einstein_de_sitter() {
    let eds = Cosmology::new(Some(1.0), Some(0.0), Some(1.0), Some(5.0 / 3.0));
    let a: f64 = 0.25;
    assert_relative_eq!(drift_kernel(&eds, a), a.powf(-1.5), max_relative = 1e-14);
    assert_relative_eq!(gravkick_kernel(&eds, a), a.powf(-0.5), max_relative = 1e-14);
    assert_relative_eq!(hydrokick_kernel(&eds, a), a.powf(-1.5), max_relative = 1e-14);
    assert_relative_eq!(growth_factor_kernel(&eds, a), a.powf(1.5), max_relative = 1e-14);
}

#[test]
fn test_isothermal_hydro_kernel_matches_drift_times_a_squared() {
    // γ = 1 removes the a^(3(γ-1)) factor.
    let cosmology = Cosmology::new(None, None, None, Some(1.0));
    let a: f64 = 0.5;
    assert_relative_eq!(hydrokick_kernel(&cosmology, a), drift_kernel(&cosmology, a) * a * a, max_relative = 1e-14);
}

#[test]
fn test_kernels_positive_over_valid_range() {
    let cosmology = Cosmology::default();
    for i in 1..=100 {
        let a = i as f64 / 100.0;
        assert!(drift_kernel(&cosmology, a) > 0.0);
        assert!(gravkick_kernel(&cosmology, a) > 0.0);
        assert!(hydrokick_kernel(&cosmology, a) > 0.0);
    }
}

#[test]
fn test_cosmology_validation() {
    assert!(Cosmology::default().validate().is_ok());
    assert!(Cosmology::new(Some(-0.1), None, None, None).validate().is_err());
    assert!(Cosmology::new(None, None, Some(0.0), None).validate().is_err());
    assert!(Cosmology::new(None, None, None, Some(0.5)).validate().is_err());
    assert!(Cosmology::new(Some(f64::NAN), None, None, None).validate().is_err());
}
