use approx::assert_relative_eq;
use std::cell::Cell;
use std::f64::consts::PI;
use crate::utils::{integrate_adaptive, GravityError, QuadratureConfig};

#[test]
fn test_integrate_polynomial_is_exact() {
    // A 15-point Kronrod rule integrates low-order polynomials exactly.
    let integral = integrate_adaptive(|x| 3.0 * x * x + 2.0 * x + 1.0, 0.0, 2.0, &QuadratureConfig::default())
        .expect("Polynomial should integrate");
    assert_relative_eq!(integral.value, 8.0 + 4.0 + 2.0, epsilon = 1e-12);
    assert_eq!(integral.subintervals, 1);
}

#[test]
fn test_integrate_sine() {
    let integral = integrate_adaptive(|x: f64| x.sin(), 0.0, PI, &QuadratureConfig::default())
        .expect("sin should integrate");
    assert_relative_eq!(integral.value, 2.0, epsilon = 1e-10);
    assert!(integral.abs_error <= 1e-8);
}

#[test]
fn test_integrate_reversed_bounds_changes_sign() {
    let config = QuadratureConfig::default();
    let forward = integrate_adaptive(|x: f64| x.exp(), 0.0, 1.0, &config).expect("exp forward");
    let backward = integrate_adaptive(|x: f64| x.exp(), 1.0, 0.0, &config).expect("exp backward");
    assert_relative_eq!(forward.value, std::f64::consts::E - 1.0, epsilon = 1e-10);
    assert_relative_eq!(backward.value, -forward.value, epsilon = 1e-12);
}

#[test]
fn test_integrate_empty_interval() {
    let integral = integrate_adaptive(|x: f64| x, 3.0, 3.0, &QuadratureConfig::default())
        .expect("Empty interval");
    assert_eq!(integral.value, 0.0);
}

#[test]
fn test_integrate_peaked_function_needs_subdivision() {
    // Narrow Lorentzian centred at 0.5.
    let width = 1e-3;
    let f = move |x: f64| width / ((x - 0.5).powi(2) + width * width);
    let integral = integrate_adaptive(f, 0.0, 1.0, &QuadratureConfig::default())
        .expect("Lorentzian should integrate");
    let expected = (0.5 / width).atan() * 2.0;
    assert_relative_eq!(integral.value, expected, epsilon = 1e-7);
    assert!(integral.subintervals > 1);
}

#[test]
fn test_small_workspace_reports_non_convergence() {
    let config = QuadratureConfig { abs_tolerance: 1e-12, rel_tolerance: 0.0, workspace: 2 };
    let result = integrate_adaptive(|x: f64| 1.0 / x.sqrt(), 0.0, 1.0, &config);
    match result {
        Err(GravityError::QuadratureDidNotConverge { subintervals, .. }) => assert!(subintervals <= 2),
        other => panic!("Expected non-convergence, got {:?}", other),
    }
}

#[test]
fn test_non_finite_bounds_rejected() {
    let result = integrate_adaptive(|x: f64| x, 0.0, f64::INFINITY, &QuadratureConfig::default());
    assert!(matches!(result, Err(GravityError::InvalidParameter(_))));
}

#[test]
fn test_each_bisection_evaluates_only_the_new_halves() {
    let calls = Cell::new(0usize);
    let f = |x: f64| {
        calls.set(calls.get() + 1);
        x.sqrt()
    };
    let integral = integrate_adaptive(f, 0.0, 1.0, &QuadratureConfig::default()).expect("sqrt should integrate");

    assert_relative_eq!(integral.value, 2.0 / 3.0, epsilon = 1e-8);
    assert!(integral.abs_error <= 1e-8);
    assert!(integral.subintervals > 1);
    // 15 nodes for the whole interval, then 2 x 15 per bisection.
    assert_eq!(calls.get(), 30 * integral.subintervals - 15);
}
