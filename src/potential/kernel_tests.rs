use approx::assert_relative_eq;
use crate::potential::softened_potential;

const EPS: f64 = 0.1;
const H: f64 = 2.8 * EPS;

#[test]
fn test_zero_separation_gives_plummer_depth() {
    assert_eq!(softened_potential(2.0, 0.0, EPS), -2.0 / EPS);
}

#[test]
fn test_newtonian_beyond_support() {
    for r in [H, 1.5 * H, 10.0, 1e4] {
        assert_eq!(softened_potential(3.0, r, EPS), -3.0 / r, "r = {}", r);
    }
}

#[test]
fn test_spline_is_continuous() {
    for edge in [0.5 * H, H] {
        let below = softened_potential(1.0, edge * (1.0 - 1e-10), EPS);
        let above = softened_potential(1.0, edge * (1.0 + 1e-10), EPS);
        assert_relative_eq!(below, above, epsilon = 1e-7);
    }
    let near_zero = softened_potential(1.0, 1e-9, EPS);
    assert_relative_eq!(near_zero, -1.0 / EPS, epsilon = 1e-6);
}

#[test]
fn test_softened_potential_is_shallower_than_newtonian() {
    let mut previous = softened_potential(1.0, 0.0, EPS);
    for step in 1..100 {
        let r = H * step as f64 / 100.0;
        let phi = softened_potential(1.0, r, EPS);
        assert!(phi > -1.0 / r, "r = {}: {} not above {}", r, phi, -1.0 / r);
        assert!(phi >= previous, "potential must rise with distance at r = {}", r);
        previous = phi;
    }
}

#[test]
fn test_scales_linearly_with_mass() {
    let r = 0.37 * H;
    assert_relative_eq!(softened_potential(4.0, r, EPS), 4.0 * softened_potential(1.0, r, EPS), max_relative = 1e-14);
}
