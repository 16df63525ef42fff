use approx::assert_relative_eq;
use nalgebra::Vector3;
use neorisk::constants::PhysicalConstants;
use neorisk::distance::closest_approach;
use neorisk::ephemeris::CircularEphemeris;
use neorisk::gravity::{AccelerationField, GravityModel};
use neorisk::integrator::{propagate, propagate_state};
use neorisk::NeoRiskError;

mod common;

#[test]
fn endpoint_grid_and_exact_first_sample() {
    let constants = PhysicalConstants::default();
    let model = GravityModel::sun_earth(&constants);
    let state = common::earth_like_orbit()
        .to_state_vector(constants.mu_primary)
        .unwrap();
    // Put the object away from Earth
    let r0 = -state.position;
    let v0 = -state.velocity;

    let traj = propagate(&r0, &v0, &model, (0.0, 10.0), 1.0).unwrap();

    assert_eq!(traj.len(), 11);
    assert_eq!(traj.times, (0..=10).map(f64::from).collect::<Vec<_>>());
    assert_eq!(traj.positions[0], r0);
    assert_eq!(traj.velocities[0], v0);
    common::assert_all_finite(&traj.positions);
}

#[test]
fn non_multiple_span_overshoots_by_less_than_one_step() {
    let model = GravityModel::two_body(&PhysicalConstants::default());
    let r0 = Vector3::new(1.0, 0.0, 0.0);
    let v0 = Vector3::new(0.0, 0.0172, 0.0);

    let traj = propagate(&r0, &v0, &model, (0.0, 10.5), 1.0).unwrap();
    assert_eq!(traj.len(), 12);
    assert_eq!(traj.terminal_time(), Some(11.0));

    let single = propagate(&r0, &v0, &model, (3.0, 3.0), 1.0).unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single.state_at(0).unwrap().0, 3.0);
}

#[test]
fn degenerate_spans_fail() {
    let model = GravityModel::two_body(&PhysicalConstants::default());
    let r0 = Vector3::new(1.0, 0.0, 0.0);
    let v0 = Vector3::new(0.0, 0.0172, 0.0);

    for (span, dt) in [((0.0, 10.0), 0.0), ((10.0, 0.0), 1.0), ((0.0, 10.0), f64::NAN)] {
        assert!(matches!(
            propagate(&r0, &v0, &model, span, dt),
            Err(NeoRiskError::InvalidIntegrationParameter(_))
        ));
    }
}

#[test]
fn two_body_energy_is_conserved_over_one_period() {
    common::init_logger();
    let constants = PhysicalConstants::default();
    let mu = constants.mu_primary;
    let model = GravityModel::two_body(&constants);

    let kep = common::earth_like_orbit();
    let initial = kep.to_state_vector(mu).unwrap();
    let period = kep.orbital_period(mu);

    let traj = propagate_state(&initial, &model, (0.0, period.ceil()), 1.0).unwrap();

    let e0 = initial.specific_energy(mu);
    let h0 = initial.angular_momentum();
    for (_, state) in traj.iter() {
        assert_relative_eq!(state.specific_energy(mu), e0, max_relative = 1e-6);
        assert_relative_eq!(state.angular_momentum(), h0, max_relative = 1e-6);
    }
}

#[test]
fn two_body_orbit_closes_after_one_period() {
    let constants = PhysicalConstants::default();
    let mu = constants.mu_primary;
    let model = GravityModel::two_body(&constants);

    // Period chosen as an exact number of steps: a³ = μ (P/2π)²
    let period = 400.0;
    let a = (mu * (period / std::f64::consts::TAU).powi(2)).cbrt();
    let kep = neorisk::orbit_type::KeplerianElements::new(a, 0.2, 0.1, 0.5, 1.0, 0.3).unwrap();
    let initial = kep.to_state_vector(mu).unwrap();

    let traj = propagate_state(&initial, &model, (0.0, period), 0.5).unwrap();
    let terminal = traj.terminal_state().unwrap();
    assert_relative_eq!(terminal.position, initial.position, epsilon = 1e-6);
}

#[test]
fn earth_perturbation_changes_the_trajectory() {
    let constants = PhysicalConstants::default();
    let kep = neorisk::orbit_type::KeplerianElements::new(1.02, 0.05, 0.01, 0.0, 0.0, 0.2).unwrap();
    let initial = kep.to_state_vector(constants.mu_primary).unwrap();

    let two_body = propagate_state(&initial, &GravityModel::two_body(&constants), (0.0, 365.0), 1.0).unwrap();
    let perturbed = propagate_state(&initial, &GravityModel::sun_earth(&constants), (0.0, 365.0), 1.0).unwrap();

    let drift = (two_body.terminal_state().unwrap().position
        - perturbed.terminal_state().unwrap().position)
        .norm();
    assert!(drift > 0.0);
    // Earth is a small perturber: the drift stays well below the orbit size
    assert!(drift < 0.5, "drift = {drift}");

    let ca = closest_approach(&perturbed, &CircularEphemeris::earth()).unwrap();
    assert!(ca.distance > 0.0);
    assert!(ca.index < perturbed.len());
}

#[test]
fn singular_gravity_surfaces_as_error() {
    let model = GravityModel::two_body(&PhysicalConstants::default());
    // Object placed on the primary
    let err = propagate(&Vector3::new(0.0, 0.0, 0.0), &Vector3::zeros(), &model, (0.0, 1.0), 1.0)
        .unwrap_err();
    assert!(matches!(err, NeoRiskError::SingularGravity { .. }));
    assert!(model.acceleration(&Vector3::new(1.0, 0.0, 0.0), 0.0).is_ok());
}
