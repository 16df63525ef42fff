#![allow(dead_code)]

use approx::assert_relative_eq;
use nalgebra::Vector3;
use neorisk::orbit_type::KeplerianElements;

/// Install `env_logger` once so `RUST_LOG=debug cargo test` shows the crate's logs.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_orbit_close(actual: &KeplerianElements, expected: &KeplerianElements, epsilon: f64) {
    assert_relative_eq!(
        actual.semi_major_axis,
        expected.semi_major_axis,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.eccentricity,
        expected.eccentricity,
        epsilon = epsilon
    );
    assert_relative_eq!(actual.inclination, expected.inclination, epsilon = epsilon);
    assert_relative_eq!(
        actual.ascending_node_longitude,
        expected.ascending_node_longitude,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.periapsis_argument,
        expected.periapsis_argument,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.mean_anomaly,
        expected.mean_anomaly,
        epsilon = epsilon
    );
}

/// Every component of every vector is finite.
pub fn assert_all_finite(vectors: &[Vector3<f64>]) {
    for (k, v) in vectors.iter().enumerate() {
        assert!(v.iter().all(|x| x.is_finite()), "vector {k} is not finite: {v:?}");
    }
}

/// Earth-like nominal orbit used by several scenarios.
pub fn earth_like_orbit() -> KeplerianElements {
    KeplerianElements::new(1.0, 0.01, 0.0, 0.0, 0.0, 0.0).unwrap()
}
