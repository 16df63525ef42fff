//! # Cartesian state vectors
//!
//! A [`StateVector`] is a position/velocity pair expressed in the primary body's inertial
//! frame (AU, AU/day). It is produced once by
//! [`KeplerianElements::to_state_vector`](crate::orbit_type::keplerian_element::KeplerianElements::to_state_vector)
//! and then evolved by the integrator; no routine of this crate mutates a state in place.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Heliocentric position/velocity pair.
///
/// Units
/// -----
/// * `position`: AU
/// * `velocity`: AU/day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl StateVector {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        StateVector { position, velocity }
    }

    /// `true` if every component of position and velocity is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|x| x.is_finite())
    }

    /// Specific orbital energy `|v|²/2 − μ/|r|` of the two-body problem (AU²/day²).
    pub fn specific_energy(&self, mu: f64) -> f64 {
        self.velocity.norm_squared() / 2.0 - mu / self.position.norm()
    }

    /// Specific angular momentum `r × v` (AU²/day).
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.position.cross(&self.velocity)
    }
}

#[cfg(test)]
mod state_vector_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_energy() {
        // Circular orbit at r = 1 with μ = 1: v = 1, energy = -1/2
        let state = StateVector::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(state.specific_energy(1.0), -0.5);
        assert_relative_eq!(state.angular_momentum(), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_is_finite() {
        let mut state = StateVector::new(Vector3::zeros(), Vector3::zeros());
        assert!(state.is_finite());
        state.velocity.y = f64::NAN;
        assert!(!state.is_finite());
    }
}
