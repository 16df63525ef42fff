//! # Keplerian orbital elements
//!
//! This module defines the [`crate::orbit_type::keplerian_element::KeplerianElements`] struct
//! and the conversion from elements to a Cartesian [`StateVector`].
//!
//! ## What are Keplerian elements?
//!
//! The six Keplerian elements are:
//!
//! 1. **a** – Semi-major axis (AU)
//! 2. **e** – Eccentricity (unitless)
//! 3. **i** – Inclination (radians)
//! 4. **Ω** – Longitude of ascending node (radians)
//! 5. **ω** – Argument of periapsis (radians)
//! 6. **M** – Mean anomaly at epoch (radians)
//!
//! Together they describe an orbit under the two-body approximation. Only elliptic
//! orbits are supported: `0 ≤ e < 1` and `a > 0`.
//!
//! ## Conversion to a state vector
//!
//! 1. Solve Kepler's equation for the eccentric anomaly `E` ([`crate::kepler`]).
//! 2. Build the perifocal position
//!    `r_pqw = (a(cos E − e), a√(1−e²) sin E, 0)` and the radius `r = a(1 − e cos E)`.
//! 3. Build the perifocal velocity
//!    `v_pqw = √(μa)/r · (−sin E, √(1−e²) cos E, 0)`.
//! 4. Rotate both vectors with `Rz(Ω)·Rx(i)·Rz(ω)` ([`crate::ref_system::perifocal_to_inertial`]).
//!
//! ## Units
//!
//! - Lengths: **AU**
//! - Angles: **radians**
//! - Velocities: **AU/day** (with `μ` in AU³/day²)
//!
//! ## Example
//!
//! ```rust
//! use neorisk::constants::GAUSS_GRAV_SQUARED;
//! use neorisk::orbit_type::keplerian_element::KeplerianElements;
//!
//! let kep = KeplerianElements::new(1.0, 0.1, 0.0, 0.0, 0.0, 0.0).unwrap();
//! let state = kep.to_state_vector(GAUSS_GRAV_SQUARED).unwrap();
//!
//! // At periapsis the object sits at a(1 − e) on the X axis
//! assert!((state.position.x - 0.9).abs() < 1e-12);
//! ```
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{Radian, DPI};
use crate::kepler::{solve_kepler_equation, KeplerParams, KeplerSolution};
use crate::neorisk_errors::NeoRiskError;
use crate::orbit_type::state_vector::StateVector;
use crate::ref_system::perifocal_to_inertial;

/// Keplerian orbital elements (osculating, two-body, elliptic).
///
/// Units
/// -----
/// * `semi_major_axis`: Astronomical Units (AU).
/// * `eccentricity`: unitless, in `[0, 1)`.
/// * `inclination`: radians.
/// * `ascending_node_longitude`: radians (Ω).
/// * `periapsis_argument`: radians (ω).
/// * `mean_anomaly`: radians (M).
///
/// Notes
/// -----
/// Fields are public for convenience; [`KeplerianElements::new`] and
/// [`KeplerianElements::validate`] enforce the domain. Every conversion re-validates
/// its input, so a struct built by hand with e.g. `e = 1.2` is rejected at use.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node_longitude: Radian,
    pub periapsis_argument: Radian,
    pub mean_anomaly: Radian,
}

impl KeplerianElements {
    /// Build a validated element set.
    ///
    /// Arguments
    /// ---------
    /// * `semi_major_axis` – `a > 0` (AU).
    /// * `eccentricity` – `0 ≤ e < 1`.
    /// * `inclination`, `ascending_node_longitude`, `periapsis_argument`, `mean_anomaly` –
    ///   finite angles (radians).
    ///
    /// Return
    /// ------
    /// * `Ok(KeplerianElements)` or [`NeoRiskError::InvalidOrbitalElements`].
    pub fn new(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: Radian,
        ascending_node_longitude: Radian,
        periapsis_argument: Radian,
        mean_anomaly: Radian,
    ) -> Result<Self, NeoRiskError> {
        let kep = KeplerianElements {
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude,
            periapsis_argument,
            mean_anomaly,
        };
        kep.validate()?;
        Ok(kep)
    }

    /// Build from the canonical array `[a, e, i, Ω, ω, M]`.
    pub fn from_array(values: [f64; 6]) -> Result<Self, NeoRiskError> {
        let [a, e, i, node, peri, m] = values;
        Self::new(a, e, i, node, peri, m)
    }

    /// Canonical array `[a, e, i, Ω, ω, M]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
            self.mean_anomaly,
        ]
    }

    /// Check the elliptic-orbit invariants.
    pub fn validate(&self) -> Result<(), NeoRiskError> {
        if self.to_array().iter().any(|x| !x.is_finite()) {
            return Err(NeoRiskError::InvalidOrbitalElements(format!(
                "all elements must be finite, got {self}"
            )));
        }
        if self.semi_major_axis <= 0.0 {
            return Err(NeoRiskError::InvalidOrbitalElements(format!(
                "semi-major axis must be > 0, got {}",
                self.semi_major_axis
            )));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(NeoRiskError::InvalidOrbitalElements(format!(
                "eccentricity must lie in [0, 1), got {}",
                self.eccentricity
            )));
        }
        Ok(())
    }

    /// Mean motion `n = √(μ/a³)` (rad/day).
    pub fn mean_motion(&self, mu: f64) -> f64 {
        (mu / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Orbital period `2π/n` (days).
    pub fn orbital_period(&self, mu: f64) -> f64 {
        DPI / self.mean_motion(mu)
    }

    /// Convert to a heliocentric state vector with the default Kepler tolerances.
    ///
    /// An unconverged Kepler solve is logged and the last iterate is used; see
    /// [`KeplerianElements::to_state_vector_with`] for the strict behaviour.
    ///
    /// Arguments
    /// ---------
    /// * `mu` – gravitational parameter of the primary (AU³/day²), finite and `> 0`.
    ///
    /// Return
    /// ------
    /// * `Ok(StateVector)` in AU and AU/day.
    /// * `Err(NeoRiskError::InvalidOrbitalElements)` for out-of-domain elements or `mu`.
    pub fn to_state_vector(&self, mu: f64) -> Result<StateVector, NeoRiskError> {
        self.to_state_vector_with(mu, &KeplerParams::default())
            .map(|(state, _)| state)
    }

    /// Convert to a heliocentric state vector with explicit solver settings.
    ///
    /// Return
    /// ------
    /// * `Ok((state, kepler_solution))` – the solution carries the convergence flag.
    /// * `Err(NeoRiskError::KeplerNonConvergence)` if `params.require_convergence` is set
    ///   and the solve did not converge.
    pub fn to_state_vector_with(
        &self,
        mu: f64,
        params: &KeplerParams,
    ) -> Result<(StateVector, KeplerSolution), NeoRiskError> {
        self.validate()?;
        if !(mu.is_finite() && mu > 0.0) {
            return Err(NeoRiskError::InvalidOrbitalElements(format!(
                "gravitational parameter must be finite and > 0, got {mu}"
            )));
        }

        let a = self.semi_major_axis;
        let e = self.eccentricity;

        let solution = solve_kepler_equation(self.mean_anomaly, e, params.tol, params.max_iter);
        if !solution.converged {
            if params.require_convergence {
                return Err(NeoRiskError::KeplerNonConvergence {
                    mean_anomaly: self.mean_anomaly,
                    eccentricity: e,
                    iterations: solution.iterations,
                    residual: solution.residual,
                });
            }
            log::warn!(
                "Kepler solve not converged after {} iterations (M = {}, e = {}, residual = {:e})",
                solution.iterations,
                self.mean_anomaly,
                e,
                solution.residual
            );
        }

        let (sin_e, cos_e) = solution.eccentric_anomaly.sin_cos();
        let sqrt_one_minus_e2 = (1.0 - e * e).sqrt();

        // Distance from the focus
        let r_norm = a * (1.0 - e * cos_e);

        // Perifocal frame
        let r_pqw = Vector3::new(a * (cos_e - e), a * sqrt_one_minus_e2 * sin_e, 0.0);
        let v_factor = (mu * a).sqrt() / r_norm;
        let v_pqw = Vector3::new(-sin_e, sqrt_one_minus_e2 * cos_e, 0.0) * v_factor;

        let rotation = perifocal_to_inertial(
            self.ascending_node_longitude,
            self.inclination,
            self.periapsis_argument,
        );

        Ok((
            StateVector::new(rotation * r_pqw, rotation * v_pqw),
            solution,
        ))
    }
}

impl fmt::Display for KeplerianElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a = {} AU, e = {}, i = {} rad, Ω = {} rad, ω = {} rad, M = {} rad",
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
            self.mean_anomaly
        )
    }
}

#[cfg(test)]
mod test_keplerian_element {
    use super::*;
    use crate::constants::GAUSS_GRAV_SQUARED;
    use approx::assert_relative_eq;

    #[test]
    fn test_validation() {
        assert!(KeplerianElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0).is_ok());
        assert!(KeplerianElements::new(1.0, 1.0, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(KeplerianElements::new(1.0, -0.1, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(KeplerianElements::new(0.0, 0.1, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(KeplerianElements::new(1.0, 0.1, f64::NAN, 0.0, 0.0, 0.0).is_err());

        let hand_built = KeplerianElements {
            semi_major_axis: 2.0,
            eccentricity: 1.5,
            inclination: 0.0,
            ascending_node_longitude: 0.0,
            periapsis_argument: 0.0,
            mean_anomaly: 0.0,
        };
        assert!(matches!(
            hand_built.to_state_vector(GAUSS_GRAV_SQUARED),
            Err(NeoRiskError::InvalidOrbitalElements(_))
        ));
    }

    #[test]
    fn test_array_order() {
        let values = [1.5, 0.2, 0.1, 0.3, 0.4, 0.5];
        let kep = KeplerianElements::from_array(values).unwrap();
        assert_eq!(kep.ascending_node_longitude, 0.3);
        assert_eq!(kep.periapsis_argument, 0.4);
        assert_eq!(kep.to_array(), values);
    }

    #[test]
    fn test_periapsis_state() {
        let mu = GAUSS_GRAV_SQUARED;
        let kep = KeplerianElements::new(1.0, 0.1, 0.0, 0.0, 0.0, 0.0).unwrap();
        let state = kep.to_state_vector(mu).unwrap();

        assert_relative_eq!(state.position, Vector3::new(0.9, 0.0, 0.0), epsilon = 1e-14);

        // Vis-viva at periapsis: v² = μ(1+e)/(a(1−e))
        let v_peri = (mu * 1.1 / 0.9).sqrt();
        assert_relative_eq!(
            state.velocity,
            Vector3::new(0.0, v_peri, 0.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_vis_viva_and_energy() {
        let mu = GAUSS_GRAV_SQUARED;
        let kep = KeplerianElements::new(1.8017, 0.2835, 0.2026, 0.0079, 1.2451, 0.4405).unwrap();
        let state = kep.to_state_vector(mu).unwrap();

        // Specific energy is −μ/2a for any point of the orbit
        assert_relative_eq!(
            state.specific_energy(mu),
            -mu / (2.0 * kep.semi_major_axis),
            max_relative = 1e-12
        );

        // |h| = √(μ a (1 − e²))
        let h = (mu * kep.semi_major_axis * (1.0 - kep.eccentricity.powi(2))).sqrt();
        assert_relative_eq!(state.angular_momentum().norm(), h, max_relative = 1e-12);

        // The angular momentum is normal to the orbital plane: its angle to Z is i
        let h_vec = state.angular_momentum();
        assert_relative_eq!(
            (h_vec.z / h_vec.norm()).acos(),
            kep.inclination,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_strict_conversion() {
        let kep = KeplerianElements::new(1.0, 0.95, 0.0, 0.0, 0.0, 0.3).unwrap();
        let params = KeplerParams {
            tol: 1e-16,
            max_iter: 1,
            require_convergence: true,
        };
        assert!(matches!(
            kep.to_state_vector_with(GAUSS_GRAV_SQUARED, &params),
            Err(NeoRiskError::KeplerNonConvergence { .. })
        ));

        let lenient = KeplerParams {
            require_convergence: false,
            ..params
        };
        let (_, solution) = kep.to_state_vector_with(GAUSS_GRAV_SQUARED, &lenient).unwrap();
        assert!(!solution.converged);
    }

    #[test]
    fn test_period() {
        let kep = KeplerianElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        // One AU around the Sun: the Gaussian year, 365.2569 days
        assert_relative_eq!(
            kep.orbital_period(GAUSS_GRAV_SQUARED),
            365.256_898_3,
            max_relative = 1e-8
        );
    }
}
