//! # Reference-body ephemeris
//!
//! Position of the perturbing (reference) body as a pure function of time.
//!
//! ## Model
//!
//! [`CircularEphemeris`] places the body on a circular orbit in the primary's
//! reference plane (`z = 0`):
//!
//! ```text
//! r(t) = R · (cos ωt, sin ωt, 0),    ω = 2π / P
//! ```
//!
//! with phase zero at `t = 0`. [`CircularEphemeris::earth`] uses `R = 1 AU` and
//! `P = 365.25 days`.
//!
//! The [`Ephemeris`] trait is the seam consumed by [`crate::gravity::ThirdBody`] and
//! [`crate::distance::distances_to_body`]; any other body model only has to implement
//! [`Ephemeris::position`].
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::constants::{AstronomicalUnit, Day, DPI, EARTH_ORBITAL_PERIOD};
use crate::neorisk_errors::NeoRiskError;

/// Position of a body as a function of time (AU, days).
///
/// Implementations must be pure: the same `t` always gives the same position.
pub trait Ephemeris: Debug + Send + Sync {
    /// Heliocentric position at time `t`.
    fn position(&self, t: Day) -> Vector3<f64>;

    /// Element-wise [`Ephemeris::position`] over a time sequence.
    fn positions(&self, times: &[Day]) -> Vec<Vector3<f64>> {
        times.iter().map(|&t| self.position(t)).collect()
    }
}

/// Circular, planar orbit with zero phase at `t = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularEphemeris {
    pub radius: AstronomicalUnit,
    pub period: Day,
}

impl CircularEphemeris {
    /// Build a circular ephemeris.
    ///
    /// Arguments
    /// -----------------
    /// * `radius` – orbit radius (AU), finite and `> 0`.
    /// * `period` – orbital period (days), finite and `> 0`.
    pub fn new(radius: AstronomicalUnit, period: Day) -> Result<Self, NeoRiskError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(NeoRiskError::InvalidPhysicalConstant(format!(
                "ephemeris radius must be finite and > 0, got {radius}"
            )));
        }
        if !(period.is_finite() && period > 0.0) {
            return Err(NeoRiskError::InvalidPhysicalConstant(format!(
                "ephemeris period must be finite and > 0, got {period}"
            )));
        }
        Ok(CircularEphemeris { radius, period })
    }

    /// Earth on a 1 AU circle with a 365.25 day period.
    pub fn earth() -> Self {
        CircularEphemeris {
            radius: 1.0,
            period: EARTH_ORBITAL_PERIOD,
        }
    }

    /// Angular rate `2π/P` (rad/day).
    pub fn angular_rate(&self) -> f64 {
        DPI / self.period
    }
}

impl Default for CircularEphemeris {
    fn default() -> Self {
        Self::earth()
    }
}

impl Ephemeris for CircularEphemeris {
    fn position(&self, t: Day) -> Vector3<f64> {
        let (sin_wt, cos_wt) = (self.angular_rate() * t).sin_cos();
        Vector3::new(self.radius * cos_wt, self.radius * sin_wt, 0.0)
    }
}
