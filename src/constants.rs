//! # Constants and type definitions for neorisk
//!
//! This module centralizes the **physical constants**, **conversion factors**, and the
//! **physical constants table** used throughout the `neorisk` library.
//!
//! ## Overview
//!
//! - Astronomical constants in the AU / day / solar-mass system
//! - Unit conversions (AU ↔ km, degrees ↔ radians)
//! - Core type aliases used across the crate
//! - [`PhysicalConstants`], the immutable table of gravitational parameters and body radii
//!   handed to every component that needs one
//!
//! ## Units
//!
//! Unless stated otherwise, every quantity in the crate is expressed in:
//!
//! - distance: **AU**
//! - time: **days**
//! - gravitational parameter: **AU³/day²**
//!
//! ## Example
//!
//! ```rust
//! use neorisk::constants::{PhysicalConstants, GAUSS_GRAV_SQUARED};
//!
//! let constants = PhysicalConstants::default();
//! assert_eq!(constants.mu_primary, GAUSS_GRAV_SQUARED);
//! ```

use serde::{Deserialize, Serialize};

use crate::neorisk_errors::NeoRiskError;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Gaussian gravitational constant k (AU^1.5 / day)
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// k², the heliocentric gravitational parameter in AU³/day²
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;

/// Sun / Earth mass ratio (IAU 2009), Moon excluded
pub const SUN_EARTH_MASS_RATIO: f64 = 332_946.048_7;

/// Earth equatorial radius in kilometers (GRS1980/WGS84)
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6_378.137;

/// Earth radius expressed in astronomical units
pub const ERAU: f64 = EARTH_EQUATORIAL_RADIUS_KM / AU;

/// Nominal solar radius in kilometers (IAU 2015 B3)
pub const SUN_RADIUS_KM: f64 = 695_700.0;

/// Solar radius expressed in astronomical units
pub const SRAU: f64 = SUN_RADIUS_KM / AU;

/// Period of the circular reference Earth orbit (days)
pub const EARTH_ORBITAL_PERIOD: f64 = 365.25;

/// Default absolute tolerance on the eccentric anomaly update
pub const KEPLER_TOL: f64 = 1e-10;

/// Default iteration cap for the Kepler solver
pub const KEPLER_MAX_ITER: usize = 100;

/// Version of the [`PhysicalConstants`] table layout and default values.
pub const CONSTANTS_TABLE_VERSION: u32 = 1;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Time in days
pub type Day = f64;
/// Distance in astronomical units
pub type AstronomicalUnit = f64;

// -------------------------------------------------------------------------------------------------
// Physical constants table
// -------------------------------------------------------------------------------------------------

/// Immutable table of the physical constants shared by every component.
///
/// The table is built once (usually with [`PhysicalConstants::default`]) and passed by
/// reference to the converters, the gravity model and the Monte Carlo engine. Nothing in the
/// crate mutates it, so the same table can be shared across threads.
///
/// Fields
/// -----------------
/// * `mu_primary` – gravitational parameter of the primary body (AU³/day²).
/// * `mu_secondary` – gravitational parameter of the perturbing body (AU³/day²).
///   A value of `0.0` switches the third-body perturbation off.
/// * `primary_radius` – radius of the primary body (AU), reference only.
/// * `secondary_radius` – radius of the secondary body (AU), reference only.
///
/// The radii are informative: they are never enforced as collision bounds.
///
/// See also
/// ------------
/// * [`CONSTANTS_TABLE_VERSION`] – version of the default values below.
/// * [`crate::gravity::GravityModel::sun_earth`] – consumes this table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    pub mu_primary: f64,
    pub mu_secondary: f64,
    pub primary_radius: AstronomicalUnit,
    pub secondary_radius: AstronomicalUnit,
}

impl Default for PhysicalConstants {
    /// Heliocentric Sun/Earth table, AU–day units.
    fn default() -> Self {
        PhysicalConstants {
            mu_primary: GAUSS_GRAV_SQUARED,
            mu_secondary: GAUSS_GRAV_SQUARED / SUN_EARTH_MASS_RATIO,
            primary_radius: SRAU,
            secondary_radius: ERAU,
        }
    }
}

impl PhysicalConstants {
    /// Build a validated constants table.
    ///
    /// Arguments
    /// -----------------
    /// * `mu_primary` – must be finite and strictly positive.
    /// * `mu_secondary` – must be finite and non-negative.
    /// * `primary_radius`, `secondary_radius` – must be finite and non-negative.
    ///
    /// Return
    /// ----------
    /// * `Ok(PhysicalConstants)` or [`NeoRiskError::InvalidPhysicalConstant`].
    pub fn new(
        mu_primary: f64,
        mu_secondary: f64,
        primary_radius: AstronomicalUnit,
        secondary_radius: AstronomicalUnit,
    ) -> Result<Self, NeoRiskError> {
        let constants = PhysicalConstants {
            mu_primary,
            mu_secondary,
            primary_radius,
            secondary_radius,
        };
        constants.validate()?;
        Ok(constants)
    }

    /// Sun-only table: the secondary gravitational parameter is zero.
    pub fn two_body() -> Self {
        PhysicalConstants {
            mu_secondary: 0.0,
            ..Self::default()
        }
    }

    /// Check the invariants of the table.
    pub fn validate(&self) -> Result<(), NeoRiskError> {
        if !(self.mu_primary.is_finite() && self.mu_primary > 0.0) {
            return Err(NeoRiskError::InvalidPhysicalConstant(format!(
                "mu_primary must be finite and > 0, got {}",
                self.mu_primary
            )));
        }
        if !(self.mu_secondary.is_finite() && self.mu_secondary >= 0.0) {
            return Err(NeoRiskError::InvalidPhysicalConstant(format!(
                "mu_secondary must be finite and >= 0, got {}",
                self.mu_secondary
            )));
        }
        for (name, radius) in [
            ("primary_radius", self.primary_radius),
            ("secondary_radius", self.secondary_radius),
        ] {
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(NeoRiskError::InvalidPhysicalConstant(format!(
                    "{name} must be finite and >= 0, got {radius}"
                )));
            }
        }
        Ok(())
    }
}
