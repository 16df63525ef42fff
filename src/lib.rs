//! # neorisk
//!
//! Trajectory propagation and Monte Carlo close-approach risk for near-Earth objects.
//!
//! ## Pipeline
//!
//! 1. [`orbit_type::KeplerianElements`] → heliocentric [`orbit_type::StateVector`]
//!    (Kepler's equation solved by [`kepler`]).
//! 2. RK4 propagation ([`integrator`]) under the Sun + Earth [`gravity::GravityModel`], with
//!    Earth on a circular [`ephemeris::CircularEphemeris`].
//! 3. Monte Carlo sampling of the elements ([`monte_carlo::engine`]) and risk estimation
//!    ([`monte_carlo::risk`]).
//!
//! Units are AU, days and radians throughout.
//!
//! ## Example
//!
//! ```rust
//! use nalgebra::Vector3;
//! use neorisk::monte_carlo::engine::run_trials;
//! use neorisk::monte_carlo::risk::analyze_risk;
//! use neorisk::monte_carlo::ElementSigmas;
//! use neorisk::orbit_type::KeplerianElements;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let base = KeplerianElements::new(1.0, 0.1, 0.0, 0.0, 0.0, 0.0).unwrap();
//! let cloud = run_trials(
//!     &base,
//!     &ElementSigmas::zero(),
//!     5,
//!     (0.0, 365.0),
//!     1.0,
//!     &mut StdRng::seed_from_u64(42),
//! )
//! .unwrap();
//!
//! let risk = analyze_risk(&cloud, &Vector3::zeros(), 2.0).unwrap();
//! assert_eq!(risk.probability_percent, 100.0);
//! ```
//!
//! ## Features
//!
//! * `progress` – `indicatif` progress bar during Monte Carlo runs.
//! * `parallel` – trials executed with `rayon`; results are identical to the sequential run.
pub mod constants;
pub mod distance;
pub mod ephemeris;
pub mod gravity;
pub mod integrator;
pub mod kepler;
pub mod monte_carlo;
pub mod neorisk_errors;
pub mod orbit_type;
pub mod ref_system;

#[cfg(feature = "progress")]
pub mod progress_bar;

pub use constants::PhysicalConstants;
pub use neorisk_errors::{ErrorKind, NeoRiskError};
