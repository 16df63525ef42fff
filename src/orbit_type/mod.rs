//! # Orbit representations
//!
//! - [`keplerian_element`](crate::orbit_type::keplerian_element) — Classical Keplerian elements
//!   `(a, e, i, Ω, ω, M)` restricted to elliptic orbits, with the conversion to Cartesian state.
//! - [`state_vector`](crate::orbit_type::state_vector) — Heliocentric position/velocity pair
//!   consumed by the integrator.
//!
//! ## Typical workflow
//!
//! ```rust
//! use neorisk::constants::PhysicalConstants;
//! use neorisk::orbit_type::KeplerianElements;
//!
//! let constants = PhysicalConstants::default();
//! let kep = KeplerianElements::new(1.2, 0.15, 0.05, 1.0, 0.5, 0.0).unwrap();
//!
//! let state = kep.to_state_vector(constants.mu_primary).unwrap();
//! assert!(state.is_finite());
//! ```

/// Classical Keplerian elements structure and utilities.
pub mod keplerian_element;

/// Cartesian position/velocity state.
pub mod state_vector;

pub use keplerian_element::KeplerianElements;
pub use state_vector::StateVector;
