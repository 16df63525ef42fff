//! # Monte Carlo risk parameters
//!
//! This module defines the [`crate::monte_carlo::MonteCarloParams`] configuration struct and its
//! builder, the per-element uncertainties [`ElementSigmas`], and the
//! [`TrialFailurePolicy`] used by the Monte Carlo engine.
//!
//! ## Pipeline overview
//!
//! 1. **Sampling**
//!    For each of `iterations` trials, every orbital element is drawn from
//!    `N(base, σ)` when its sigma is positive and kept at its base value otherwise.
//!
//! 2. **Propagation**
//!    The perturbed elements are converted to a heliocentric state
//!    (Kepler tolerance `kepler_tol`, cap `kepler_max_iter`) and propagated with RK4 under
//!    the Sun + Earth gravity model over `[t_start, t_end]` with step `dt`.
//!
//! 3. **Collection**
//!    The terminal position of each trial forms the position cloud. With
//!    `track_close_approach`, the closest approach to the reference body along the whole
//!    trajectory is kept as well.
//!
//! 4. **Risk analysis**
//!    See [`risk`](crate::monte_carlo::risk).
//!
//! ## Example
//!
//! ```rust
//! use neorisk::monte_carlo::{MonteCarloParams, TrialFailurePolicy};
//!
//! let params = MonteCarloParams::builder()
//!     .iterations(200)
//!     .time_span(0.0, 730.0)
//!     .dt(0.5)
//!     .seed(42)
//!     .failure_policy(TrialFailurePolicy::Exclude)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(params.iterations, 200);
//! ```
use serde::{Deserialize, Serialize};
use std::cmp::Ordering::{Equal, Greater};

use crate::constants::{Day, KEPLER_MAX_ITER, KEPLER_TOL};
use crate::kepler::KeplerParams;
use crate::neorisk_errors::NeoRiskError;

/// Trial sampling and propagation engine.
pub mod engine;

/// Close-approach probability and distance statistics.
pub mod risk;

/// What to do when a single trial fails (non-finite state, singular gravity, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrialFailurePolicy {
    /// Stop the whole run with [`NeoRiskError::TrialFailed`].
    #[default]
    Abort,
    /// Record the failure, log it, and leave the trial out of the position cloud.
    Exclude,
}

/// One-sigma uncertainties of the six Keplerian elements.
///
/// Units follow [`KeplerianElements`](crate::orbit_type::KeplerianElements): AU for `a`,
/// radians for the angles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSigmas {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub periapsis_argument: f64,
    pub mean_anomaly: f64,
}

impl ElementSigmas {
    /// All sigmas zero: every trial reproduces the nominal orbit.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from `[σa, σe, σi, σΩ, σω, σM]`, validating each entry.
    pub fn from_array(values: [f64; 6]) -> Result<Self, NeoRiskError> {
        let [a, e, i, node, peri, m] = values;
        let sigmas = ElementSigmas {
            semi_major_axis: a,
            eccentricity: e,
            inclination: i,
            ascending_node_longitude: node,
            periapsis_argument: peri,
            mean_anomaly: m,
        };
        sigmas.validate()?;
        Ok(sigmas)
    }

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

    /// Every sigma must be finite and non-negative.
    pub fn validate(&self) -> Result<(), NeoRiskError> {
        if let Some((k, s)) = self
            .to_array()
            .into_iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && *s >= 0.0))
        {
            return Err(NeoRiskError::InvalidMonteCarloParameter(format!(
                "sigma[{k}] must be finite and >= 0, got {s}"
            )));
        }
        Ok(())
    }
}

/// Configuration of a Monte Carlo run.
///
/// Fields
/// -----------------
/// * `iterations` – number of independent trials, `≥ 1`.
/// * `t_start`, `t_end` – propagation span (days), `t_end ≥ t_start`.
/// * `dt` – RK4 step (days), `> 0`.
/// * `seed` – seed used by [`MonteCarloEngine::run_trials_seeded`](crate::monte_carlo::engine::MonteCarloEngine::run_trials_seeded);
///   `None` draws one from the OS.
/// * `failure_policy` – see [`TrialFailurePolicy`].
/// * `kepler_tol`, `kepler_max_iter` – Kepler solver settings for each conversion.
/// * `require_kepler_convergence` – treat an unconverged Kepler solve as a trial failure.
/// * `track_close_approach` – also record each trial's closest approach to the reference body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloParams {
    pub iterations: usize,
    pub t_start: Day,
    pub t_end: Day,
    pub dt: Day,
    pub seed: Option<u64>,
    pub failure_policy: TrialFailurePolicy,
    pub kepler_tol: f64,
    pub kepler_max_iter: usize,
    pub require_kepler_convergence: bool,
    pub track_close_approach: bool,
}

impl Default for MonteCarloParams {
    fn default() -> Self {
        MonteCarloParams {
            iterations: 50,
            t_start: 0.0,
            t_end: 365.0,
            dt: 1.0,
            seed: None,
            failure_policy: TrialFailurePolicy::Abort,
            kepler_tol: KEPLER_TOL,
            kepler_max_iter: KEPLER_MAX_ITER,
            require_kepler_convergence: false,
            track_close_approach: true,
        }
    }
}

impl MonteCarloParams {
    pub fn builder() -> MonteCarloParamsBuilder {
        MonteCarloParamsBuilder::new()
    }

    /// `(t_start, t_end)`.
    pub fn time_span(&self) -> (Day, Day) {
        (self.t_start, self.t_end)
    }

    /// Kepler solver settings derived from this configuration.
    pub fn kepler_params(&self) -> KeplerParams {
        KeplerParams {
            tol: self.kepler_tol,
            max_iter: self.kepler_max_iter,
            require_convergence: self.require_kepler_convergence,
        }
    }

    /// Check the configuration. Called by the builder and by the engine, so a
    /// deserialized configuration is checked before use.
    pub fn validate(&self) -> Result<(), NeoRiskError> {
        if self.iterations < 1 {
            return Err(NeoRiskError::InvalidMonteCarloParameter(
                "iterations must be >= 1".into(),
            ));
        }
        if !(self.t_start.is_finite() && self.t_end.is_finite()) {
            return Err(NeoRiskError::InvalidMonteCarloParameter(
                "time span must be finite".into(),
            ));
        }
        if !ge(self.t_end, self.t_start) {
            return Err(NeoRiskError::InvalidMonteCarloParameter(format!(
                "t_end ({}) must not precede t_start ({})",
                self.t_end, self.t_start
            )));
        }
        if !(gt0(self.dt) && self.dt.is_finite()) {
            return Err(NeoRiskError::InvalidMonteCarloParameter(
                "dt must be finite and strictly positive".into(),
            ));
        }
        if !(gt0(self.kepler_tol) && self.kepler_tol.is_finite()) {
            return Err(NeoRiskError::InvalidMonteCarloParameter(
                "kepler_tol must be finite and strictly positive".into(),
            ));
        }
        if self.kepler_max_iter < 1 {
            return Err(NeoRiskError::InvalidMonteCarloParameter(
                "kepler_max_iter must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Return true iff x > 0.0 and comparable (i.e., not NaN).
#[inline]
fn gt0(x: f64) -> bool {
    x.partial_cmp(&0.0) == Some(Greater)
}

/// Return true iff a >= b and comparable.
#[inline]
fn ge(a: f64, b: f64) -> bool {
    matches!(a.partial_cmp(&b), Some(Greater) | Some(Equal))
}

/// Fluent builder for [`MonteCarloParams`].
#[derive(Debug, Clone, Default)]
pub struct MonteCarloParamsBuilder {
    params: MonteCarloParams,
}

impl MonteCarloParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: MonteCarloParams::default(),
        }
    }

    pub fn iterations(mut self, v: usize) -> Self {
        self.params.iterations = v;
        self
    }

    pub fn time_span(mut self, t_start: Day, t_end: Day) -> Self {
        self.params.t_start = t_start;
        self.params.t_end = t_end;
        self
    }

    pub fn dt(mut self, v: Day) -> Self {
        self.params.dt = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.params.seed = Some(v);
        self
    }

    pub fn failure_policy(mut self, v: TrialFailurePolicy) -> Self {
        self.params.failure_policy = v;
        self
    }

    pub fn kepler_tol(mut self, v: f64) -> Self {
        self.params.kepler_tol = v;
        self
    }

    pub fn kepler_max_iter(mut self, v: usize) -> Self {
        self.params.kepler_max_iter = v;
        self
    }

    pub fn require_kepler_convergence(mut self, v: bool) -> Self {
        self.params.require_kepler_convergence = v;
        self
    }

    pub fn track_close_approach(mut self, v: bool) -> Self {
        self.params.track_close_approach = v;
        self
    }

    /// Finalize the builder and produce a [`MonteCarloParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `iterations ≥ 1` – a probability over zero trials is undefined.
    /// * `t_start`, `t_end` finite with `t_end ≥ t_start`.
    /// * `dt > 0` and finite.
    /// * `kepler_tol > 0` and finite, `kepler_max_iter ≥ 1`.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(MonteCarloParams)` if all values are valid.
    /// * `Err(NeoRiskError::InvalidMonteCarloParameter)` otherwise.
    pub fn build(self) -> Result<MonteCarloParams, NeoRiskError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod monte_carlo_params_test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = MonteCarloParams::builder().build().unwrap();
        assert_eq!(params, MonteCarloParams::default());
        assert_eq!(params.iterations, 50);
        assert_eq!(params.time_span(), (0.0, 365.0));
        assert_eq!(params.failure_policy, TrialFailurePolicy::Abort);
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        let cases = [
            MonteCarloParams::builder().iterations(0),
            MonteCarloParams::builder().dt(0.0),
            MonteCarloParams::builder().dt(f64::NAN),
            MonteCarloParams::builder().time_span(10.0, 0.0),
            MonteCarloParams::builder().time_span(0.0, f64::INFINITY),
            MonteCarloParams::builder().kepler_tol(0.0),
            MonteCarloParams::builder().kepler_tol(f64::INFINITY),
            MonteCarloParams::builder().kepler_max_iter(0),
        ];
        for builder in cases {
            let err = builder.build().unwrap_err();
            assert!(matches!(err, NeoRiskError::InvalidMonteCarloParameter(_)));
        }
    }

    #[test]
    fn test_kepler_params() {
        let params = MonteCarloParams::builder()
            .kepler_tol(1e-12)
            .kepler_max_iter(7)
            .require_kepler_convergence(true)
            .build()
            .unwrap();
        let kp = params.kepler_params();
        assert_eq!(kp.tol, 1e-12);
        assert_eq!(kp.max_iter, 7);
        assert!(kp.require_convergence);
    }

    #[test]
    fn test_sigmas() {
        let sigmas = ElementSigmas::from_array([1e-3, 1e-4, 0.0, 0.0, 0.0, 1e-2]).unwrap();
        assert_eq!(sigmas.mean_anomaly, 1e-2);
        assert_eq!(sigmas.to_array()[1], 1e-4);

        assert!(ElementSigmas::from_array([0.0, -1e-4, 0.0, 0.0, 0.0, 0.0]).is_err());
        assert!(ElementSigmas::from_array([f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
        assert_eq!(ElementSigmas::zero().to_array(), [0.0; 6]);
    }
}
