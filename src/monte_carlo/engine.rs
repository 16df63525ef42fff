//! # Monte Carlo trial engine
//!
//! Samples perturbed orbital elements around a nominal orbit, propagates every sample
//! under the full gravity model, and collects the terminal positions.
//!
//! ## Random streams
//!
//! [`MonteCarloEngine::run_trials`] first draws one `u64` seed per trial, in trial order,
//! from the caller's generator. Each trial then owns a [`StdRng`] seeded with its seed,
//! so no generator is shared between trials. The result depends only on the caller's
//! generator state, not on the execution order: runs with and without the `parallel`
//! feature are bit-identical.
//!
//! ## Failures
//!
//! A trial fails when its perturbed elements leave the elliptic domain, when the Kepler
//! solve does not converge in strict mode, or when the propagation hits a singular or
//! non-finite state. [`TrialFailurePolicy`] decides whether the run aborts or the trial
//! is reported in [`MonteCarloRun::failures`] and left out of the cloud. No failed trial
//! ever contributes a position.
//!
//! ## Example
//!
//! ```rust
//! use neorisk::constants::PhysicalConstants;
//! use neorisk::monte_carlo::{ElementSigmas, MonteCarloParams};
//! use neorisk::monte_carlo::engine::MonteCarloEngine;
//! use neorisk::orbit_type::KeplerianElements;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let params = MonteCarloParams::builder()
//!     .iterations(4)
//!     .time_span(0.0, 30.0)
//!     .build()
//!     .unwrap();
//! let engine = MonteCarloEngine::new(PhysicalConstants::default(), params).unwrap();
//!
//! let base = KeplerianElements::new(1.1, 0.2, 0.05, 0.3, 1.0, 0.0).unwrap();
//! let sigmas = ElementSigmas::from_array([1e-4, 1e-4, 0.0, 0.0, 0.0, 1e-3]).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let run = engine.run_trials(&base, &sigmas, &mut rng).unwrap();
//! assert_eq!(run.position_cloud().len(), 4);
//! ```
use log::{debug, info, warn};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "progress")]
use crate::progress_bar::TrialProgress;

use crate::constants::{Day, PhysicalConstants};
use crate::distance::{closest_approach, CloseApproach};
use crate::ephemeris::{CircularEphemeris, Ephemeris};
use crate::gravity::GravityModel;
use crate::integrator::propagate_state;
use crate::monte_carlo::{ElementSigmas, MonteCarloParams, TrialFailurePolicy};
use crate::neorisk_errors::NeoRiskError;
use crate::orbit_type::keplerian_element::KeplerianElements;
use crate::orbit_type::state_vector::StateVector;

/// Draw one perturbed element set.
///
/// Element `k` is sampled from `N(base[k], σ[k])` when `σ[k] > 0`; a zero sigma keeps
/// the base value and consumes nothing from `rng`.
///
/// Arguments
/// -----------------
/// * `base` – nominal elements.
/// * `sigmas` – one-sigma uncertainties, finite and `≥ 0`.
/// * `rng` – random source.
///
/// Return
/// ----------
/// * The perturbed elements, validated: a draw with `e ∉ [0, 1)` or `a ≤ 0` is
///   [`NeoRiskError::InvalidOrbitalElements`].
pub fn perturb_elements<R: Rng + ?Sized>(
    base: &KeplerianElements,
    sigmas: &ElementSigmas,
    rng: &mut R,
) -> Result<KeplerianElements, NeoRiskError> {
    sigmas.validate()?;

    let mut values = base.to_array();
    for (value, sigma) in values.iter_mut().zip(sigmas.to_array()) {
        if sigma > 0.0 {
            *value = Normal::new(*value, sigma)?.sample(rng);
        }
    }

    KeplerianElements::from_array(values)
}

/// Outcome of one successful trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSample {
    pub trial: usize,
    pub elements: KeplerianElements,
    pub terminal_state: StateVector,
    pub terminal_time: Day,
    /// Closest approach to the reference body over the whole trajectory, when tracked.
    pub closest_approach: Option<CloseApproach>,
}

/// A trial left out of the cloud under [`TrialFailurePolicy::Exclude`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrialFailure {
    pub trial: usize,
    pub error: NeoRiskError,
}

/// Terminal positions of the successful trials, in trial order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionCloud {
    pub positions: Vec<Vector3<f64>>,
}

impl PositionCloud {
    pub fn new(positions: Vec<Vector3<f64>>) -> Self {
        PositionCloud { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Mean position, `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.positions.iter().sum();
        Some(sum / self.positions.len() as f64)
    }
}

impl From<Vec<Vector3<f64>>> for PositionCloud {
    fn from(positions: Vec<Vector3<f64>>) -> Self {
        PositionCloud::new(positions)
    }
}

/// Full result of [`MonteCarloEngine::run_trials`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloRun {
    /// Number of trials attempted.
    pub iterations: usize,
    pub samples: Vec<MonteCarloSample>,
    pub failures: Vec<TrialFailure>,
}

impl MonteCarloRun {
    pub fn position_cloud(&self) -> PositionCloud {
        self.samples
            .iter()
            .map(|s| s.terminal_state.position)
            .collect::<Vec<_>>()
            .into()
    }

    pub fn success_count(&self) -> usize {
        self.samples.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Monte Carlo driver bound to a constants table, a gravity model and a reference body.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    constants: PhysicalConstants,
    gravity: GravityModel,
    reference_body: Arc<dyn Ephemeris>,
    params: MonteCarloParams,
}

impl MonteCarloEngine {
    /// Engine with the Sun + Earth gravity model and Earth as reference body.
    ///
    /// Both the constants table and the parameters are validated.
    pub fn new(constants: PhysicalConstants, params: MonteCarloParams) -> Result<Self, NeoRiskError> {
        constants.validate()?;
        params.validate()?;
        Ok(MonteCarloEngine {
            gravity: GravityModel::sun_earth(&constants),
            constants,
            reference_body: Arc::new(CircularEphemeris::earth()),
            params,
        })
    }

    /// Replace the gravity model. The element conversion keeps using
    /// `constants.mu_primary`.
    pub fn with_gravity_model(mut self, gravity: GravityModel) -> Self {
        self.gravity = gravity;
        self
    }

    /// Replace the body used for close-approach tracking.
    pub fn with_reference_body(mut self, body: Arc<dyn Ephemeris>) -> Self {
        self.reference_body = body;
        self
    }

    pub fn params(&self) -> &MonteCarloParams {
        &self.params
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn gravity(&self) -> &GravityModel {
        &self.gravity
    }

    pub fn reference_body(&self) -> &dyn Ephemeris {
        self.reference_body.as_ref()
    }

    /// Run a single trial: perturb, convert, propagate.
    pub fn run_trial<R: Rng + ?Sized>(
        &self,
        trial: usize,
        base: &KeplerianElements,
        sigmas: &ElementSigmas,
        rng: &mut R,
    ) -> Result<MonteCarloSample, NeoRiskError> {
        let elements = perturb_elements(base, sigmas, rng)?;
        let (initial, _) =
            elements.to_state_vector_with(self.constants.mu_primary, &self.params.kepler_params())?;

        let trajectory = propagate_state(&initial, &self.gravity, self.params.time_span(), self.params.dt)?;

        let last = trajectory.len().saturating_sub(1);
        let (terminal_time, terminal_state) = trajectory
            .state_at(last)
            .ok_or_else(|| NeoRiskError::EmptyInput("empty trajectory".into()))?;

        let closest_approach = if self.params.track_close_approach {
            Some(closest_approach(&trajectory, self.reference_body.as_ref())?)
        } else {
            None
        };

        Ok(MonteCarloSample {
            trial,
            elements,
            terminal_state,
            terminal_time,
            closest_approach,
        })
    }

    /// Run `params.iterations` independent trials.
    ///
    /// Arguments
    /// -----------------
    /// * `base` – nominal elements.
    /// * `sigmas` – one-sigma uncertainties.
    /// * `rng` – source of the per-trial seeds.
    ///
    /// Return
    /// ----------
    /// * A [`MonteCarloRun`] with samples in trial order.
    ///
    /// Errors
    /// ----------
    /// * [`NeoRiskError::TrialFailed`] for the first failing trial under
    ///   [`TrialFailurePolicy::Abort`], or when every trial failed under
    ///   [`TrialFailurePolicy::Exclude`].
    /// * [`NeoRiskError::InvalidMonteCarloParameter`] for invalid sigmas.
    pub fn run_trials<R: Rng + ?Sized>(
        &self,
        base: &KeplerianElements,
        sigmas: &ElementSigmas,
        rng: &mut R,
    ) -> Result<MonteCarloRun, NeoRiskError> {
        sigmas.validate()?;
        base.validate()?;

        let n = self.params.iterations;
        let (t0, tf) = self.params.time_span();
        info!(
            "Monte Carlo: {n} trials over [{t0}, {tf}] days, dt = {}, policy = {:?}",
            self.params.dt, self.params.failure_policy
        );

        let seeds: Vec<u64> = (0..n).map(|_| rng.random()).collect();

        #[cfg(feature = "progress")]
        let progress = TrialProgress::new(n as u64);

        let run_one = |(trial, seed): (usize, u64)| {
            let mut trial_rng = StdRng::seed_from_u64(seed);
            let outcome = self.run_trial(trial, base, sigmas, &mut trial_rng);

            if (trial + 1) % 10 == 0 {
                debug!("trial {}/{n} done", trial + 1);
            }
            #[cfg(feature = "progress")]
            progress.tick();

            (trial, outcome)
        };

        #[cfg(feature = "parallel")]
        let run = {
            let outcomes: Vec<_> = seeds.into_par_iter().enumerate().map(run_one).collect();
            self.collect_outcomes(outcomes.into_iter())
        };

        #[cfg(not(feature = "parallel"))]
        let run = self.collect_outcomes(seeds.into_iter().enumerate().map(run_one));

        #[cfg(feature = "progress")]
        progress.finish();

        let run = run?;
        info!(
            "Monte Carlo finished: {} trials kept, {} excluded",
            run.success_count(),
            run.failure_count()
        );
        Ok(run)
    }

    /// [`MonteCarloEngine::run_trials`] with a generator seeded from `params.seed`, or from
    /// the operating system when no seed is configured.
    pub fn run_trials_seeded(
        &self,
        base: &KeplerianElements,
        sigmas: &ElementSigmas,
    ) -> Result<MonteCarloRun, NeoRiskError> {
        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.run_trials(base, sigmas, &mut rng)
    }

    /// Fold trial outcomes in trial order according to the failure policy.
    fn collect_outcomes<I>(&self, outcomes: I) -> Result<MonteCarloRun, NeoRiskError>
    where
        I: Iterator<Item = (usize, Result<MonteCarloSample, NeoRiskError>)>,
    {
        let mut samples = Vec::with_capacity(self.params.iterations);
        let mut failures = Vec::new();

        for (trial, outcome) in outcomes {
            match outcome {
                Ok(sample) => samples.push(sample),
                Err(error) => match self.params.failure_policy {
                    TrialFailurePolicy::Abort => {
                        return Err(NeoRiskError::TrialFailed {
                            trial,
                            source: Box::new(error),
                        })
                    }
                    TrialFailurePolicy::Exclude => {
                        warn!("trial {trial} excluded: {error}");
                        failures.push(TrialFailure { trial, error });
                    }
                },
            }
        }

        if samples.is_empty() {
            if let Some(first) = failures.into_iter().next() {
                warn!("every Monte Carlo trial failed");
                return Err(NeoRiskError::TrialFailed {
                    trial: first.trial,
                    source: Box::new(first.error),
                });
            }
            return Err(NeoRiskError::EmptyInput("no Monte Carlo trial was run".into()));
        }

        Ok(MonteCarloRun {
            iterations: self.params.iterations,
            samples,
            failures,
        })
    }
}

/// Terminal position cloud of `iterations` trials under the default Sun + Earth model.
///
/// Every trial failure aborts the call. Use [`MonteCarloEngine`] for failure exclusion,
/// close-approach tracking or a custom gravity model.
///
/// Arguments
/// -----------------
/// * `base`, `sigmas` – nominal elements and their one-sigma uncertainties.
/// * `iterations` – number of trials, `≥ 1`.
/// * `t_span`, `dt` – propagation span and RK4 step (days).
/// * `rng` – source of the per-trial seeds.
pub fn run_trials<R: Rng + ?Sized>(
    base: &KeplerianElements,
    sigmas: &ElementSigmas,
    iterations: usize,
    t_span: (Day, Day),
    dt: Day,
    rng: &mut R,
) -> Result<PositionCloud, NeoRiskError> {
    let params = MonteCarloParams::builder()
        .iterations(iterations)
        .time_span(t_span.0, t_span.1)
        .dt(dt)
        .track_close_approach(false)
        .build()?;
    let engine = MonteCarloEngine::new(PhysicalConstants::default(), params)?;
    Ok(engine.run_trials(base, sigmas, rng)?.position_cloud())
}

#[cfg(test)]
mod engine_test {
    use super::*;
    use crate::gravity::ThirdBody;
    use crate::monte_carlo::MonteCarloParamsBuilder;
    use crate::neorisk_errors::ErrorKind;
    use approx::assert_relative_eq;

    fn base_elements() -> KeplerianElements {
        KeplerianElements::new(1.2, 0.1, 0.02, 0.4, 0.8, 1.0).unwrap()
    }

    fn short_params() -> MonteCarloParamsBuilder {
        MonteCarloParams::builder().iterations(6).time_span(0.0, 20.0).dt(1.0)
    }

    #[test]
    fn test_zero_sigma_keeps_base_and_rng() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut untouched = rng.clone();
        let kep = perturb_elements(&base_elements(), &ElementSigmas::zero(), &mut rng).unwrap();
        assert_eq!(kep, base_elements());
        // No draw was made
        assert_eq!(rng.random::<u64>(), untouched.random::<u64>());
    }

    #[test]
    fn test_only_positive_sigmas_move() {
        let sigmas = ElementSigmas::from_array([0.0, 0.0, 0.0, 0.0, 0.0, 0.1]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let kep = perturb_elements(&base_elements(), &sigmas, &mut rng).unwrap();
        let base = base_elements().to_array();
        let drawn = kep.to_array();
        assert_eq!(base[..5], drawn[..5]);
        assert_ne!(base[5], drawn[5]);
    }

    #[test]
    fn test_perturbation_out_of_domain() {
        let base = KeplerianElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        // Half of the draws make e negative
        let sigmas = ElementSigmas::from_array([0.0, 0.5, 0.0, 0.0, 0.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let failures = (0..50)
            .filter(|_| perturb_elements(&base, &sigmas, &mut rng).is_err())
            .count();
        assert!(failures > 0);
    }

    #[test]
    fn test_zero_sigma_trials_identical() {
        let engine = MonteCarloEngine::new(PhysicalConstants::default(), short_params().build().unwrap())
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let run = engine
            .run_trials(&base_elements(), &ElementSigmas::zero(), &mut rng)
            .unwrap();

        assert_eq!(run.samples.len(), 6);
        let first = run.samples[0].terminal_state;
        assert!(run.samples.iter().all(|s| s.terminal_state == first));
        assert!(run.samples.iter().all(|s| s.terminal_time == 20.0));
        assert!(run.samples.iter().all(|s| s.closest_approach.is_some()));
        assert_eq!(
            run.samples.iter().map(|s| s.trial).collect::<Vec<_>>(),
            (0..6).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_same_seed_same_run() {
        let engine = MonteCarloEngine::new(PhysicalConstants::default(), short_params().build().unwrap())
            .unwrap();
        let sigmas = ElementSigmas::from_array([1e-3, 1e-3, 1e-3, 0.0, 0.0, 1e-2]).unwrap();

        let run_a = engine
            .run_trials(&base_elements(), &sigmas, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let run_b = engine
            .run_trials(&base_elements(), &sigmas, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(run_a, run_b);

        // Distinct trials see distinct streams
        assert_ne!(run_a.samples[0].elements, run_a.samples[1].elements);
    }

    #[test]
    fn test_run_matches_sequential_per_trial_seeds() {
        let engine = MonteCarloEngine::new(PhysicalConstants::default(), short_params().build().unwrap())
            .unwrap();
        let sigmas = ElementSigmas::from_array([1e-3, 1e-3, 1e-3, 1e-3, 1e-3, 1e-2]).unwrap();
        let mut rng = StdRng::seed_from_u64(77);
        let mut replay = rng.clone();

        let run = engine.run_trials(&base_elements(), &sigmas, &mut rng).unwrap();

        let seeds: Vec<u64> = (0..6).map(|_| replay.random()).collect();
        let expected: Vec<MonteCarloSample> = seeds
            .into_iter()
            .enumerate()
            .map(|(trial, seed)| {
                engine
                    .run_trial(trial, &base_elements(), &sigmas, &mut StdRng::seed_from_u64(seed))
                    .unwrap()
            })
            .collect();

        assert_eq!(run.samples, expected);
        assert!(run.failures.is_empty());
        // The caller's generator advanced by exactly one draw per trial
        assert_eq!(rng.random::<u64>(), replay.random::<u64>());
    }

    #[test]
    fn test_seeded_from_params() {
        let params = short_params().seed(123).build().unwrap();
        let engine = MonteCarloEngine::new(PhysicalConstants::default(), params).unwrap();
        let sigmas = ElementSigmas::from_array([0.0, 1e-3, 0.0, 0.0, 0.0, 0.0]).unwrap();

        let run_a = engine.run_trials_seeded(&base_elements(), &sigmas).unwrap();
        let run_b = engine
            .run_trials(&base_elements(), &sigmas, &mut StdRng::seed_from_u64(123))
            .unwrap();
        assert_eq!(run_a, run_b);
    }

    #[test]
    fn test_abort_and_exclude_policies() {
        let base = KeplerianElements::new(1.0, 0.05, 0.0, 0.0, 1.0, 0.0).unwrap();
        // e < 0 for roughly one draw in six
        let sigmas = ElementSigmas::from_array([0.0, 0.05, 0.0, 0.0, 0.0, 0.0]).unwrap();

        let abort = MonteCarloEngine::new(
            PhysicalConstants::default(),
            short_params().iterations(40).build().unwrap(),
        )
        .unwrap();
        let err = abort
            .run_trials(&base, &sigmas, &mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert!(matches!(err, NeoRiskError::TrialFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let exclude = MonteCarloEngine::new(
            PhysicalConstants::default(),
            short_params()
                .iterations(40)
                .failure_policy(TrialFailurePolicy::Exclude)
                .build()
                .unwrap(),
        )
        .unwrap();
        let run = exclude
            .run_trials(&base, &sigmas, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(run.failure_count() > 0);
        assert!(run.success_count() > 0);
        assert_eq!(run.success_count() + run.failure_count(), 40);
        assert_eq!(run.position_cloud().len(), run.success_count());
        assert!(run
            .position_cloud()
            .positions
            .iter()
            .all(|p| p.iter().all(|x| x.is_finite())));
    }

    #[test]
    fn test_all_trials_failing_is_an_error() {
        let constants = PhysicalConstants::default();
        let singular = GravityModel::two_body(&constants)
            .with_third_body(ThirdBody::new("Origin", 1e-6, Arc::new(ZeroEphemeris)));
        let params = short_params()
            .failure_policy(TrialFailurePolicy::Exclude)
            .build()
            .unwrap();
        let engine = MonteCarloEngine::new(constants, params)
            .unwrap()
            .with_gravity_model(singular);

        // Every propagation fails on the first evaluation
        let err = engine
            .run_trials(&base_elements(), &ElementSigmas::zero(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, NeoRiskError::TrialFailed { trial: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::NumericalDegeneracy);
    }

    /// Body pinned at the origin: the indirect term is singular.
    #[derive(Debug)]
    struct ZeroEphemeris;

    impl Ephemeris for ZeroEphemeris {
        fn position(&self, _t: Day) -> Vector3<f64> {
            Vector3::zeros()
        }
    }

    #[test]
    fn test_centroid() {
        let cloud = PositionCloud::new(vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 2.0, 0.0),
            Vector3::new(0.0, 1.0, 3.0),
        ]);
        assert_relative_eq!(cloud.centroid().unwrap(), Vector3::new(0.0, 1.0, 1.0));
        assert!(PositionCloud::default().centroid().is_none());
    }

    #[test]
    fn test_free_function() {
        let cloud = run_trials(
            &base_elements(),
            &ElementSigmas::zero(),
            3,
            (0.0, 5.0),
            1.0,
            &mut StdRng::seed_from_u64(5),
        )
        .unwrap();
        assert_eq!(cloud.len(), 3);

        let err = run_trials(
            &base_elements(),
            &ElementSigmas::zero(),
            0,
            (0.0, 5.0),
            1.0,
            &mut StdRng::seed_from_u64(5),
        )
        .unwrap_err();
        assert!(matches!(err, NeoRiskError::InvalidMonteCarloParameter(_)));
    }
}
