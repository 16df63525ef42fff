//! # Fixed-step RK4 propagation
//!
//! Integrates the second-order system
//!
//! ```text
//! dr/dt = v,    dv/dt = a(r, t)
//! ```
//!
//! with the classical fourth-order Runge–Kutta scheme and a constant step `dt`,
//! where `a` is any [`AccelerationField`].
//!
//! ## Time grid
//!
//! [`time_grid`] returns the sample times `t_j = t0 + j·dt`, `j = 0..n`:
//!
//! * if `(tf − t0)/dt` is an integer `k` (to a relative `1e-9`), `n = k + 1` and the last
//!   sample is exactly `tf`;
//! * otherwise `n = ⌈(tf − t0)/dt⌉ + 1` and the last sample overshoots `tf` by less than
//!   one step.
//!
//! `tf == t0` gives a single sample.
//!
//! ## Recording
//!
//! The state is recorded **before** each step, so the first record of a
//! [`Trajectory`] is bit-for-bit the initial `(t0, r0, v0)`; exactly `n − 1` steps are
//! performed.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::Day;
use crate::gravity::AccelerationField;
use crate::neorisk_errors::NeoRiskError;
use crate::orbit_type::state_vector::StateVector;

/// Upper bound on the number of samples of one trajectory.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Relative tolerance used to decide that `(tf − t0)/dt` is an integer.
const GRID_INTEGER_TOL: f64 = 1e-9;

/// Uniformly sampled trajectory `(t_j, r_j, v_j)`.
///
/// The three vectors always have the same, non-zero length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<Day>,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
}

impl Trajectory {
    fn with_capacity(n: usize) -> Self {
        Trajectory {
            times: Vec::with_capacity(n),
            positions: Vec::with_capacity(n),
            velocities: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, t: Day, state: &StateVector) {
        self.times.push(t);
        self.positions.push(state.position);
        self.velocities.push(state.velocity);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time and state of sample `index`, if any.
    pub fn state_at(&self, index: usize) -> Option<(Day, StateVector)> {
        Some((
            *self.times.get(index)?,
            StateVector::new(*self.positions.get(index)?, *self.velocities.get(index)?),
        ))
    }

    /// Last recorded time.
    pub fn terminal_time(&self) -> Option<Day> {
        self.times.last().copied()
    }

    /// Last recorded state.
    pub fn terminal_state(&self) -> Option<StateVector> {
        self.state_at(self.len().checked_sub(1)?).map(|(_, s)| s)
    }

    /// Iterate over `(t, state)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, StateVector)> + '_ {
        self.times
            .iter()
            .zip(self.positions.iter().zip(self.velocities.iter()))
            .map(|(&t, (&r, &v))| (t, StateVector::new(r, v)))
    }
}

/// Sample times of a propagation over `[t0, tf]` with step `dt`.
///
/// Arguments
/// -----------------
/// * `t0`, `tf` – start and end time (days), finite, `tf ≥ t0`.
/// * `dt` – step (days), finite and `> 0`.
///
/// Return
/// ----------
/// * `Ok(times)` with `times[0] == t0` and `times[j] = t0 + j·dt`.
/// * `Err(NeoRiskError::InvalidIntegrationParameter)` on degenerate input or when the
///   grid would exceed [`MAX_SAMPLES`].
pub fn time_grid(t0: Day, tf: Day, dt: Day) -> Result<Vec<Day>, NeoRiskError> {
    if !(t0.is_finite() && tf.is_finite()) {
        return Err(NeoRiskError::InvalidIntegrationParameter(format!(
            "time span must be finite, got ({t0}, {tf})"
        )));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(NeoRiskError::InvalidIntegrationParameter(format!(
            "time step must be finite and > 0, got {dt}"
        )));
    }
    if tf < t0 {
        return Err(NeoRiskError::InvalidIntegrationParameter(format!(
            "end time {tf} precedes start time {t0}"
        )));
    }

    let ratio = (tf - t0) / dt;
    let nearest = ratio.round();
    // Relative snap only: a positive sub-tolerance span still takes one step
    let steps = if nearest >= 1.0 && (ratio - nearest).abs() <= GRID_INTEGER_TOL * nearest {
        nearest
    } else {
        ratio.ceil()
    };

    if !steps.is_finite() || steps >= MAX_SAMPLES as f64 {
        return Err(NeoRiskError::InvalidIntegrationParameter(format!(
            "time grid ({t0}, {tf}) with dt = {dt} exceeds {MAX_SAMPLES} samples"
        )));
    }

    let n = steps as usize + 1;
    Ok((0..n).map(|j| t0 + j as f64 * dt).collect())
}

/// One classical Runge–Kutta step.
///
/// The acceleration field is evaluated exactly four times: at `(r, t)`, twice at the
/// half step `t + dt/2`, and at `t + dt`.
///
/// Return
/// ----------
/// * The state at `t + dt`, or the field's error, or
///   [`NeoRiskError::NonFiniteState`] if the new state is not finite.
pub fn rk4_step<A: AccelerationField + ?Sized>(
    state: &StateVector,
    t: Day,
    dt: Day,
    field: &A,
) -> Result<StateVector, NeoRiskError> {
    let r = state.position;
    let v = state.velocity;
    let half = dt / 2.0;

    let k1_r = v;
    let k1_v = field.acceleration(&r, t)?;

    let k2_r = v + half * k1_v;
    let k2_v = field.acceleration(&(r + half * k1_r), t + half)?;

    let k3_r = v + half * k2_v;
    let k3_v = field.acceleration(&(r + half * k2_r), t + half)?;

    let k4_r = v + dt * k3_v;
    let k4_v = field.acceleration(&(r + dt * k3_r), t + dt)?;

    let next = StateVector::new(
        r + dt / 6.0 * (k1_r + 2.0 * k2_r + 2.0 * k3_r + k4_r),
        v + dt / 6.0 * (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v),
    );

    if !next.is_finite() {
        return Err(NeoRiskError::NonFiniteState {
            time: t + dt,
            what: "propagated state".into(),
        });
    }
    Ok(next)
}

/// Propagate `(r0, v0)` from `t0` to `tf` with a fixed RK4 step.
///
/// Arguments
/// -----------------
/// * `r0`, `v0` – initial position (AU) and velocity (AU/day), finite.
/// * `field` – acceleration model, e.g. [`crate::gravity::GravityModel`].
/// * `t_span` – `(t0, tf)` in days.
/// * `dt` – step in days.
///
/// Return
/// ----------
/// * A [`Trajectory`] on the [`time_grid`] of `t_span`; its first record is exactly
///   `(t0, r0, v0)`.
///
/// Errors
/// ----------
/// * [`NeoRiskError::InvalidIntegrationParameter`] for a degenerate grid or non-finite
///   initial state.
/// * Any error of the acceleration field, e.g. [`NeoRiskError::SingularGravity`].
///
/// See also
/// ------------
/// * [`propagate_state`] – same, starting from a [`StateVector`].
pub fn propagate<A: AccelerationField + ?Sized>(
    r0: &Vector3<f64>,
    v0: &Vector3<f64>,
    field: &A,
    t_span: (Day, Day),
    dt: Day,
) -> Result<Trajectory, NeoRiskError> {
    propagate_state(&StateVector::new(*r0, *v0), field, t_span, dt)
}

/// [`propagate`] from a [`StateVector`].
pub fn propagate_state<A: AccelerationField + ?Sized>(
    initial: &StateVector,
    field: &A,
    t_span: (Day, Day),
    dt: Day,
) -> Result<Trajectory, NeoRiskError> {
    if !initial.is_finite() {
        return Err(NeoRiskError::InvalidIntegrationParameter(
            "initial state must be finite".into(),
        ));
    }
    let times = time_grid(t_span.0, t_span.1, dt)?;

    let mut trajectory = Trajectory::with_capacity(times.len());
    let mut state = *initial;
    trajectory.push(times[0], &state);

    for window in times.windows(2) {
        state = rk4_step(&state, window[0], dt, field)?;
        trajectory.push(window[1], &state);
    }

    log::trace!(
        "propagated {} samples over [{}, {}] (dt = {dt}), |r_final| = {}",
        trajectory.len(),
        t_span.0,
        trajectory.terminal_time().unwrap_or(t_span.0),
        state.position.norm()
    );

    Ok(trajectory)
}
