//! # Kepler's equation
//!
//! Newton–Raphson solver for the elliptic Kepler equation
//!
//! ```text
//! E − e·sin(E) = M
//! ```
//!
//! mapping a mean anomaly `M` to the eccentric anomaly `E` for `0 ≤ e < 1`.
//!
//! ## Starting point
//!
//! * `E₀ = M` when `e < 0.8`,
//! * `E₀ = π` otherwise. For highly eccentric orbits the Newton map started from
//!   `M` can overshoot near periapsis, while `π` converges for every `M`.
//!
//! ## Convergence
//!
//! The iteration stops as soon as `|ΔE| < tol` or after `max_iter` updates. The plain
//! solver [`solve_kepler_equation`] always returns the last iterate together with a
//! `converged` flag; [`solve_kepler_equation_strict`] turns a missing convergence into
//! [`NeoRiskError::KeplerNonConvergence`].
use std::f64::consts::PI;

use crate::constants::{KEPLER_MAX_ITER, KEPLER_TOL};
use crate::neorisk_errors::NeoRiskError;

/// Eccentricity above which the iteration starts from `π` instead of `M`.
const HIGH_ECCENTRICITY: f64 = 0.8;

/// Outcome of a Kepler solve.
///
/// Fields
/// -----------------
/// * `eccentric_anomaly` – last computed iterate `E` (radians).
/// * `iterations` – number of Newton updates actually applied.
/// * `converged` – `true` if the last update satisfied `|ΔE| < tol`.
/// * `residual` – `E − e·sin(E) − M` evaluated at the returned `E`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    pub eccentric_anomaly: f64,
    pub iterations: usize,
    pub converged: bool,
    pub residual: f64,
}

/// Tolerance and iteration cap of the Kepler solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerParams {
    pub tol: f64,
    pub max_iter: usize,
    /// Reject unconverged solves instead of returning the last iterate.
    pub require_convergence: bool,
}

impl Default for KeplerParams {
    fn default() -> Self {
        KeplerParams {
            tol: KEPLER_TOL,
            max_iter: KEPLER_MAX_ITER,
            require_convergence: false,
        }
    }
}

#[inline]
fn kepler_residual(eccentric_anomaly: f64, eccentricity: f64, mean_anomaly: f64) -> f64 {
    eccentric_anomaly - eccentricity * eccentric_anomaly.sin() - mean_anomaly
}

/// Solve Kepler's equation with Newton–Raphson.
///
/// Arguments
/// -----------------
/// * `mean_anomaly` – mean anomaly `M` (radians), not reduced modulo 2π.
/// * `eccentricity` – eccentricity `e`, expected in `[0, 1)`.
/// * `tol` – absolute stopping tolerance on `|ΔE|`.
/// * `max_iter` – maximum number of Newton updates.
///
/// Return
/// ----------
/// * A [`KeplerSolution`]. Non-convergence is **not** an error here: the last iterate
///   is returned with `converged == false`.
///
/// See also
/// ------------
/// * [`solve_kepler_equation_strict`] – same iteration, fails on non-convergence.
pub fn solve_kepler_equation(
    mean_anomaly: f64,
    eccentricity: f64,
    tol: f64,
    max_iter: usize,
) -> KeplerSolution {
    let mut e_anom = if eccentricity < HIGH_ECCENTRICITY {
        mean_anomaly
    } else {
        PI
    };

    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..max_iter {
        let f = kepler_residual(e_anom, eccentricity, mean_anomaly);
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        let delta = -f / f_prime;
        e_anom += delta;
        iterations += 1;

        if delta.abs() < tol {
            converged = true;
            break;
        }
    }

    KeplerSolution {
        eccentric_anomaly: e_anom,
        iterations,
        converged,
        residual: kepler_residual(e_anom, eccentricity, mean_anomaly),
    }
}

/// Solve Kepler's equation and fail if the iteration budget is exhausted.
///
/// Return
/// ----------
/// * `Ok(E)` on convergence.
/// * `Err(NeoRiskError::KeplerNonConvergence)` otherwise.
pub fn solve_kepler_equation_strict(
    mean_anomaly: f64,
    eccentricity: f64,
    tol: f64,
    max_iter: usize,
) -> Result<f64, NeoRiskError> {
    let solution = solve_kepler_equation(mean_anomaly, eccentricity, tol, max_iter);
    if solution.converged {
        Ok(solution.eccentric_anomaly)
    } else {
        Err(NeoRiskError::KeplerNonConvergence {
            mean_anomaly,
            eccentricity,
            iterations: solution.iterations,
            residual: solution.residual,
        })
    }
}
