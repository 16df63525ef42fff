//! # Separation and closest approach
//!
//! Reductions over parallel position sequences:
//!
//! * [`compute_distance`] – pairwise Euclidean separation of two equally long sequences.
//! * [`find_minimum_distance`] – smallest separation with its time and index; ties are
//!   broken by the lowest index.
//! * [`distances_to_body`] / [`closest_approach`] – the same against a body given by an
//!   [`Ephemeris`], sampled on the trajectory's own time grid.
use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{AstronomicalUnit, Day};
use crate::ephemeris::Ephemeris;
use crate::integrator::Trajectory;
use crate::neorisk_errors::NeoRiskError;

/// Minimum separation over a sampled interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    pub distance: AstronomicalUnit,
    pub time: Day,
    pub index: usize,
}

/// Pairwise `|a_j − b_j|`.
///
/// Return
/// ----------
/// * `Err(NeoRiskError::ShapeMismatch)` if the sequences differ in length.
pub fn compute_distance(
    positions_a: &[Vector3<f64>],
    positions_b: &[Vector3<f64>],
) -> Result<Vec<f64>, NeoRiskError> {
    if positions_a.len() != positions_b.len() {
        return Err(NeoRiskError::ShapeMismatch {
            what: "positions",
            left: positions_a.len(),
            right: positions_b.len(),
        });
    }
    Ok(positions_a
        .iter()
        .zip(positions_b)
        .map(|(a, b)| (a - b).norm())
        .collect())
}

/// Smallest distance together with its time and index.
///
/// Arguments
/// -----------------
/// * `times` – sample times, same length as `distances`.
/// * `distances` – separations, finite.
///
/// Return
/// ----------
/// * The first (lowest-index) minimum.
/// * `Err(ShapeMismatch)`, `Err(EmptyInput)` or `Err(InvalidRiskInput)` for mismatched,
///   empty or non-finite input.
pub fn find_minimum_distance(times: &[Day], distances: &[f64]) -> Result<CloseApproach, NeoRiskError> {
    if times.len() != distances.len() {
        return Err(NeoRiskError::ShapeMismatch {
            what: "times/distances",
            left: times.len(),
            right: distances.len(),
        });
    }
    if let Some(bad) = distances.iter().find(|d| !d.is_finite()) {
        return Err(NeoRiskError::InvalidRiskInput(format!(
            "distances must be finite, found {bad}"
        )));
    }

    // position_min_by keeps the first of equal elements
    let index = distances
        .iter()
        .position_min_by(|a, b| a.total_cmp(b))
        .ok_or_else(|| NeoRiskError::EmptyInput("no distances to reduce".into()))?;

    Ok(CloseApproach {
        distance: distances[index],
        time: times[index],
        index,
    })
}

/// Distance from every trajectory sample to `body` at the same time.
pub fn distances_to_body<E: Ephemeris + ?Sized>(
    trajectory: &Trajectory,
    body: &E,
) -> Result<Vec<f64>, NeoRiskError> {
    let body_positions = body.positions(&trajectory.times);
    compute_distance(&trajectory.positions, &body_positions)
}

/// Closest approach of the trajectory to `body`.
pub fn closest_approach<E: Ephemeris + ?Sized>(
    trajectory: &Trajectory,
    body: &E,
) -> Result<CloseApproach, NeoRiskError> {
    let distances = distances_to_body(trajectory, body)?;
    find_minimum_distance(&trajectory.times, &distances)
}
