//! # Close-approach risk
//!
//! Turns a Monte Carlo result into a probability of approaching a target closer than a
//! threshold distance.
//!
//! * [`analyze_risk`] – terminal positions of a [`PositionCloud`] against a fixed target.
//! * [`analyze_close_approach_risk`] – closest approach of each trial to the reference body
//!   along its whole trajectory.
//!
//! Both count a sample as a hit when its distance is **strictly** below the threshold and
//! report `100 · hits / n`, where `n` is the number of analysed samples. The per-sample
//! distances are kept in the [`RiskEstimate`] for percentile reporting.
use itertools::{Itertools, MinMaxResult};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::AstronomicalUnit;
use crate::monte_carlo::engine::{MonteCarloRun, PositionCloud};
use crate::neorisk_errors::NeoRiskError;

/// Probability of approaching the target closer than `threshold`, plus the distances it
/// was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEstimate {
    /// `100 · hits / sample_count`, in `[0, 100]`.
    pub probability_percent: f64,
    pub hits: usize,
    pub sample_count: usize,
    pub threshold: AstronomicalUnit,
    /// Distance of each sample to the target, in sample order.
    pub distances: Vec<f64>,
}

/// Descriptive statistics of the per-sample distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl RiskEstimate {
    fn from_distances(distances: Vec<f64>, threshold: AstronomicalUnit) -> Self {
        let hits = distances.iter().filter(|&&d| d < threshold).count();
        let sample_count = distances.len();
        RiskEstimate {
            probability_percent: 100.0 * hits as f64 / sample_count as f64,
            hits,
            sample_count,
            threshold,
            distances,
        }
    }

    /// `p`-th percentile of the distances, `p ∈ [0, 100]`.
    ///
    /// Linear interpolation between the two closest order statistics: the rank
    /// `p/100 · (n − 1)` is split into an integer part `j` and a fraction `g`, and the
    /// result is `(1 − g)·d₍ⱼ₎ + g·d₍ⱼ₊₁₎`.
    pub fn percentile(&self, p: f64) -> Result<f64, NeoRiskError> {
        if !(0.0..=100.0).contains(&p) {
            return Err(NeoRiskError::InvalidRiskInput(format!(
                "percentile must lie in [0, 100], got {p}"
            )));
        }
        if self.distances.is_empty() {
            return Err(NeoRiskError::EmptyInput("no distances".into()));
        }

        let sorted: Vec<f64> = self
            .distances
            .iter()
            .copied()
            .sorted_by(|a, b| a.total_cmp(b))
            .collect();

        let rank = p / 100.0 * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as f64;

        Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
    }

    /// Min, max, mean and standard deviation of the distances.
    pub fn summary(&self) -> Option<DistanceSummary> {
        let (min, max) = match self.distances.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(d) => (d, d),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

        let n = self.distances.len() as f64;
        let mean = self.distances.iter().sum::<f64>() / n;
        let variance = self.distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;

        Some(DistanceSummary {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

fn check_threshold(threshold: f64) -> Result<(), NeoRiskError> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(NeoRiskError::InvalidRiskInput(format!(
            "threshold distance must be finite and >= 0, got {threshold}"
        )));
    }
    Ok(())
}

/// Probability that a terminal position lies closer than `threshold` to `target`.
///
/// Arguments
/// -----------------
/// * `cloud` – terminal positions, non-empty and finite.
/// * `target` – target position (AU), finite.
/// * `threshold` – distance (AU), finite and `≥ 0`.
///
/// Return
/// ----------
/// * A [`RiskEstimate`] whose `distances` follow the cloud order.
/// * `Err(EmptyInput)` for an empty cloud, `Err(InvalidRiskInput)` for a non-finite
///   target, position or threshold.
pub fn analyze_risk(
    cloud: &PositionCloud,
    target: &Vector3<f64>,
    threshold: AstronomicalUnit,
) -> Result<RiskEstimate, NeoRiskError> {
    if cloud.is_empty() {
        return Err(NeoRiskError::EmptyInput(
            "cannot estimate a probability from an empty position cloud".into(),
        ));
    }
    if !target.iter().all(|x| x.is_finite()) {
        return Err(NeoRiskError::InvalidRiskInput(format!(
            "target position must be finite, got {target:?}"
        )));
    }
    check_threshold(threshold)?;

    let distances: Vec<f64> = cloud.positions.iter().map(|p| (p - target).norm()).collect();
    if let Some(index) = distances.iter().position(|d| !d.is_finite()) {
        return Err(NeoRiskError::InvalidRiskInput(format!(
            "position {index} of the cloud is not finite"
        )));
    }

    let estimate = RiskEstimate::from_distances(distances, threshold);
    log::info!(
        "risk: {}/{} samples within {threshold} AU ({:.3}%)",
        estimate.hits,
        estimate.sample_count,
        estimate.probability_percent
    );
    Ok(estimate)
}

/// Probability that a trial's closest approach to the reference body is below `threshold`.
///
/// Requires a run made with `track_close_approach` enabled.
pub fn analyze_close_approach_risk(
    run: &MonteCarloRun,
    threshold: AstronomicalUnit,
) -> Result<RiskEstimate, NeoRiskError> {
    check_threshold(threshold)?;
    if run.samples.is_empty() {
        return Err(NeoRiskError::EmptyInput("Monte Carlo run has no samples".into()));
    }

    let distances = run
        .samples
        .iter()
        .map(|s| {
            s.closest_approach.map(|ca| ca.distance).ok_or_else(|| {
                NeoRiskError::InvalidRiskInput(format!(
                    "trial {} has no closest approach (track_close_approach disabled)",
                    s.trial
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RiskEstimate::from_distances(distances, threshold))
}
