use thiserror::Error;

/// Coarse classification of [`NeoRiskError`] values.
///
/// * `InvalidInput` – the caller passed something the operation cannot accept
///   (shape mismatch, out-of-domain element, bad step size, ...).
/// * `NumericalDegeneracy` – the inputs were valid but the computation hit a
///   singularity or produced a non-finite value.
/// * `NonConvergence` – an iterative solver exhausted its iteration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NumericalDegeneracy,
    NonConvergence,
}

#[derive(Error, Debug, Clone)]
pub enum NeoRiskError {
    #[error("Invalid orbital elements: {0}")]
    InvalidOrbitalElements(String),

    #[error("Invalid physical constant: {0}")]
    InvalidPhysicalConstant(String),

    #[error("Invalid integration parameter: {0}")]
    InvalidIntegrationParameter(String),

    #[error("Invalid Monte Carlo parameter: {0}")]
    InvalidMonteCarloParameter(String),

    #[error("Invalid risk analysis input: {0}")]
    InvalidRiskInput(String),

    #[error("Shape mismatch for {what}: {left} vs {right}")]
    ShapeMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Gravity evaluation is singular: zero separation from {body}")]
    SingularGravity { body: String },

    #[error("Non-finite {what} at t = {time}")]
    NonFiniteState { time: f64, what: String },

    #[error(
        "Kepler equation did not converge after {iterations} iterations \
         (M = {mean_anomaly}, e = {eccentricity}, residual = {residual:e})"
    )]
    KeplerNonConvergence {
        mean_anomaly: f64,
        eccentricity: f64,
        iterations: usize,
        residual: f64,
    },

    #[error("Gaussian noise generation failed: {0:?}")]
    NoiseInjectionError(rand_distr::NormalError),

    #[error("Monte Carlo trial {trial} failed: {source}")]
    TrialFailed {
        trial: usize,
        source: Box<NeoRiskError>,
    },
}

impl NeoRiskError {
    /// Map the error onto the three-way [`ErrorKind`] taxonomy.
    ///
    /// A [`NeoRiskError::TrialFailed`] reports the kind of the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        use NeoRiskError::*;
        match self {
            InvalidOrbitalElements(_)
            | InvalidPhysicalConstant(_)
            | InvalidIntegrationParameter(_)
            | InvalidMonteCarloParameter(_)
            | InvalidRiskInput(_)
            | ShapeMismatch { .. }
            | EmptyInput(_)
            | NoiseInjectionError(_) => ErrorKind::InvalidInput,
            SingularGravity { .. } | NonFiniteState { .. } => ErrorKind::NumericalDegeneracy,
            KeplerNonConvergence { .. } => ErrorKind::NonConvergence,
            TrialFailed { source, .. } => source.kind(),
        }
    }
}

impl From<rand_distr::NormalError> for NeoRiskError {
    fn from(err: rand_distr::NormalError) -> Self {
        NeoRiskError::NoiseInjectionError(err)
    }
}

impl PartialEq for NeoRiskError {
    fn eq(&self, other: &Self) -> bool {
        use NeoRiskError::*;
        match (self, other) {
            (InvalidOrbitalElements(a), InvalidOrbitalElements(b)) => a == b,
            (InvalidPhysicalConstant(a), InvalidPhysicalConstant(b)) => a == b,
            (InvalidIntegrationParameter(a), InvalidIntegrationParameter(b)) => a == b,
            (InvalidMonteCarloParameter(a), InvalidMonteCarloParameter(b)) => a == b,
            (InvalidRiskInput(a), InvalidRiskInput(b)) => a == b,
            (EmptyInput(a), EmptyInput(b)) => a == b,
            (
                ShapeMismatch {
                    what: wa,
                    left: la,
                    right: ra,
                },
                ShapeMismatch {
                    what: wb,
                    left: lb,
                    right: rb,
                },
            ) => wa == wb && la == lb && ra == rb,
            (SingularGravity { body: a }, SingularGravity { body: b }) => a == b,
            (NoiseInjectionError(a), NoiseInjectionError(b)) => a == b,

            // Floating payloads may be NaN: equality if same variant
            (NonFiniteState { .. }, NonFiniteState { .. }) => true,
            (KeplerNonConvergence { .. }, KeplerNonConvergence { .. }) => true,

            (
                TrialFailed {
                    trial: ta,
                    source: sa,
                },
                TrialFailed {
                    trial: tb,
                    source: sb,
                },
            ) => ta == tb && sa == sb,

            _ => false,
        }
    }
}
