//! # Gravity model
//!
//! Heliocentric acceleration of a massless object under the primary body and any
//! number of third-body perturbers.
//!
//! ## Equations
//!
//! Primary (point mass):
//!
//! ```text
//! a_primary(r) = −μ · r / |r|³
//! ```
//!
//! Third body `b` at `r_b(t)`, in the heliocentric (non-inertial) frame:
//!
//! ```text
//! a_b(r, t) = −μ_b · (r − r_b) / |r − r_b|³  +  μ_b · r_b / |r_b|³
//!             └──────── direct ────────┘       └──── indirect ────┘
//! ```
//!
//! The indirect term removes the acceleration of the primary itself towards `b`.
//!
//! ## Failure modes
//!
//! A zero separation between the object and any attracting centre yields
//! [`NeoRiskError::SingularGravity`]; a non-finite position yields
//! [`NeoRiskError::NonFiniteState`]. No evaluation returns an infinite or NaN
//! acceleration.
use nalgebra::Vector3;
use std::sync::Arc;

use crate::constants::{Day, PhysicalConstants};
use crate::ephemeris::{CircularEphemeris, Ephemeris};
use crate::neorisk_errors::NeoRiskError;

/// Acceleration as a function of position and time.
///
/// Implementors are stateless from the caller's point of view: the integrator may
/// evaluate them any number of times per step, and the Monte Carlo engine shares
/// a single instance across trials (and threads with the `parallel` feature).
///
/// Closures `Fn(&Vector3<f64>, f64) -> Result<Vector3<f64>, NeoRiskError>` implement
/// this trait, which makes test stubs one-liners.
pub trait AccelerationField: Send + Sync {
    fn acceleration(&self, position: &Vector3<f64>, t: Day) -> Result<Vector3<f64>, NeoRiskError>;
}

impl<F> AccelerationField for F
where
    F: Fn(&Vector3<f64>, Day) -> Result<Vector3<f64>, NeoRiskError> + Send + Sync,
{
    fn acceleration(&self, position: &Vector3<f64>, t: Day) -> Result<Vector3<f64>, NeoRiskError> {
        self(position, t)
    }
}

/// Point-mass acceleration `−μ r / |r|³` of an object at `r` relative to the attractor.
///
/// Arguments
/// -----------------
/// * `mu` – gravitational parameter of the attractor (AU³/day²).
/// * `relative_position` – object position relative to the attractor (AU).
/// * `body` – attractor name, used in the error message.
///
/// Return
/// ----------
/// * `Err(NeoRiskError::SingularGravity)` when `|r| = 0` or the acceleration overflows.
/// * `Err(NeoRiskError::NonFiniteState)` when `r` has a non-finite component.
pub fn point_mass_acceleration(
    mu: f64,
    relative_position: &Vector3<f64>,
    body: &str,
) -> Result<Vector3<f64>, NeoRiskError> {
    if !relative_position.iter().all(|x| x.is_finite()) {
        return Err(NeoRiskError::NonFiniteState {
            time: f64::NAN,
            what: format!("position relative to {body}"),
        });
    }
    let r = relative_position.norm();
    let r3 = r * r * r;
    // r³ underflows to zero well before r does
    if r == 0.0 || r3 == 0.0 {
        return Err(NeoRiskError::SingularGravity {
            body: body.to_string(),
        });
    }
    let acc = -mu * relative_position / r3;
    if !acc.iter().all(|x| x.is_finite()) {
        return Err(NeoRiskError::SingularGravity {
            body: body.to_string(),
        });
    }
    Ok(acc)
}

/// A perturbing body: gravitational parameter plus ephemeris.
#[derive(Debug, Clone)]
pub struct ThirdBody {
    pub name: String,
    pub mu: f64,
    pub ephemeris: Arc<dyn Ephemeris>,
}

impl ThirdBody {
    pub fn new(name: impl Into<String>, mu: f64, ephemeris: Arc<dyn Ephemeris>) -> Self {
        ThirdBody {
            name: name.into(),
            mu,
            ephemeris,
        }
    }

    /// Direct plus indirect perturbation on an object at heliocentric `position`.
    pub fn perturbation(
        &self,
        position: &Vector3<f64>,
        t: Day,
    ) -> Result<Vector3<f64>, NeoRiskError> {
        let body_position = self.ephemeris.position(t);
        let direct = point_mass_acceleration(self.mu, &(position - body_position), &self.name)?;

        // −(−μ r_b/|r_b|³) = +μ r_b/|r_b|³
        let indirect = -point_mass_acceleration(self.mu, &body_position, &self.name)?;

        Ok(direct + indirect)
    }
}

/// Primary point mass plus a list of third-body perturbers.
///
/// Build with [`GravityModel::sun_earth`] for the standard heliocentric model,
/// [`GravityModel::two_body`] for the unperturbed Kepler problem, and extend with
/// [`GravityModel::with_third_body`].
#[derive(Debug, Clone)]
pub struct GravityModel {
    pub mu_primary: f64,
    pub third_bodies: Vec<ThirdBody>,
}

impl GravityModel {
    /// Primary body only.
    pub fn two_body(constants: &PhysicalConstants) -> Self {
        GravityModel {
            mu_primary: constants.mu_primary,
            third_bodies: Vec::new(),
        }
    }

    /// Sun plus an Earth perturber on [`CircularEphemeris::earth`].
    ///
    /// The perturber is omitted when `mu_secondary` is zero.
    pub fn sun_earth(constants: &PhysicalConstants) -> Self {
        let model = Self::two_body(constants);
        if constants.mu_secondary == 0.0 {
            return model;
        }
        model.with_third_body(ThirdBody::new(
            "Earth",
            constants.mu_secondary,
            Arc::new(CircularEphemeris::earth()),
        ))
    }

    pub fn with_third_body(mut self, body: ThirdBody) -> Self {
        self.third_bodies.push(body);
        self
    }

    /// Acceleration due to the primary alone.
    pub fn primary_acceleration(&self, position: &Vector3<f64>) -> Result<Vector3<f64>, NeoRiskError> {
        point_mass_acceleration(self.mu_primary, position, "primary")
    }
}

impl AccelerationField for GravityModel {
    fn acceleration(&self, position: &Vector3<f64>, t: Day) -> Result<Vector3<f64>, NeoRiskError> {
        if !position.iter().all(|x| x.is_finite()) {
            return Err(NeoRiskError::NonFiniteState {
                time: t,
                what: "position".into(),
            });
        }
        let mut acc = self.primary_acceleration(position)?;
        for body in &self.third_bodies {
            acc += body.perturbation(position, t)?;
        }
        Ok(acc)
    }
}
