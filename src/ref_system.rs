//! Elementary rotations and the perifocal → inertial frame transform.
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::Radian;

/// Coordinate axis of an elementary rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Elementary (active, right-handed) rotation matrix of angle `alpha` about `axis`.
///
/// For `Axis::Z` this is
///
/// ```text
/// | cos α  −sin α  0 |
/// | sin α   cos α  0 |
/// |   0       0    1 |
/// ```
///
/// and for `Axis::X`
///
/// ```text
/// | 1    0       0    |
/// | 0  cos α  −sin α  |
/// | 0  sin α   cos α  |
/// ```
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotation taking perifocal (PQW) coordinates to the inertial frame.
///
/// The composition is `Rz(Ω) · Rx(i) · Rz(ω)`: first about Z by the argument of
/// periapsis, then about X by the inclination, then about Z by the ascending node.
///
/// Arguments
/// -----------------
/// * `ascending_node_longitude` – Ω (radians).
/// * `inclination` – i (radians).
/// * `periapsis_argument` – ω (radians).
pub fn perifocal_to_inertial(
    ascending_node_longitude: Radian,
    inclination: Radian,
    periapsis_argument: Radian,
) -> Matrix3<f64> {
    rotmt(ascending_node_longitude, Axis::Z)
        * rotmt(inclination, Axis::X)
        * rotmt(periapsis_argument, Axis::Z)
}
