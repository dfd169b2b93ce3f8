//! Camera coordinate normalization.
//!
//! Raw camera extrinsics from the recording rig use a different axis
//! convention than the scene. [`normalize_camera_pose`] applies the fixed
//! correction `Ry(+90°) · Rz(-90°)` and returns the pose in scene terms.

use crate::types::{Rotation, Translation};
use glam::{DMat3, DMat4, DQuat, DVec3};
use thiserror::Error;

/// Matrix entries smaller than this are snapped to exactly zero.
const SNAP_EPSILON: f64 = 1e-5;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("Quaternion ({x}, {y}, {z}, {w}) cannot be normalized")]
    DegenerateQuaternion { x: f64, y: f64, z: f64, w: f64 },
}

/// Unit of the angles passed to [`rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

impl AngleUnit {
    fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => angle.to_radians(),
        }
    }
}

/// Build a homogeneous rotation from optional per-axis angles.
///
/// Supplied axes are applied in x, y, z order (`I · Rx · Ry · Rz`); omitted
/// axes are skipped entirely. Near-zero entries of the result are snapped
/// to zero.
pub fn rotate(
    theta_x: Option<f64>,
    theta_y: Option<f64>,
    theta_z: Option<f64>,
    unit: AngleUnit,
) -> DMat4 {
    let mut rotation = DMat4::IDENTITY;
    if let Some(theta) = theta_x {
        rotation *= DMat4::from_rotation_x(unit.to_radians(theta));
    }
    if let Some(theta) = theta_y {
        rotation *= DMat4::from_rotation_y(unit.to_radians(theta));
    }
    if let Some(theta) = theta_z {
        rotation *= DMat4::from_rotation_z(unit.to_radians(theta));
    }
    snap_to_zero(rotation)
}

fn snap_to_zero(matrix: DMat4) -> DMat4 {
    let cols = matrix
        .to_cols_array()
        .map(|v| if v.abs() < SNAP_EPSILON { 0.0 } else { v });
    DMat4::from_cols_array(&cols)
}

/// The rig-to-scene axis correction, `Ry(+90°) · Rz(-90°)`.
pub fn camera_axis_correction() -> DMat4 {
    rotate(None, Some(90.0), Some(-90.0), AngleUnit::Degrees)
}

/// Express a raw camera pose in the scene convention.
///
/// The input quaternion is normalized before use, so small drift is
/// tolerated; a zero or non-finite quaternion is rejected.
pub fn normalize_camera_pose(
    quaternion: Rotation,
    position: Translation,
) -> Result<(Translation, Rotation), TransformError> {
    let raw = quaternion.to_dquat();
    let length = raw.length();
    if !length.is_finite() || length < f64::EPSILON {
        return Err(TransformError::DegenerateQuaternion {
            x: quaternion.x,
            y: quaternion.y,
            z: quaternion.z,
            w: quaternion.w,
        });
    }

    let rotation = DMat4::from_quat(raw / length) * camera_axis_correction();
    let pose = DMat4::from_translation(position.to_dvec3()) * rotation;

    let translation: DVec3 = pose.w_axis.truncate();
    let orientation = DQuat::from_mat3(&DMat3::from_mat4(pose)).normalize();
    Ok((translation.into(), orientation.into()))
}
