//! Geometry primitives shared by every stage of the pipeline.
//!
//! These are plain serde value types. Missing fields deserialize as zero so
//! partially specified calibration never fails to load; conversion helpers
//! bridge to `glam` double precision types for the actual math.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Translation {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Components as `[x, y, z]`.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<DVec3> for Translation {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// A rotation quaternion (x, y, z, w).
///
/// Values read from disk are taken as-is; a unit norm is expected but only
/// checked where it matters (see [`Rotation::is_unit`]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Euclidean norm of the four components.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// True when the norm is within `tolerance` of one.
    pub fn is_unit(&self, tolerance: f64) -> bool {
        (self.norm() - 1.0).abs() <= tolerance
    }

    pub fn to_dquat(self) -> DQuat {
        DQuat::from_xyzw(self.x, self.y, self.z, self.w)
    }
}

impl From<DQuat> for Rotation {
    fn from(q: DQuat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

/// Rigid pose of a sensor in the scene reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Extrinsic {
    pub rotation: Rotation,
    pub translation: Translation,
}

impl Extrinsic {
    pub fn new(rotation: Rotation, translation: Translation) -> Self {
        Self {
            rotation,
            translation,
        }
    }
}

/// Pinhole camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Intrinsic {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsic {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Read fx, fy, cx, cy out of a row-major 3x4 projection matrix.
    /// Entries past the end of `matrix` count as zero.
    pub fn from_projection_matrix(matrix: &[f64]) -> Self {
        let at = |i: usize| matrix.get(i).copied().unwrap_or(0.0);
        Self::new(at(0), at(5), at(2), at(6))
    }
}

/// Lens distortion coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub p1: f64,
    pub p2: f64,
}

impl Distortion {
    /// Coefficients in `[k1, k2, k3, p1, p2]` order; missing entries are zero.
    pub fn from_coefficients(coefficients: &[f64]) -> Self {
        let at = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        Self {
            k1: at(0),
            k2: at(1),
            k3: at(2),
            p1: at(3),
            p2: at(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_zero() {
        let rotation: Rotation = serde_json::from_str(r#"{"w": 1.0}"#).unwrap();
        assert_eq!(rotation, Rotation::IDENTITY);

        let extrinsic: Extrinsic = serde_json::from_str("{}").unwrap();
        assert_eq!(extrinsic.translation, Translation::default());
        assert_eq!(extrinsic.rotation.norm(), 0.0);
    }

    #[test]
    fn test_rotation_norm() {
        assert!(Rotation::IDENTITY.is_unit(1e-12));
        let r = Rotation::new(0.5, 0.5, 0.5, 0.5);
        assert!((r.norm() - 1.0).abs() < 1e-12);
        assert!(!Rotation::new(1.0, 1.0, 0.0, 0.0).is_unit(1e-6));
    }

    #[test]
    fn test_intrinsic_from_projection_matrix() {
        let matrix = [
            100.0, 0.0, 320.0, 0.0, //
            0.0, 200.0, 240.0, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        ];
        // cy is read from index 6 of the flattened matrix.
        let intrinsic = Intrinsic::from_projection_matrix(&matrix);
        assert_eq!(intrinsic, Intrinsic::new(100.0, 200.0, 320.0, 240.0));
    }

    #[test]
    fn test_short_distortion_pads_with_zero() {
        let d = Distortion::from_coefficients(&[0.1, 0.2]);
        assert_eq!(d.k1, 0.1);
        assert_eq!(d.k2, 0.2);
        assert_eq!(d.k3, 0.0);
        assert_eq!(d.p2, 0.0);
    }
}
