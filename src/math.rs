//! Orientation Conversion
//!
//! The save file stores rotations as left-handed Unity-convention
//! quaternions; the editor works in intrinsic XYZ Euler angles. Crossing
//! between the two negates X and W and applies the viewport pivot
//! correction: +π on Y plus a Z sign flip. Dropping either half of the
//! correction still round-trips the raw data but puts every object on
//! screen facing the wrong way.
//!
//! Both directions are pure and total: NaN or infinite inputs flow through
//! to the output, they never panic.

use glam::{DQuat, EulerRot};
use std::f64::consts::PI;

use crate::sandbox::format::Quaternion;

/// Intrinsic XYZ Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EulerAngles {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// File-convention quaternion to editor Euler angles.
pub fn to_editor_euler(q: Quaternion) -> EulerAngles {
    let (x, y, z) = DQuat::from_xyzw(-q.x, q.y, q.z, -q.w).to_euler(EulerRot::XYZ);
    EulerAngles {
        x,
        y: y + PI,
        z: -z,
    }
}

/// Editor Euler angles back to a file-convention quaternion.
///
/// Algebraic inverse of [`to_editor_euler`] up to floating-point error.
/// The Euler extraction is sign-blind, so the round trip reproduces the
/// quaternion component-for-component on the sign class this function
/// produces, and the same rotation (q or -q) on the other.
pub fn to_file_quaternion(e: EulerAngles) -> Quaternion {
    let q = DQuat::from_euler(EulerRot::XYZ, e.x, e.y - PI, -e.z);
    Quaternion {
        x: -q.x,
        y: q.y,
        z: q.z,
        w: -q.w,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn assert_quat_close(a: Quaternion, b: Quaternion) {
        assert!(
            (a.x - b.x).abs() < EPSILON
                && (a.y - b.y).abs() < EPSILON
                && (a.z - b.z).abs() < EPSILON
                && (a.w - b.w).abs() < EPSILON,
            "quaternions differ: {:?} vs {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_quaternion_round_trip() {
        // Sample the editor's reachable angle space: X/Z free, Y centered on
        // the π pivot so the corrected middle angle stays in range.
        let free = [-2.4, -1.1, -0.3, 0.0, 0.5, 1.3, 2.7];
        let pivot = [PI - 1.3, PI - 0.6, PI, PI + 0.4, PI + 1.2];

        for &x in &free {
            for &y in &pivot {
                for &z in &free {
                    let q = to_file_quaternion(EulerAngles::new(x, y, z));
                    let round = to_file_quaternion(to_editor_euler(q));
                    assert_quat_close(round, q);
                }
            }
        }
    }

    #[test]
    fn test_euler_recovery() {
        let e = EulerAngles::new(0.7, PI - 0.4, -1.1);
        let back = to_editor_euler(to_file_quaternion(e));

        assert!((back.x - e.x).abs() < EPSILON);
        assert!((back.y - e.y).abs() < EPSILON);
        assert!((back.z - e.z).abs() < EPSILON);
    }

    #[test]
    fn test_pivot_correction_applied() {
        // A no-rotation file quaternion must come out as a π yaw in editor
        // space; that offset is the pivot correction.
        let e = to_editor_euler(Quaternion::new(0.0, 0.0, 0.0, -1.0));

        assert!(e.x.abs() < EPSILON);
        assert!((e.y - PI).abs() < EPSILON);
        assert!(e.z.abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_preserves_rotation_for_any_sign() {
        // Arbitrary-sign quaternions may come back negated; the rotation they
        // encode must survive. |dot| == 1 means same rotation for unit quats.
        let samples = [
            Quaternion::new(0.0, 0.0, 0.0, 1.0),
            Quaternion::new(0.0, 0.7071067811865476, 0.0, 0.7071067811865476),
            Quaternion::new(0.5, -0.5, 0.5, -0.5),
            Quaternion::new(-0.18257418583505536, 0.3651483716701107, -0.5477225575051661, 0.7302967433402214),
        ];

        for &q in &samples {
            let r = to_file_quaternion(to_editor_euler(q));
            let dot = q.x * r.x + q.y * r.y + q.z * r.z + q.w * r.w;
            assert!(
                (dot.abs() - 1.0).abs() < EPSILON,
                "rotation changed for {:?}: dot {}",
                q,
                dot
            );
        }
    }

    #[test]
    fn test_non_finite_propagates() {
        let e = to_editor_euler(Quaternion::new(f64::NAN, 0.0, 0.0, 1.0));
        assert!(e.x.is_nan() || e.y.is_nan() || e.z.is_nan());

        let q = to_file_quaternion(EulerAngles::new(f64::INFINITY, 0.0, 0.0));
        assert!(q.x.is_nan() || q.w.is_nan() || q.x.is_infinite() || q.w.is_infinite());
    }
}
