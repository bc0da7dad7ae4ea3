//! Transform Codec
//!
//! Canonical 4x4 rigid transform representation and axis-convention
//! conversion. The wire layout is row-major with the rotation block in the
//! upper-left 3x3, translation in the last row and the last column fixed to
//! (0, 0, 0, 1); the up axis on the wire is always Y+.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::core::{BridgeError, BridgeResult};

/// Tolerance for accepting a rotation block as orthonormal
pub const RIGID_TOLERANCE: f64 = 1e-4;

/// Axis conventions understood by the codec
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Convention {
    /// Up axis Y+ (wire canonical; Maya-family scenes)
    YUp,
    /// Up axis Z+ (Blender-family scenes)
    ZUp,
}

/// Signed axis permutation taking coordinates from one convention to another.
/// `index[i]` selects the source axis feeding target axis `i`, negated when
/// `sign[i]` is -1.
struct AxisMap {
    index: [usize; 3],
    sign: [f64; 3],
}

impl AxisMap {
    /// Y-up (a, b, c) reads as Z-up (a, -c, b)
    const Y_TO_Z: AxisMap = AxisMap {
        index: [0, 2, 1],
        sign: [1.0, -1.0, 1.0],
    };

    /// Z-up (a, b, c) reads as Y-up (a, c, -b)
    const Z_TO_Y: AxisMap = AxisMap {
        index: [0, 2, 1],
        sign: [1.0, 1.0, -1.0],
    };

    fn between(source: Convention, target: Convention) -> Option<AxisMap> {
        match (source, target) {
            (Convention::YUp, Convention::ZUp) => Some(Self::Y_TO_Z),
            (Convention::ZUp, Convention::YUp) => Some(Self::Z_TO_Y),
            _ => None,
        }
    }
}

// =============================================================================
// Transform
// =============================================================================

/// Row-major 4x4 rigid transform
///
/// Construction validates rigidity, so a `Transform` value always carries an
/// orthonormal rotation block and a fixed (0, 0, 0, 1) last column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform([f64; 16]);

impl Transform {
    pub const IDENTITY: Transform = Transform([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Validates and wraps a row-major 16-element matrix
    pub fn from_elements(elements: [f64; 16]) -> BridgeResult<Self> {
        validate_rigid(&elements)?;
        Ok(Self(elements))
    }

    /// The row-major elements, translation in indices 12..15
    pub fn elements(&self) -> [f64; 16] {
        self.0
    }

    pub fn as_slice(&self) -> &[f64; 16] {
        &self.0
    }

    /// Translation row
    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.0[12], self.0[13], self.0[14])
    }

    /// Converts between axis conventions without mutating the input.
    ///
    /// The rotation block is conjugated by a signed axis permutation, so
    /// orthonormality is preserved exactly and converting back reproduces
    /// the original.
    pub fn converted(&self, source: Convention, target: Convention) -> Self {
        let Some(map) = AxisMap::between(source, target) else {
            return *self;
        };

        let e = &self.0;
        let mut out = [0.0; 16];
        out[15] = 1.0;
        for i in 0..3 {
            for j in 0..3 {
                out[i * 4 + j] = map.sign[i] * map.sign[j] * e[map.index[i] * 4 + map.index[j]];
            }
            out[12 + i] = map.sign[i] * e[12 + map.index[i]];
        }
        Self(out)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Validates and converts a raw row-major matrix between conventions.
///
/// Boundary entry point for callers holding plain 16-float payloads; fails
/// with a validation error if the input is not a rigid transform.
pub fn convert_elements(
    elements: &[f64; 16],
    source: Convention,
    target: Convention,
) -> BridgeResult<[f64; 16]> {
    let transform = Transform::from_elements(*elements)?;
    Ok(transform.converted(source, target).elements())
}

fn validate_rigid(e: &[f64; 16]) -> BridgeResult<()> {
    for (i, v) in e.iter().enumerate() {
        if !v.is_finite() {
            return Err(BridgeError::Validation(format!(
                "matrix element {i} is not finite"
            )));
        }
    }

    if e[3].abs() > RIGID_TOLERANCE
        || e[7].abs() > RIGID_TOLERANCE
        || e[11].abs() > RIGID_TOLERANCE
        || (e[15] - 1.0).abs() > RIGID_TOLERANCE
    {
        return Err(BridgeError::Validation(
            "last matrix column must be (0, 0, 0, 1)".to_string(),
        ));
    }

    let r0 = DVec3::new(e[0], e[1], e[2]);
    let r1 = DVec3::new(e[4], e[5], e[6]);
    let r2 = DVec3::new(e[8], e[9], e[10]);

    let unit = (r0.length_squared() - 1.0).abs() <= RIGID_TOLERANCE
        && (r1.length_squared() - 1.0).abs() <= RIGID_TOLERANCE
        && (r2.length_squared() - 1.0).abs() <= RIGID_TOLERANCE;
    let orthogonal = r0.dot(r1).abs() <= RIGID_TOLERANCE
        && r0.dot(r2).abs() <= RIGID_TOLERANCE
        && r1.dot(r2).abs() <= RIGID_TOLERANCE;
    if !unit || !orthogonal {
        return Err(BridgeError::Validation(
            "rotation block is not orthonormal".to_string(),
        ));
    }

    // Orthonormal with det -1 would be a reflection, not a rotation.
    let det = r0.cross(r1).dot(r2);
    if (det - 1.0).abs() > RIGID_TOLERANCE {
        return Err(BridgeError::Validation(
            "rotation block is a reflection".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated_transform() -> Transform {
        // 45 degrees about the X axis, translated to (1, 2, 3)
        let c = (0.5f64).sqrt();
        Transform::from_elements([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, c, 0.0, //
            0.0, -c, c, 0.0, //
            1.0, 2.0, 3.0, 1.0,
        ])
        .unwrap()
    }

    #[test]
    fn test_identity_is_rigid() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
        assert_eq!(Transform::IDENTITY.translation(), DVec3::ZERO);
    }

    #[test]
    fn test_same_convention_is_unchanged() {
        let m = rotated_transform();
        assert_eq!(m.converted(Convention::YUp, Convention::YUp), m);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let m = rotated_transform();
        let there = m.converted(Convention::YUp, Convention::ZUp);
        let back = there.converted(Convention::ZUp, Convention::YUp);
        for (a, b) in m.elements().iter().zip(back.elements().iter()) {
            assert!((a - b).abs() <= 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_up_axis_translation_mapping() {
        // A camera 5 units up in Y-up is 5 units up in Z-up
        let m = Transform::from_elements([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 5.0, 0.0, 1.0,
        ])
        .unwrap();
        let converted = m.converted(Convention::YUp, Convention::ZUp);
        assert_eq!(converted.translation(), DVec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_conversion_preserves_rigidity() {
        let m = rotated_transform();
        let converted = m.converted(Convention::YUp, Convention::ZUp);
        assert!(Transform::from_elements(converted.elements()).is_ok());
    }

    #[test]
    fn test_convert_elements_validates_input() {
        let mut scaled = Transform::IDENTITY.elements();
        scaled[0] = 2.0;
        let result = convert_elements(&scaled, Convention::YUp, Convention::ZUp);
        assert!(matches!(result, Err(crate::core::BridgeError::Validation(_))));
    }

    #[test]
    fn test_reflection_rejected() {
        let reflection = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        assert!(Transform::from_elements(reflection).is_err());
    }

    #[test]
    fn test_last_column_enforced() {
        let mut skewed = Transform::IDENTITY.elements();
        skewed[3] = 0.5;
        assert!(Transform::from_elements(skewed).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut bad = Transform::IDENTITY.elements();
        bad[5] = f64::NAN;
        assert!(Transform::from_elements(bad).is_err());
    }

    #[test]
    fn test_serialization_round_trip() {
        let m = rotated_transform();
        let json = serde_json::to_string(&m).unwrap();
        let parsed: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
