//! Keyframe Synchronizer
//!
//! Batch keyframe writes for camera transform and focal length. Writes are
//! all-or-nothing: every precondition is checked before the scene sees the
//! batch, so a failed call leaves prior keyframe state completely
//! unchanged. Partial application would silently corrupt animation curves.

use crate::core::scene::{ensure_camera, SharedScene};
use crate::core::transform::Transform;
use crate::core::{BridgeError, BridgeResult};

pub struct KeyframeSynchronizer {
    scene: SharedScene,
}

impl KeyframeSynchronizer {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }

    /// Writes focal-length keyframes from parallel frame/value sequences
    pub fn set_focal_keys(&self, camera: &str, frames: &[f64], values: &[f64]) -> BridgeResult<()> {
        check_parallel_lengths(frames.len(), values.len())?;
        check_frames(frames)?;
        for value in values {
            if !value.is_finite() || *value <= 0.0 {
                return Err(BridgeError::Validation(format!(
                    "focal length keys must be positive finite values, got {value}"
                )));
            }
        }

        let mut scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), camera)?;
        scene.set_focal_length_keys(camera, frames, values)
    }

    /// Writes transform keyframes from parallel frame/matrix sequences
    pub fn set_transform_keys(
        &self,
        camera: &str,
        frames: &[f64],
        values: &[Transform],
    ) -> BridgeResult<()> {
        check_parallel_lengths(frames.len(), values.len())?;
        check_frames(frames)?;

        let mut scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), camera)?;
        scene.set_transform_keys(camera, frames, values)
    }

    /// Clears transform and focal-length keyframes unconditionally.
    /// Idempotent: removing keys from an unkeyed camera is not an error.
    pub fn remove_keys(&self, camera: &str) -> BridgeResult<()> {
        let mut scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), camera)?;
        scene.remove_camera_keys(camera)
    }
}

fn check_parallel_lengths(frames: usize, values: usize) -> BridgeResult<()> {
    if frames != values {
        return Err(BridgeError::Validation(format!(
            "parallel keyframe sequences differ in length: {frames} frames vs {values} values"
        )));
    }
    Ok(())
}

fn check_frames(frames: &[f64]) -> BridgeResult<()> {
    for frame in frames {
        if !frame.is_finite() {
            return Err(BridgeError::Validation(format!(
                "keyframe frame number {frame} is not finite"
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cameras::CameraRegistry;
    use crate::core::scene::{shared, MemoryScene, SharedScene};
    use crate::core::KeyFlags;

    fn scene() -> SharedScene {
        shared(MemoryScene::new().with_camera("Cam"))
    }

    #[test]
    fn test_focal_keys_then_remove() {
        let scene = scene();
        let keyframes = KeyframeSynchronizer::new(scene.clone());
        let registry = CameraRegistry::new(scene);

        keyframes
            .set_focal_keys("Cam", &[1.0, 2.0, 3.0], &[35.0, 50.0, 85.0])
            .unwrap();
        assert_eq!(registry.has_keys("Cam").unwrap(), KeyFlags::new(false, true));

        keyframes.remove_keys("Cam").unwrap();
        assert_eq!(registry.has_keys("Cam").unwrap(), KeyFlags::NONE);
    }

    #[test]
    fn test_transform_keys_then_remove() {
        let scene = scene();
        let keyframes = KeyframeSynchronizer::new(scene.clone());
        let registry = CameraRegistry::new(scene);

        keyframes
            .set_transform_keys("Cam", &[1.0, 10.0], &[Transform::IDENTITY, Transform::IDENTITY])
            .unwrap();
        assert_eq!(registry.has_keys("Cam").unwrap(), KeyFlags::new(true, false));

        keyframes.remove_keys("Cam").unwrap();
        assert_eq!(registry.has_keys("Cam").unwrap(), KeyFlags::NONE);
    }

    #[test]
    fn test_length_mismatch_leaves_state_unchanged() {
        let scene = scene();
        let keyframes = KeyframeSynchronizer::new(scene.clone());
        let registry = CameraRegistry::new(scene);

        keyframes.set_focal_keys("Cam", &[1.0], &[50.0]).unwrap();
        let before = registry.has_keys("Cam").unwrap();

        let result = keyframes.set_focal_keys("Cam", &[1.0, 2.0, 3.0], &[10.0, 20.0]);
        assert!(matches!(result, Err(BridgeError::Validation(_))));
        assert_eq!(registry.has_keys("Cam").unwrap(), before);
    }

    #[test]
    fn test_transform_length_mismatch_rejected() {
        let keyframes = KeyframeSynchronizer::new(scene());
        let result = keyframes.set_transform_keys("Cam", &[1.0, 2.0], &[Transform::IDENTITY]);
        assert!(matches!(result, Err(BridgeError::Validation(_))));
    }

    #[test]
    fn test_non_finite_frames_rejected() {
        let keyframes = KeyframeSynchronizer::new(scene());
        let result = keyframes.set_focal_keys("Cam", &[f64::INFINITY], &[50.0]);
        assert!(matches!(result, Err(BridgeError::Validation(_))));
    }

    #[test]
    fn test_non_positive_focal_values_rejected() {
        let keyframes = KeyframeSynchronizer::new(scene());
        let result = keyframes.set_focal_keys("Cam", &[1.0], &[0.0]);
        assert!(matches!(result, Err(BridgeError::Validation(_))));
    }

    #[test]
    fn test_remove_keys_is_idempotent() {
        let keyframes = KeyframeSynchronizer::new(scene());
        keyframes.remove_keys("Cam").unwrap();
        keyframes.remove_keys("Cam").unwrap();
    }

    #[test]
    fn test_unknown_camera_is_not_found() {
        let keyframes = KeyframeSynchronizer::new(scene());
        assert!(matches!(
            keyframes.remove_keys("Ghost"),
            Err(BridgeError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_batch_is_accepted() {
        let scene = scene();
        let keyframes = KeyframeSynchronizer::new(scene.clone());
        let registry = CameraRegistry::new(scene);

        keyframes.set_focal_keys("Cam", &[], &[]).unwrap();
        assert_eq!(registry.has_keys("Cam").unwrap(), KeyFlags::NONE);
    }
}
