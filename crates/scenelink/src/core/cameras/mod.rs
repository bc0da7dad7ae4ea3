//! Camera Registry
//!
//! Tracks camera identities and per-camera animation-presence flags. All
//! storage lives in the host scene; the registry resolves names and
//! validates values before anything reaches the adapter, so an unknown name
//! or a bad value never leaves a partial mutation behind.

use crate::core::scene::{ensure_camera, SharedScene};
use crate::core::transform::Transform;
use crate::core::{BridgeError, BridgeResult, CameraName, KeyFlags};

pub struct CameraRegistry {
    scene: SharedScene,
}

impl CameraRegistry {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }

    /// Names of all scene cameras. The listing order is the adapter's;
    /// it is stable for the duration of this single call.
    pub fn list(&self) -> BridgeResult<Vec<CameraName>> {
        self.scene.lock().unwrap().camera_names()
    }

    /// Checks if the named camera exists
    pub fn exists(&self, name: &str) -> BridgeResult<bool> {
        self.scene.lock().unwrap().camera_exists(name)
    }

    /// Which animatable channels of the camera hold keyframes
    pub fn has_keys(&self, name: &str) -> BridgeResult<KeyFlags> {
        let scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), name)?;
        scene.camera_key_flags(name)
    }

    /// Focal length of the named camera
    pub fn focal_length(&self, name: &str) -> BridgeResult<f64> {
        let scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), name)?;
        scene.camera_focal_length(name)
    }

    /// Transform of the named camera
    pub fn transform(&self, name: &str) -> BridgeResult<Transform> {
        let scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), name)?;
        scene.camera_transform(name)
    }

    /// Sets the focal length; the value must be positive and finite
    pub fn set_focal_length(&self, name: &str, focal_length: f64) -> BridgeResult<()> {
        if !focal_length.is_finite() || focal_length <= 0.0 {
            return Err(BridgeError::Validation(format!(
                "focal length must be a positive finite value, got {focal_length}"
            )));
        }
        let mut scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), name)?;
        scene.set_camera_focal_length(name, focal_length)
    }

    /// Sets the camera transform
    pub fn set_transform(&self, name: &str, transform: &Transform) -> BridgeResult<()> {
        let mut scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), name)?;
        scene.set_camera_transform(name, transform)
    }

    /// Creates a new camera, enforcing that the adapter returned a name not
    /// previously in the registry
    pub fn create(&self) -> BridgeResult<CameraName> {
        let mut scene = self.scene.lock().unwrap();
        let before = scene.camera_names()?;
        let name = scene.create_camera()?;
        if before.iter().any(|n| n == &name) {
            return Err(BridgeError::Scene(format!(
                "adapter returned existing camera name '{name}' from create"
            )));
        }
        Ok(name)
    }

    /// Sets the host viewport to look through the named camera
    pub fn look_through(&self, name: &str) -> BridgeResult<()> {
        let mut scene = self.scene.lock().unwrap();
        ensure_camera(scene.as_ref(), name)?;
        scene.look_through_camera(name)
    }
}

// =============================================================================
// Tests
// =============================================================================
