//! Scene Adapter Seam
//!
//! `SceneAdapter` is the per-application binding that actually reads and
//! mutates the host scene. The required capability set — playback, camera
//! access, at least one capture strategy, look-through — is required trait
//! methods; the optional set — connection feedback, scripting — lives in
//! separate traits surfaced through accessor methods, so the dispatcher can
//! query presence explicitly instead of guessing from no-op defaults.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::core::transform::Transform;
use crate::core::{
    BridgeError, BridgeResult, CameraName, CaptureConfig, KeyFlags, PlaybackState, Resolution,
};

mod memory;
pub use memory::{FeedbackLog, MemoryScene};

// =============================================================================
// Capabilities
// =============================================================================

/// Optional capabilities a scene adapter may provide beyond the required set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// User-facing notifications about the remote session
    ConnectionFeedback,
    /// Custom action table invokable from the remote client
    Scripting,
}

// =============================================================================
// Scene Adapter
// =============================================================================

/// Per-application scene binding.
///
/// All methods are invoked on the single scene execution context managed by
/// the dispatcher, never concurrently. An adapter must serve at least one of
/// the three capture strategies; the unimplemented ones keep their
/// `NotSupported` defaults and any session negotiated onto them fails fast.
pub trait SceneAdapter: Send {
    // --- playback ---

    /// Playback state as (current frame, range start, range end)
    fn playback_state(&self) -> BridgeResult<PlaybackState>;

    /// Scene playback rate in frames per second
    fn playback_fps(&self) -> BridgeResult<f64>;

    /// Sets the current frame number
    fn set_frame(&mut self, frame: f64) -> BridgeResult<()>;

    /// Sets the animation frame range; any two finite values are legal
    fn set_playback_range(&mut self, start: f64, end: f64) -> BridgeResult<()>;

    /// Reserved forward-compatibility hook; implementations may ignore it
    fn start_playback(&mut self, _forward: bool) -> BridgeResult<()> {
        Ok(())
    }

    /// Reserved forward-compatibility hook; implementations may ignore it
    fn stop_playback(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    // --- cameras ---

    /// Names of all scene cameras, stable for the duration of the call
    fn camera_names(&self) -> BridgeResult<Vec<CameraName>>;

    /// Checks if the named camera exists in the scene
    fn camera_exists(&self, name: &str) -> BridgeResult<bool>;

    /// Which of the camera's animatable channels hold keyframes
    fn camera_key_flags(&self, name: &str) -> BridgeResult<KeyFlags>;

    /// Focal length of the named camera
    fn camera_focal_length(&self, name: &str) -> BridgeResult<f64>;

    /// Camera transform in the scene's own axis convention
    fn camera_transform(&self, name: &str) -> BridgeResult<Transform>;

    fn set_camera_focal_length(&mut self, name: &str, focal_length: f64) -> BridgeResult<()>;

    fn set_camera_transform(&mut self, name: &str, transform: &Transform) -> BridgeResult<()>;

    /// Writes focal-length keyframes. The parallel slices are pre-validated
    /// to equal length; the batch must be applied atomically.
    fn set_focal_length_keys(
        &mut self,
        name: &str,
        frames: &[f64],
        values: &[f64],
    ) -> BridgeResult<()>;

    /// Writes transform keyframes. The parallel slices are pre-validated to
    /// equal length; the batch must be applied atomically.
    fn set_transform_keys(
        &mut self,
        name: &str,
        frames: &[f64],
        values: &[Transform],
    ) -> BridgeResult<()>;

    /// Clears transform and focal-length keyframes; must be idempotent
    fn remove_camera_keys(&mut self, name: &str) -> BridgeResult<()>;

    /// Creates a new camera and returns its name, which must not collide
    /// with any existing camera
    fn create_camera(&mut self) -> BridgeResult<CameraName>;

    /// Sets the host viewport to look through the named camera
    fn look_through_camera(&mut self, name: &str) -> BridgeResult<()>;

    // --- viewport capture ---

    /// Fixes capture mode, initial resolution and flip for the lifetime of
    /// the session about to start
    fn capture_will_start(&mut self) -> BridgeResult<CaptureConfig>;

    /// Called when the capture session ends; release render hooks here
    fn capture_did_end(&mut self) {}

    /// Current size of the capture target, re-checked before every frame
    fn viewport_size(&mut self, camera: &str) -> BridgeResult<Resolution>;

    /// ScreenshotRegion mode: top-left origin of the screen region
    fn capture_origin(&mut self, _camera: &str) -> BridgeResult<(f64, f64)> {
        Err(BridgeError::NotSupported(
            "screenshot-region capture".to_string(),
        ))
    }

    /// Buffer mode: a freshly owned snapshot; must not alias earlier returns
    fn capture_frame(&mut self, _camera: &str) -> BridgeResult<Vec<u8>> {
        Err(BridgeError::NotSupported("buffer capture".to_string()))
    }

    /// BufferPointer mode: fill `buffer` with exactly one frame of pixels
    fn fill_frame(&mut self, _camera: &str, _buffer: &mut [u8]) -> BridgeResult<()> {
        Err(BridgeError::NotSupported(
            "buffer-pointer capture".to_string(),
        ))
    }

    // --- optional capabilities ---

    /// Scripting capability, when provided
    fn scripts(&mut self) -> Option<&mut dyn ScriptHost> {
        None
    }

    /// Connection-feedback capability, when provided
    fn feedback(&mut self) -> Option<&mut dyn SessionFeedback> {
        None
    }
}

// =============================================================================
// Optional Capability Traits
// =============================================================================

/// Ordered custom actions addressable by listing index
pub trait ScriptHost {
    /// Labels in listing order; the order binds indices for `run_script`
    fn script_labels(&self) -> Vec<String>;

    /// Runs the script at `index`, valid for the most recent listing
    fn run_script(&mut self, index: usize, current_camera: &str) -> BridgeResult<()>;
}

/// User-facing notifications about the remote session
pub trait SessionFeedback {
    fn client_connected(&mut self, _ip: &str, _port: u16) {}

    fn client_disconnected(&mut self) {}

    fn current_camera_changed(&mut self, _camera: &str) {}

    /// Fires once all services have fully stopped; teardown is asynchronous
    fn server_did_stop(&mut self) {}
}

// =============================================================================
// Shared Handle
// =============================================================================

/// Scene adapter shared across the bridge components; locked per operation.
/// The dispatcher serializes all access, so the lock is never contended.
pub type SharedScene = Arc<Mutex<Box<dyn SceneAdapter>>>;

/// Wraps an adapter for use by the bridge components
pub fn shared(adapter: impl SceneAdapter + 'static) -> SharedScene {
    Arc::new(Mutex::new(Box::new(adapter)))
}

/// Resolves a camera name, failing with `NotFound` for unknown names
pub(crate) fn ensure_camera(scene: &dyn SceneAdapter, name: &str) -> BridgeResult<()> {
    if scene.camera_exists(name)? {
        Ok(())
    } else {
        Err(BridgeError::NotFound(name.to_string()))
    }
}
