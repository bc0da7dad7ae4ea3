//! In-Memory Scene Adapter
//!
//! A self-contained scene model implementing the full adapter surface, used
//! by the test suite and the headless CLI. Capture payloads are filled with
//! a rolling counter so consecutive frames are distinguishable, and the
//! viewport/failure handles let a driver change the capture target or
//! inject a scene failure while the adapter is owned by the bridge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::transform::Transform;
use crate::core::{
    BridgeError, BridgeResult, CameraName, CaptureConfig, CaptureMode, KeyFlags, PlaybackState,
    Resolution,
};

use super::{SceneAdapter, ScriptHost, SessionFeedback};

const DEFAULT_FOCAL_LENGTH: f64 = 35.0;
const DEFAULT_FPS: f64 = 24.0;

/// Feedback notifications recorded by the scene, observable from outside
pub type FeedbackLog = Arc<Mutex<Vec<String>>>;

/// One camera in the in-memory scene
#[derive(Clone, Debug)]
struct MemoryCamera {
    name: String,
    focal_length: f64,
    transform: Transform,
    transform_keys: Vec<(f64, Transform)>,
    focal_keys: Vec<(f64, f64)>,
}

impl MemoryCamera {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            focal_length: DEFAULT_FOCAL_LENGTH,
            transform: Transform::IDENTITY,
            transform_keys: Vec::new(),
            focal_keys: Vec::new(),
        }
    }
}

/// A custom action registered with the in-memory scene
#[derive(Clone, Debug)]
struct ScriptSlot {
    label: String,
    succeeds: bool,
}

/// In-memory reference implementation of [`SceneAdapter`]
pub struct MemoryScene {
    cameras: Vec<MemoryCamera>,
    playback: PlaybackState,
    fps: f64,
    look_through: Option<CameraName>,
    created_count: usize,
    capture_config: CaptureConfig,
    origin: (f64, f64),
    viewport: Arc<Mutex<Resolution>>,
    fail_requests: Arc<AtomicBool>,
    frame_counter: u8,
    capturing: bool,
    scripts: Vec<ScriptSlot>,
    feedback_log: Option<FeedbackLog>,
}

impl MemoryScene {
    pub fn new() -> Self {
        let config = CaptureConfig::new(CaptureMode::Buffer, 640, 480);
        Self {
            cameras: Vec::new(),
            playback: PlaybackState::new(1.0, 1.0, 250.0),
            fps: DEFAULT_FPS,
            look_through: None,
            created_count: 0,
            capture_config: config,
            origin: (0.0, 0.0),
            viewport: Arc::new(Mutex::new(config.resolution)),
            fail_requests: Arc::new(AtomicBool::new(false)),
            frame_counter: 0,
            capturing: false,
            scripts: Vec::new(),
            feedback_log: None,
        }
    }

    /// Adds a camera with default transform and focal length
    pub fn with_camera(mut self, name: &str) -> Self {
        self.cameras.push(MemoryCamera::new(name));
        self
    }

    /// Sets the capture negotiation the scene will report at capture start
    pub fn with_capture(mut self, config: CaptureConfig) -> Self {
        self.capture_config = config;
        *self.viewport.lock().unwrap() = config.resolution;
        self
    }

    /// Sets the screen origin reported in ScreenshotRegion mode
    pub fn with_capture_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Registers a custom action, enabling the scripting capability
    pub fn with_script(mut self, label: &str, succeeds: bool) -> Self {
        self.scripts.push(ScriptSlot {
            label: label.to_string(),
            succeeds,
        });
        self
    }

    /// Enables the connection-feedback capability; notifications are
    /// appended to the returned log
    pub fn enable_feedback(&mut self) -> FeedbackLog {
        let log: FeedbackLog = Arc::new(Mutex::new(Vec::new()));
        self.feedback_log = Some(log.clone());
        log
    }

    /// Handle to the capture-target size, mutable while the scene is owned
    /// by the bridge
    pub fn viewport_handle(&self) -> Arc<Mutex<Resolution>> {
        self.viewport.clone()
    }

    /// Handle that makes the next capture request fail when set
    pub fn failure_handle(&self) -> Arc<AtomicBool> {
        self.fail_requests.clone()
    }

    /// Camera the viewport is currently looking through, if any
    pub fn looking_through(&self) -> Option<&str> {
        self.look_through.as_deref()
    }

    /// Checks if a capture session is active on this scene
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn camera(&self, name: &str) -> BridgeResult<&MemoryCamera> {
        self.cameras
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| BridgeError::NotFound(name.to_string()))
    }

    fn camera_mut(&mut self, name: &str) -> BridgeResult<&mut MemoryCamera> {
        self.cameras
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| BridgeError::NotFound(name.to_string()))
    }

    fn next_byte(&mut self) -> u8 {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        self.frame_counter
    }

    fn check_capture_failure(&self) -> BridgeResult<()> {
        if self.fail_requests.swap(false, Ordering::SeqCst) {
            Err(BridgeError::Scene("viewport capture failed".to_string()))
        } else {
            Ok(())
        }
    }

    fn record_feedback(&mut self, line: String) {
        if let Some(log) = &self.feedback_log {
            log.lock().unwrap().push(line);
        }
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts into a frame-ordered keyframe set, replacing an existing key on
/// the same frame
fn insert_key<T>(keys: &mut Vec<(f64, T)>, frame: f64, value: T) {
    match keys.binary_search_by(|(f, _)| f.total_cmp(&frame)) {
        Ok(i) => keys[i].1 = value,
        Err(i) => keys.insert(i, (frame, value)),
    }
}

impl SceneAdapter for MemoryScene {
    fn playback_state(&self) -> BridgeResult<PlaybackState> {
        Ok(self.playback)
    }

    fn playback_fps(&self) -> BridgeResult<f64> {
        Ok(self.fps)
    }

    fn set_frame(&mut self, frame: f64) -> BridgeResult<()> {
        self.playback.current_frame = frame;
        Ok(())
    }

    fn set_playback_range(&mut self, start: f64, end: f64) -> BridgeResult<()> {
        self.playback.range_start = start;
        self.playback.range_end = end;
        Ok(())
    }

    fn camera_names(&self) -> BridgeResult<Vec<CameraName>> {
        Ok(self.cameras.iter().map(|c| c.name.clone()).collect())
    }

    fn camera_exists(&self, name: &str) -> BridgeResult<bool> {
        Ok(self.cameras.iter().any(|c| c.name == name))
    }

    fn camera_key_flags(&self, name: &str) -> BridgeResult<KeyFlags> {
        let camera = self.camera(name)?;
        Ok(KeyFlags::new(
            !camera.transform_keys.is_empty(),
            !camera.focal_keys.is_empty(),
        ))
    }

    fn camera_focal_length(&self, name: &str) -> BridgeResult<f64> {
        Ok(self.camera(name)?.focal_length)
    }

    fn camera_transform(&self, name: &str) -> BridgeResult<Transform> {
        Ok(self.camera(name)?.transform)
    }

    fn set_camera_focal_length(&mut self, name: &str, focal_length: f64) -> BridgeResult<()> {
        self.camera_mut(name)?.focal_length = focal_length;
        Ok(())
    }

    fn set_camera_transform(&mut self, name: &str, transform: &Transform) -> BridgeResult<()> {
        self.camera_mut(name)?.transform = *transform;
        Ok(())
    }

    fn set_focal_length_keys(
        &mut self,
        name: &str,
        frames: &[f64],
        values: &[f64],
    ) -> BridgeResult<()> {
        let camera = self.camera_mut(name)?;
        for (frame, value) in frames.iter().zip(values.iter()) {
            insert_key(&mut camera.focal_keys, *frame, *value);
        }
        Ok(())
    }

    fn set_transform_keys(
        &mut self,
        name: &str,
        frames: &[f64],
        values: &[Transform],
    ) -> BridgeResult<()> {
        let camera = self.camera_mut(name)?;
        for (frame, value) in frames.iter().zip(values.iter()) {
            insert_key(&mut camera.transform_keys, *frame, *value);
        }
        Ok(())
    }

    fn remove_camera_keys(&mut self, name: &str) -> BridgeResult<()> {
        let camera = self.camera_mut(name)?;
        camera.transform_keys.clear();
        camera.focal_keys.clear();
        Ok(())
    }

    fn create_camera(&mut self) -> BridgeResult<CameraName> {
        loop {
            self.created_count += 1;
            let name = format!("RemoteCam{}", self.created_count);
            if !self.cameras.iter().any(|c| c.name == name) {
                self.cameras.push(MemoryCamera::new(&name));
                return Ok(name);
            }
        }
    }

    fn look_through_camera(&mut self, name: &str) -> BridgeResult<()> {
        self.camera(name)?;
        self.look_through = Some(name.to_string());
        Ok(())
    }

    fn capture_will_start(&mut self) -> BridgeResult<CaptureConfig> {
        self.capturing = true;
        Ok(self.capture_config)
    }

    fn capture_did_end(&mut self) {
        self.capturing = false;
    }

    fn viewport_size(&mut self, _camera: &str) -> BridgeResult<Resolution> {
        Ok(*self.viewport.lock().unwrap())
    }

    fn capture_origin(&mut self, _camera: &str) -> BridgeResult<(f64, f64)> {
        self.check_capture_failure()?;
        Ok(self.origin)
    }

    fn capture_frame(&mut self, _camera: &str) -> BridgeResult<Vec<u8>> {
        self.check_capture_failure()?;
        let len = self.viewport.lock().unwrap().byte_len();
        let fill = self.next_byte();
        Ok(vec![fill; len])
    }

    fn fill_frame(&mut self, _camera: &str, buffer: &mut [u8]) -> BridgeResult<()> {
        self.check_capture_failure()?;
        let fill = self.next_byte();
        buffer.fill(fill);
        Ok(())
    }

    fn scripts(&mut self) -> Option<&mut dyn ScriptHost> {
        if self.scripts.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    fn feedback(&mut self) -> Option<&mut dyn SessionFeedback> {
        if self.feedback_log.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl ScriptHost for MemoryScene {
    fn script_labels(&self) -> Vec<String> {
        self.scripts.iter().map(|s| s.label.clone()).collect()
    }

    fn run_script(&mut self, index: usize, _current_camera: &str) -> BridgeResult<()> {
        let slot = self
            .scripts
            .get(index)
            .ok_or_else(|| BridgeError::Validation(format!("no script at index {index}")))?;
        if slot.succeeds {
            Ok(())
        } else {
            Err(BridgeError::Scene(format!(
                "script '{}' raised an error",
                slot.label
            )))
        }
    }
}

impl SessionFeedback for MemoryScene {
    fn client_connected(&mut self, ip: &str, port: u16) {
        self.record_feedback(format!("connected {ip}:{port}"));
    }

    fn client_disconnected(&mut self) {
        self.record_feedback("disconnected".to_string());
    }

    fn current_camera_changed(&mut self, camera: &str) {
        self.record_feedback(format!("camera {camera}"));
    }

    fn server_did_stop(&mut self) {
        self.record_feedback("stopped".to_string());
    }
}

// =============================================================================
// Tests
// =============================================================================
