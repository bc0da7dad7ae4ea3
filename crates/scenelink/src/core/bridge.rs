//! Scene Bridge Facade
//!
//! The synchronous surface the network dispatcher calls. `BridgeCore` owns
//! all components on the scene side; `SceneBridge` is the clonable handle
//! that marshals every operation onto the scene thread and blocks for the
//! result. Lifecycle notifications flow both ways: the dispatcher reports
//! client transitions here, observers subscribe to the event bus, and
//! scenes with the feedback capability hear about them on the scene thread.

use tokio::sync::broadcast;

use crate::core::cameras::CameraRegistry;
use crate::core::capture::{CaptureSession, CaptureState, FrameResponse};
use crate::core::dispatch::{self, SceneHandle, ScenePump};
use crate::core::events::{BridgeEvent, EventBus};
use crate::core::keyframes::KeyframeSynchronizer;
use crate::core::playback::PlaybackController;
use crate::core::scene::{self, Capability, SceneAdapter, SharedScene};
use crate::core::scripts::ScriptInvoker;
use crate::core::transform::Transform;
use crate::core::{
    BridgeConfig, BridgeResult, CameraName, CaptureConfig, KeyFlags, PlaybackState,
};

// =============================================================================
// Bridge Core
// =============================================================================

/// All bridge components, owned by the scene thread
pub struct BridgeCore {
    pub cameras: CameraRegistry,
    pub keyframes: KeyframeSynchronizer,
    pub playback: PlaybackController,
    pub capture: CaptureSession,
    pub scripts: ScriptInvoker,
    scene: SharedScene,
    events: EventBus,
}

impl BridgeCore {
    pub fn new(adapter: impl SceneAdapter + 'static, events: EventBus) -> Self {
        let scene = scene::shared(adapter);
        Self {
            cameras: CameraRegistry::new(scene.clone()),
            keyframes: KeyframeSynchronizer::new(scene.clone()),
            playback: PlaybackController::new(scene.clone()),
            capture: CaptureSession::new(scene.clone()),
            scripts: ScriptInvoker::new(scene.clone()),
            scene,
            events,
        }
    }

    /// Optional capabilities the adapter actually provides
    pub fn capabilities(&mut self) -> Vec<Capability> {
        let mut scene = self.scene.lock().unwrap();
        let mut present = Vec::new();
        if scene.feedback().is_some() {
            present.push(Capability::ConnectionFeedback);
        }
        if scene.scripts().is_some() {
            present.push(Capability::Scripting);
        }
        present
    }

    /// Forwards a lifecycle notification to the feedback capability (when
    /// present) and broadcasts it on the event bus
    fn notify(&mut self, event: BridgeEvent) {
        if let Some(feedback) = self.scene.lock().unwrap().feedback() {
            match &event {
                BridgeEvent::ClientConnected { ip, port } => feedback.client_connected(ip, *port),
                BridgeEvent::ClientDisconnected => feedback.client_disconnected(),
                BridgeEvent::CurrentCameraChanged { camera } => {
                    feedback.current_camera_changed(camera)
                }
                BridgeEvent::ServerStopped => feedback.server_did_stop(),
            }
        }
        self.events.emit(event);
    }

    /// Final drain step: force-stops a live capture session and announces
    /// the fully-stopped state
    pub(crate) fn on_server_stopped(&mut self) {
        if self.capture.state() != CaptureState::Idle {
            if let Err(e) = self.capture.stop() {
                tracing::warn!(error = %e, "capture session did not stop cleanly");
            }
        }
        self.notify(BridgeEvent::ServerStopped);
    }
}

// =============================================================================
// Scene Bridge
// =============================================================================

/// Clonable, thread-safe handle to the bridge. Every method blocks until
/// the scene thread has executed the operation.
#[derive(Clone)]
pub struct SceneBridge {
    handle: SceneHandle<BridgeCore>,
    events: EventBus,
}

impl SceneBridge {
    /// Builds the bridge. The returned pump must be driven by the thread
    /// that owns the host scene.
    pub fn new(adapter: impl SceneAdapter + 'static) -> (Self, ScenePump<BridgeCore>) {
        Self::with_config(adapter, BridgeConfig::default())
    }

    pub fn with_config(
        adapter: impl SceneAdapter + 'static,
        config: BridgeConfig,
    ) -> (Self, ScenePump<BridgeCore>) {
        let events = EventBus::new(config.event_capacity);
        let core = BridgeCore::new(adapter, events.clone());
        let (handle, pump) = dispatch::channel(core, config.request_queue_capacity);
        let pump = pump.with_stop_hook(|core: &mut BridgeCore| core.on_server_stopped());
        (Self { handle, events }, pump)
    }

    /// Convenience constructor running the pump on a dedicated thread, for
    /// hosts whose scene access is thread-safe and for headless use
    pub fn spawn(
        adapter: impl SceneAdapter + 'static,
    ) -> (Self, std::thread::JoinHandle<()>) {
        let (bridge, pump) = Self::new(adapter);
        let join = std::thread::spawn(move || {
            pump.run();
        });
        (bridge, join)
    }

    fn call<R, F>(&self, op: F) -> BridgeResult<R>
    where
        F: FnOnce(&mut BridgeCore) -> BridgeResult<R> + Send + 'static,
        R: Send + 'static,
    {
        self.handle.call(op)?
    }

    // --- playback ---

    pub fn playback_state(&self) -> BridgeResult<PlaybackState> {
        self.call(|core| core.playback.state())
    }

    pub fn playback_fps(&self) -> BridgeResult<f64> {
        self.call(|core| core.playback.fps())
    }

    pub fn set_frame(&self, frame: f64) -> BridgeResult<()> {
        self.call(move |core| core.playback.set_frame(frame))
    }

    pub fn set_playback_range(&self, start: f64, end: f64) -> BridgeResult<()> {
        self.call(move |core| core.playback.set_range(start, end))
    }

    pub fn start_playback(&self, forward: bool) -> BridgeResult<()> {
        self.call(move |core| core.playback.start(forward))
    }

    pub fn stop_playback(&self) -> BridgeResult<()> {
        self.call(|core| core.playback.stop())
    }

    // --- cameras ---

    pub fn list_cameras(&self) -> BridgeResult<Vec<CameraName>> {
        self.call(|core| core.cameras.list())
    }

    pub fn camera_exists(&self, name: &str) -> BridgeResult<bool> {
        let name = name.to_string();
        self.call(move |core| core.cameras.exists(&name))
    }

    pub fn camera_has_keys(&self, name: &str) -> BridgeResult<KeyFlags> {
        let name = name.to_string();
        self.call(move |core| core.cameras.has_keys(&name))
    }

    pub fn camera_focal_length(&self, name: &str) -> BridgeResult<f64> {
        let name = name.to_string();
        self.call(move |core| core.cameras.focal_length(&name))
    }

    pub fn camera_transform(&self, name: &str) -> BridgeResult<Transform> {
        let name = name.to_string();
        self.call(move |core| core.cameras.transform(&name))
    }

    pub fn set_camera_focal_length(&self, name: &str, focal_length: f64) -> BridgeResult<()> {
        let name = name.to_string();
        self.call(move |core| core.cameras.set_focal_length(&name, focal_length))
    }

    pub fn set_camera_transform(&self, name: &str, transform: Transform) -> BridgeResult<()> {
        let name = name.to_string();
        self.call(move |core| core.cameras.set_transform(&name, &transform))
    }

    pub fn create_camera(&self) -> BridgeResult<CameraName> {
        self.call(|core| core.cameras.create())
    }

    pub fn look_through(&self, name: &str) -> BridgeResult<()> {
        let name = name.to_string();
        self.call(move |core| core.cameras.look_through(&name))
    }

    // --- keyframes ---

    pub fn set_focal_keys(
        &self,
        camera: &str,
        frames: Vec<f64>,
        values: Vec<f64>,
    ) -> BridgeResult<()> {
        let camera = camera.to_string();
        self.call(move |core| core.keyframes.set_focal_keys(&camera, &frames, &values))
    }

    pub fn set_transform_keys(
        &self,
        camera: &str,
        frames: Vec<f64>,
        values: Vec<Transform>,
    ) -> BridgeResult<()> {
        let camera = camera.to_string();
        self.call(move |core| core.keyframes.set_transform_keys(&camera, &frames, &values))
    }

    pub fn remove_keys(&self, camera: &str) -> BridgeResult<()> {
        let camera = camera.to_string();
        self.call(move |core| core.keyframes.remove_keys(&camera))
    }

    // --- capture ---

    /// Starts a capture session, returning the negotiated (mode, resolution,
    /// flip) so the dispatcher can brief the remote client
    pub fn start_capture(&self) -> BridgeResult<CaptureConfig> {
        self.call(|core| core.capture.start())
    }

    pub fn request_frame(&self, camera: &str) -> BridgeResult<FrameResponse> {
        let camera = camera.to_string();
        self.call(move |core| core.capture.request_frame(&camera))
    }

    pub fn stop_capture(&self) -> BridgeResult<()> {
        self.call(|core| core.capture.stop())
    }

    // --- scripts ---

    pub fn script_labels(&self) -> BridgeResult<Vec<String>> {
        self.call(|core| core.scripts.list_labels())
    }

    pub fn execute_script(&self, index: usize, current_camera: &str) -> BridgeResult<bool> {
        let current_camera = current_camera.to_string();
        self.call(move |core| core.scripts.execute(index, &current_camera))
    }

    // --- capabilities, events and lifecycle ---

    /// Optional capabilities the scene adapter provides; query this instead
    /// of probing operations for errors
    pub fn capabilities(&self) -> BridgeResult<Vec<Capability>> {
        self.handle.call(|core| core.capabilities())
    }

    /// Opens a subscription to bridge events
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub fn notify_client_connected(&self, ip: &str, port: u16) -> BridgeResult<()> {
        let ip = ip.to_string();
        self.handle
            .call(move |core| core.notify(BridgeEvent::ClientConnected { ip, port }))
    }

    pub fn notify_client_disconnected(&self) -> BridgeResult<()> {
        self.handle
            .call(|core| core.notify(BridgeEvent::ClientDisconnected))
    }

    pub fn notify_current_camera_changed(&self, camera: &str) -> BridgeResult<()> {
        let camera = camera.to_string();
        self.handle
            .call(move |core| core.notify(BridgeEvent::CurrentCameraChanged { camera }))
    }

    /// Requests shutdown and returns immediately. In-flight operations
    /// drain first; `ServerStopped` fires once everything has stopped.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }
}

// =============================================================================
// Tests
// =============================================================================
