//! Viewport Capture Session
//!
//! State machine governing frame acquisition: Idle -> Starting -> Capturing
//! -> Stopping -> Idle. The capture mode is fixed by the scene adapter when
//! the session starts; resolution is renegotiated against the adapter's
//! reported size before every payload, since the capture target can be
//! resized between frames. Any adapter failure is fatal to the session: the
//! session releases its buffers and returns to Idle rather than continue
//! from a possibly-inconsistent state.

mod buffers;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::core::scene::SharedScene;
use crate::core::{
    BridgeError, BridgeResult, CaptureConfig, CaptureMode, Resolution, SessionId,
};

use buffers::DoubleBuffer;

// =============================================================================
// States and Payloads
// =============================================================================

/// Lifecycle of a capture session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    #[default]
    Idle,
    Starting,
    Capturing,
    Stopping,
}

/// Mode-specific frame payload
#[derive(Clone, Debug, PartialEq)]
pub enum FramePayload {
    /// Top-left coordinates of the screen region to capture
    Region { x: f64, y: f64 },
    /// Self-contained snapshot, independently owned per request
    Snapshot(Vec<u8>),
    /// Address and length of the session-owned front buffer. Valid until
    /// the next frame request or session stop; never freed by the caller.
    Pointer { addr: usize, len: usize },
}

/// Result of a frame request: the payload plus the renegotiated resolution
#[derive(Clone, Debug)]
pub struct FrameResponse {
    /// Resolution the payload was produced at
    pub resolution: Resolution,
    /// True when the capture target size changed since the previous payload
    pub resized: bool,
    pub payload: FramePayload,
}

// =============================================================================
// Capture Session
// =============================================================================

pub struct CaptureSession {
    scene: SharedScene,
    id: SessionId,
    state: CaptureState,
    config: Option<CaptureConfig>,
    buffers: DoubleBuffer,
}

impl CaptureSession {
    pub fn new(scene: SharedScene) -> Self {
        Self {
            scene,
            id: Ulid::new().to_string(),
            state: CaptureState::Idle,
            config: None,
            buffers: DoubleBuffer::default(),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Negotiated configuration, present while the session is running
    pub fn config(&self) -> Option<CaptureConfig> {
        self.config
    }

    /// Starts the session and returns the negotiated configuration. The
    /// adapter fixes mode, initial resolution and flip before the
    /// transition to `Capturing` completes; a zero-sized resolution aborts
    /// the start.
    pub fn start(&mut self) -> BridgeResult<CaptureConfig> {
        if self.state != CaptureState::Idle {
            return Err(BridgeError::State {
                operation: "start capture",
                state: self.state,
            });
        }
        self.state = CaptureState::Starting;

        let config = match self.scene.lock().unwrap().capture_will_start() {
            Ok(config) => config,
            Err(e) => {
                self.state = CaptureState::Idle;
                return Err(e);
            }
        };

        if config.resolution.is_empty() {
            self.scene.lock().unwrap().capture_did_end();
            self.state = CaptureState::Idle;
            return Err(BridgeError::Validation(format!(
                "capture resolution must be non-zero, got {}x{}",
                config.resolution.width, config.resolution.height
            )));
        }

        if config.mode == CaptureMode::BufferPointer {
            self.buffers.allocate(config.resolution.byte_len());
        }

        tracing::info!(
            session = %self.id,
            mode = ?config.mode,
            width = config.resolution.width,
            height = config.resolution.height,
            vertical_flip = config.vertical_flip,
            "capture session started"
        );
        self.config = Some(config);
        self.state = CaptureState::Capturing;
        Ok(config)
    }

    /// Produces the next frame payload, renegotiating resolution first
    pub fn request_frame(&mut self, camera: &str) -> BridgeResult<FrameResponse> {
        if self.state != CaptureState::Capturing {
            return Err(BridgeError::State {
                operation: "request frame",
                state: self.state,
            });
        }

        match self.acquire(camera) {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "capture failed, stopping session");
                self.teardown();
                Err(e)
            }
        }
    }

    fn acquire(&mut self, camera: &str) -> BridgeResult<FrameResponse> {
        let config = match self.config.as_mut() {
            Some(config) => config,
            None => {
                return Err(BridgeError::State {
                    operation: "request frame",
                    state: CaptureState::Idle,
                })
            }
        };

        let mut scene = self.scene.lock().unwrap();

        let current = scene.viewport_size(camera)?;
        if current.is_empty() {
            return Err(BridgeError::Validation(format!(
                "capture target collapsed to {}x{}",
                current.width, current.height
            )));
        }
        let resized = current != config.resolution;
        if resized {
            tracing::debug!(
                session = %self.id,
                width = current.width,
                height = current.height,
                "capture resolution renegotiated"
            );
            config.resolution = current;
        }
        let resolution = config.resolution;

        let payload = match config.mode {
            CaptureMode::ScreenshotRegion => {
                let (x, y) = scene.capture_origin(camera)?;
                FramePayload::Region { x, y }
            }
            CaptureMode::Buffer => {
                let data = scene.capture_frame(camera)?;
                if data.len() != resolution.byte_len() {
                    return Err(BridgeError::Validation(format!(
                        "snapshot length {} does not match a {}x{} frame",
                        data.len(),
                        resolution.width,
                        resolution.height
                    )));
                }
                FramePayload::Snapshot(data)
            }
            CaptureMode::BufferPointer => {
                let back = self.buffers.back_mut(resolution.byte_len());
                scene.fill_frame(camera, back)?;
                let (addr, len) = self.buffers.publish();
                FramePayload::Pointer { addr, len }
            }
        };

        Ok(FrameResponse {
            resolution,
            resized,
            payload,
        })
    }

    /// Stops the session and releases all backing buffers. Stopping an idle
    /// session is a no-op.
    pub fn stop(&mut self) -> BridgeResult<()> {
        if self.state == CaptureState::Idle {
            return Ok(());
        }
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        self.state = CaptureState::Stopping;
        self.scene.lock().unwrap().capture_did_end();
        self.buffers.release();
        self.config = None;
        self.state = CaptureState::Idle;
        tracing::info!(session = %self.id, "capture session stopped");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::scene::{shared, MemoryScene};

    fn session_with(
        config: CaptureConfig,
    ) -> (CaptureSession, Arc<Mutex<Resolution>>, Arc<AtomicBool>) {
        let scene = MemoryScene::new()
            .with_camera("Cam")
            .with_capture(config)
            .with_capture_origin(120.0, 48.0);
        let viewport = scene.viewport_handle();
        let failures = scene.failure_handle();
        (CaptureSession::new(shared(scene)), viewport, failures)
    }

    #[test]
    fn test_frame_request_requires_capturing() {
        let (mut session, _, _) = session_with(CaptureConfig::new(CaptureMode::Buffer, 640, 480));
        assert!(matches!(
            session.request_frame("Cam"),
            Err(BridgeError::State { .. })
        ));
    }

    #[test]
    fn test_start_twice_is_a_state_error() {
        let (mut session, _, _) = session_with(CaptureConfig::new(CaptureMode::Buffer, 640, 480));
        session.start().unwrap();
        assert!(matches!(session.start(), Err(BridgeError::State { .. })));
    }

    #[test]
    fn test_zero_resolution_aborts_start() {
        let (mut session, _, _) = session_with(CaptureConfig::new(CaptureMode::Buffer, 0, 0));
        assert!(matches!(
            session.start(),
            Err(BridgeError::Validation(_))
        ));
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[test]
    fn test_region_mode_returns_coordinates() {
        let (mut session, _, _) =
            session_with(CaptureConfig::new(CaptureMode::ScreenshotRegion, 640, 480));
        session.start().unwrap();
        let response = session.request_frame("Cam").unwrap();
        assert_eq!(response.payload, FramePayload::Region { x: 120.0, y: 48.0 });
    }

    #[test]
    fn test_buffer_snapshots_are_independent() {
        let (mut session, _, _) = session_with(CaptureConfig::new(CaptureMode::Buffer, 640, 480));
        session.start().unwrap();

        let first = session.request_frame("Cam").unwrap();
        let second = session.request_frame("Cam").unwrap();
        assert!(!first.resized);
        assert!(!second.resized);

        let (FramePayload::Snapshot(a), FramePayload::Snapshot(b)) =
            (first.payload, second.payload)
        else {
            panic!("expected snapshots");
        };
        assert_eq!(a.len(), 640 * 480 * 4);
        assert_eq!(a.len(), b.len());
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn test_resize_is_reflected_before_next_payload() {
        let (mut session, viewport, _) =
            session_with(CaptureConfig::new(CaptureMode::Buffer, 640, 480));
        session.start().unwrap();
        session.request_frame("Cam").unwrap();

        *viewport.lock().unwrap() = Resolution::new(800, 600);
        let response = session.request_frame("Cam").unwrap();
        assert!(response.resized);
        assert_eq!(response.resolution, Resolution::new(800, 600));
        let FramePayload::Snapshot(data) = response.payload else {
            panic!("expected snapshot");
        };
        assert_eq!(data.len(), 800 * 600 * 4);
    }

    #[test]
    fn test_pointer_mode_double_buffers() {
        let (mut session, _, _) =
            session_with(CaptureConfig::new(CaptureMode::BufferPointer, 320, 240));
        session.start().unwrap();

        let addr = |response: FrameResponse| match response.payload {
            FramePayload::Pointer { addr, len } => {
                assert_eq!(len, 320 * 240 * 4);
                addr
            }
            other => panic!("expected pointer, got {other:?}"),
        };

        let first = addr(session.request_frame("Cam").unwrap());
        let second = addr(session.request_frame("Cam").unwrap());
        let third = addr(session.request_frame("Cam").unwrap());
        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_stop_releases_and_blocks_requests() {
        let (mut session, _, _) = session_with(CaptureConfig::new(CaptureMode::Buffer, 640, 480));
        session.start().unwrap();
        session.request_frame("Cam").unwrap();

        session.stop().unwrap();
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(session.config().is_none());
        assert!(matches!(
            session.request_frame("Cam"),
            Err(BridgeError::State { .. })
        ));

        // Stopping again is a no-op
        session.stop().unwrap();
    }

    #[test]
    fn test_adapter_failure_is_fatal_to_session() {
        let (mut session, _, failures) =
            session_with(CaptureConfig::new(CaptureMode::Buffer, 640, 480));
        session.start().unwrap();

        failures.store(true, Ordering::SeqCst);
        assert!(matches!(
            session.request_frame("Cam"),
            Err(BridgeError::Scene(_))
        ));
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(matches!(
            session.request_frame("Cam"),
            Err(BridgeError::State { .. })
        ));
    }

    #[test]
    fn test_session_can_restart_after_failure() {
        let (mut session, _, failures) =
            session_with(CaptureConfig::new(CaptureMode::BufferPointer, 320, 240));
        session.start().unwrap();
        failures.store(true, Ordering::SeqCst);
        assert!(session.request_frame("Cam").is_err());

        session.start().unwrap();
        let response = session.request_frame("Cam").unwrap();
        assert!(matches!(response.payload, FramePayload::Pointer { .. }));
    }
}
