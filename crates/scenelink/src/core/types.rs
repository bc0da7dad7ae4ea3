//! Scenelink Core Type Definitions
//!
//! Boundary value types shared across the bridge components. Everything in
//! this module crosses the dispatcher boundary, so it serializes with
//! camelCase field names.

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Camera name as reported by the host scene (unique within a session)
pub type CameraName = String;

/// Capture session identifier (ULID)
pub type SessionId = String;

/// Animation frame number; hosts use fractional frames for sub-frame sampling
pub type FrameNumber = f64;

// =============================================================================
// Playback
// =============================================================================

/// Scene-wide playback state mirrored to the remote client
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current frame number
    pub current_frame: FrameNumber,
    /// Animation range start frame
    pub range_start: FrameNumber,
    /// Animation range end frame
    pub range_end: FrameNumber,
}

impl PlaybackState {
    pub fn new(current_frame: FrameNumber, range_start: FrameNumber, range_end: FrameNumber) -> Self {
        Self {
            current_frame,
            range_start,
            range_end,
        }
    }
}

// =============================================================================
// Cameras
// =============================================================================

/// Which animatable camera channels currently hold keyframes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFlags {
    /// The transform channel has at least one keyframe
    pub transform: bool,
    /// The focal-length channel has at least one keyframe
    pub focal_length: bool,
}

impl KeyFlags {
    /// No keyframes on either channel
    pub const NONE: KeyFlags = KeyFlags {
        transform: false,
        focal_length: false,
    };

    pub fn new(transform: bool, focal_length: bool) -> Self {
        Self {
            transform,
            focal_length,
        }
    }

    /// Checks if any channel holds keyframes
    pub fn any(&self) -> bool {
        self.transform || self.focal_length
    }
}

// =============================================================================
// Capture
// =============================================================================

/// Bytes per pixel of capture payloads (RGBA8)
pub const BYTES_PER_PIXEL: usize = 4;

/// Viewport dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Byte length of one frame at this resolution
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// Checks if either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Strategy for transferring rendered viewport pixels to the remote client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    /// The client captures a screen region; the core only reports its origin
    ScreenshotRegion,
    /// The adapter hands over a freshly owned snapshot per frame
    Buffer,
    /// The session exposes a raw address into an internally owned double buffer
    BufferPointer,
}

/// Capture negotiation, fixed by the scene adapter when a session starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Capture strategy for the whole session
    pub mode: CaptureMode,
    /// Initial capture resolution
    pub resolution: Resolution,
    /// Payload rows are bottom-up and must be flipped by the consumer
    #[serde(default)]
    pub vertical_flip: bool,
}

impl CaptureConfig {
    pub fn new(mode: CaptureMode, width: u32, height: u32) -> Self {
        Self {
            mode,
            resolution: Resolution::new(width, height),
            vertical_flip: false,
        }
    }

    /// Sets the vertical-flip flag
    pub fn with_vertical_flip(mut self, vertical_flip: bool) -> Self {
        self.vertical_flip = vertical_flip;
        self
    }
}

// =============================================================================
// Bridge Configuration
// =============================================================================

/// Tuning knobs for the bridge runtime
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Capacity of the scene-thread request queue
    pub request_queue_capacity: usize,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_queue_capacity: 64,
            event_capacity: 128,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_byte_len() {
        let res = Resolution::new(640, 480);
        assert_eq!(res.byte_len(), 640 * 480 * 4);
        assert!(!res.is_empty());
        assert!(Resolution::new(0, 480).is_empty());
    }

    #[test]
    fn test_key_flags() {
        assert!(!KeyFlags::NONE.any());
        assert!(KeyFlags::new(true, false).any());
        assert_eq!(KeyFlags::default(), KeyFlags::NONE);
    }

    #[test]
    fn test_capture_config_serialization() {
        let config = CaptureConfig::new(CaptureMode::BufferPointer, 1280, 720).with_vertical_flip(true);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"mode\":\"bufferPointer\""));
        assert!(json.contains("\"verticalFlip\":true"));

        let parsed: CaptureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_capture_config_flip_defaults_off() {
        let parsed: CaptureConfig = serde_json::from_str(
            r#"{"mode":"buffer","resolution":{"width":640,"height":480}}"#,
        )
        .unwrap();
        assert!(!parsed.vertical_flip);
    }

    #[test]
    fn test_playback_state_serialization() {
        let state = PlaybackState::new(12.5, 1.0, 250.0);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"currentFrame\":12.5"));

        let parsed: PlaybackState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_bridge_config_defaults() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.request_queue_capacity, 64);
        assert_eq!(config.event_capacity, 128);
    }
}
