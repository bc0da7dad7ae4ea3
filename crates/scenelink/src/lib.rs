//! Scenelink Core Library
//!
//! Synchronization and viewport-capture core bridging a 3D authoring
//! application's live scene to a remote companion client: canonical
//! camera/transform/keyframe exchange, playback-state mirroring, and
//! real-time frame delivery under three capture strategies.
//!
//! Network transport, wire encoding and per-application scene bindings are
//! external collaborators. The network dispatcher talks to this crate
//! through [`SceneBridge`]; the host application plugs its scene in through
//! [`SceneAdapter`].

pub mod core;

pub use crate::core::bridge::{BridgeCore, SceneBridge};
pub use crate::core::capture::{CaptureSession, CaptureState, FramePayload, FrameResponse};
pub use crate::core::events::{BridgeEvent, EventBus};
pub use crate::core::scene::{Capability, MemoryScene, SceneAdapter, ScriptHost, SessionFeedback};
pub use crate::core::transform::{convert_elements, Convention, Transform};
pub use crate::core::{
    BridgeConfig, BridgeError, BridgeResult, CameraName, CaptureConfig, CaptureMode, KeyFlags,
    PlaybackState, Resolution,
};

/// Installs a stdout `tracing` subscriber honoring `RUST_LOG`.
///
/// Host plugins without their own subscriber can call this once at load
/// time. Calling it again is harmless; later calls are ignored.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    // Avoid panics if already initialized (tests, plugin reloads).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
