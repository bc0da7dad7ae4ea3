//! Scenelink Core Engine
//!
//! Core bridge module. Handles camera synchronization, keyframe exchange,
//! playback mirroring, viewport capture and scene-thread marshaling.

pub mod bridge;
pub mod cameras;
pub mod capture;
pub mod dispatch;
pub mod events;
pub mod keyframes;
pub mod playback;
pub mod scene;
pub mod scripts;
pub mod transform;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
