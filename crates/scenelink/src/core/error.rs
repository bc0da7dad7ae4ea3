//! Scenelink Error Definitions
//!
//! Defines error types used throughout the bridge.

use thiserror::Error;

use super::capture::CaptureState;
use super::CameraName;

/// Core bridge error types
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Length/shape mismatches, out-of-range indices, malformed transforms
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown camera name
    #[error("camera not found: {0}")]
    NotFound(CameraName),

    /// Capture operation invoked outside its valid state
    #[error("cannot {operation} while capture session is {state:?}")]
    State {
        operation: &'static str,
        state: CaptureState,
    },

    /// Failure reported by the host scene adapter
    #[error("scene error: {0}")]
    Scene(String),

    /// Operation requires a capability the scene adapter does not provide
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The scene thread is no longer running; no further requests can be served
    #[error("bridge disconnected: scene thread is no longer running")]
    Disconnected,
}

/// Core bridge result type
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Flattens to a plain message for the remote protocol, which carries no
    /// structured error payload
    pub fn to_wire_message(&self) -> String {
        self.to_string()
    }
}
