//! Bridge Events
//!
//! Lifecycle and session notifications broadcast to in-process observers.
//! The network dispatcher reports lifecycle transitions through the facade;
//! observers subscribe here, and scenes with the connection-feedback
//! capability additionally receive the same notifications on the scene
//! thread.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::CameraName;

/// Notifications surfaced to the host application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// A remote client connected
    ClientConnected { ip: String, port: u16 },
    /// The remote client disconnected
    ClientDisconnected,
    /// The user selected a different camera in the remote client
    CurrentCameraChanged { camera: CameraName },
    /// All services have fully stopped
    ServerStopped,
}

/// Broadcast bus for bridge events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BridgeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Opens a new subscription receiving events emitted from here on
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.tx.subscribe()
    }

    /// Emits an event; having no subscribers is not an error
    pub fn emit(&self, event: BridgeEvent) {
        tracing::debug!(event = ?event, "bridge event");
        let _ = self.tx.send(event);
    }
}

// =============================================================================
// Tests
// =============================================================================
