//! Script Invoker
//!
//! Ordered, index-addressed custom-action table. The listing order is the
//! binding contract: index `i` refers to the `i`-th label as last listed
//! within the session. Script failures are collapsed to `false` because the
//! remote protocol has no payload for structured script errors; the detail
//! goes to the log instead.

use crate::core::scene::SharedScene;
use crate::core::{BridgeError, BridgeResult};

pub struct ScriptInvoker {
    scene: SharedScene,
    last_listing: Vec<String>,
}

impl ScriptInvoker {
    pub fn new(scene: SharedScene) -> Self {
        Self {
            scene,
            last_listing: Vec::new(),
        }
    }

    /// Lists script labels. The returned order binds indices for `execute`
    /// until the next listing.
    pub fn list_labels(&mut self) -> BridgeResult<Vec<String>> {
        let labels = {
            let mut scene = self.scene.lock().unwrap();
            let host = scene
                .scripts()
                .ok_or_else(|| BridgeError::NotSupported("custom scripts".to_string()))?;
            host.script_labels()
        };
        self.last_listing = labels.clone();
        Ok(labels)
    }

    /// Executes the script at `index` from the most recent listing.
    ///
    /// Returns `false` when the script itself fails; only an out-of-range
    /// index or a missing capability is a structured error.
    pub fn execute(&mut self, index: usize, current_camera: &str) -> BridgeResult<bool> {
        if index >= self.last_listing.len() {
            return Err(BridgeError::Validation(format!(
                "script index {index} is out of range for {} listed scripts",
                self.last_listing.len()
            )));
        }
        let label = self.last_listing[index].clone();

        let mut scene = self.scene.lock().unwrap();
        let host = scene
            .scripts()
            .ok_or_else(|| BridgeError::NotSupported("custom scripts".to_string()))?;
        match host.run_script(index, current_camera) {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(script = %label, index, error = %e, "script execution failed");
                Ok(false)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
