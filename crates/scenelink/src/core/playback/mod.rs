//! Playback Controller
//!
//! Scene-wide frame/range/fps mirroring. Range ordering is deliberately not
//! validated — equal or inverted ranges are legal and their semantics belong
//! to the scene adapter.

use crate::core::scene::SharedScene;
use crate::core::{BridgeError, BridgeResult, PlaybackState};

pub struct PlaybackController {
    scene: SharedScene,
}

impl PlaybackController {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }

    /// Playback state as (current frame, range start, range end)
    pub fn state(&self) -> BridgeResult<PlaybackState> {
        self.scene.lock().unwrap().playback_state()
    }

    /// Scene playback rate in frames per second
    pub fn fps(&self) -> BridgeResult<f64> {
        self.scene.lock().unwrap().playback_fps()
    }

    /// Scrubs the scene to the given frame
    pub fn set_frame(&self, frame: f64) -> BridgeResult<()> {
        check_finite(frame)?;
        self.scene.lock().unwrap().set_frame(frame)
    }

    /// Sets the animation range; any two finite values are accepted
    pub fn set_range(&self, start: f64, end: f64) -> BridgeResult<()> {
        check_finite(start)?;
        check_finite(end)?;
        self.scene.lock().unwrap().set_playback_range(start, end)
    }

    /// Reserved forward-compatibility hook; callers must not assume any
    /// observable effect
    pub fn start(&self, forward: bool) -> BridgeResult<()> {
        self.scene.lock().unwrap().start_playback(forward)
    }

    /// Reserved forward-compatibility hook; callers must not assume any
    /// observable effect
    pub fn stop(&self) -> BridgeResult<()> {
        self.scene.lock().unwrap().stop_playback()
    }
}

fn check_finite(value: f64) -> BridgeResult<()> {
    if !value.is_finite() {
        return Err(BridgeError::Validation(format!(
            "frame value {value} is not finite"
        )));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{shared, MemoryScene};

    fn controller() -> PlaybackController {
        PlaybackController::new(shared(MemoryScene::new()))
    }

    #[test]
    fn test_state_mirrors_scrub_and_range() {
        let playback = controller();

        playback.set_frame(42.5).unwrap();
        playback.set_range(10.0, 100.0).unwrap();

        let state = playback.state().unwrap();
        assert_eq!(state, PlaybackState::new(42.5, 10.0, 100.0));
        assert_eq!(playback.fps().unwrap(), 24.0);
    }

    #[test]
    fn test_inverted_range_is_accepted() {
        let playback = controller();
        playback.set_range(100.0, 10.0).unwrap();
        let state = playback.state().unwrap();
        assert_eq!(state.range_start, 100.0);
        assert_eq!(state.range_end, 10.0);
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let playback = controller();
        assert!(matches!(
            playback.set_frame(f64::NAN),
            Err(BridgeError::Validation(_))
        ));
        assert!(matches!(
            playback.set_range(1.0, f64::INFINITY),
            Err(BridgeError::Validation(_))
        ));
    }

    #[test]
    fn test_reserved_hooks_are_callable() {
        let playback = controller();
        playback.start(true).unwrap();
        playback.start(false).unwrap();
        playback.stop().unwrap();
    }
}
