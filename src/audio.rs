//! Sound cues
//!
//! The game only decides *which* sound plays and when; mixing and playback
//! belong to the stage.

use serde::{Deserialize, Serialize};

use crate::stage::{LoopHandle, Stage};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// A target was thrown
    Launch,
    /// A target was sliced
    Whack,
    /// A bomb was sliced
    Explosion,
    /// A target fell off-screen and cost a life
    Wrong,
    /// Blade swipe, one of several variants (1-based)
    Swoosh(u8),
    /// Looping fuse hiss while a bomb is on screen
    BombFuse,
}

/// Looping fuse sound tied to "at least one bomb casing is active"
///
/// Recomputed every tick from the active set rather than counted
/// incrementally, so spawns and removals can never drift out of sync.
#[derive(Debug, Default)]
pub struct FuseCue {
    handle: Option<LoopHandle>,
}

impl FuseCue {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Whether the loop is currently playing
    pub fn is_playing(&self) -> bool {
        self.handle.is_some()
    }

    /// Start or stop the loop so it matches `bombs_active`
    pub fn sync<S: Stage + ?Sized>(&mut self, stage: &mut S, bombs_active: bool) {
        match (bombs_active, self.handle) {
            (true, None) => {
                self.handle = Some(stage.start_loop(SoundEffect::BombFuse));
            }
            (false, Some(handle)) => {
                stage.stop_loop(handle);
                self.handle = None;
            }
            _ => {}
        }
    }

    /// Stop the loop unconditionally
    pub fn stop<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        self.sync(stage, false);
    }
}
