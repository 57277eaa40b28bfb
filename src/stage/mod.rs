//! Rendering, physics and audio collaborator
//!
//! The simulation never touches sprites, sound files or the physics engine
//! directly. Everything visual or physical goes through [`Stage`], keyed by
//! opaque [`Handle`]s.

mod headless;

pub use headless::HeadlessStage;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::SoundEffect;
use crate::sim::{EntityKind, Launch};

/// Opaque reference to a visual/physical body owned by the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u32);

/// Opaque reference to a looping sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopHandle(pub u32);

/// One-shot particle effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Burst when a target is sliced
    SliceHitEnemy,
    /// Explosion when a bomb is sliced
    SliceHitBomb,
    /// Sparks on a bomb casing's fuse (attached, not one-shot)
    Fuse,
}

/// Everything the game needs from its engine
///
/// All calls happen on the single thread that drives the session.
pub trait Stage {
    /// Create a body with the given launch state and return its handle
    fn spawn(&mut self, kind: EntityKind, launch: &Launch) -> Handle;

    /// Create a child body that moves with `parent` (the hazard inside a bomb casing)
    fn attach(&mut self, parent: Handle, kind: EntityKind) -> Handle;

    /// Current position, or `None` if the body no longer exists
    fn position(&self, handle: Handle) -> Option<Vec2>;

    /// Remove a body and all of its children
    fn remove(&mut self, handle: Handle);

    /// Cancel any running per-body actions and attached effects
    fn clear_actions(&mut self, handle: Handle);

    /// All bodies whose hit region contains `point`
    fn hit_test_point(&self, point: Vec2) -> Vec<Handle>;

    /// Advance physics by `dt` seconds at the given time scale
    fn step(&mut self, dt: f32, time_scale: f32);

    fn play_sound(&mut self, sound: SoundEffect);

    fn start_loop(&mut self, sound: SoundEffect) -> LoopHandle;

    fn stop_loop(&mut self, handle: LoopHandle);

    fn play_effect(&mut self, _effect: Effect, _at: Vec2) {}

    /// Redraw the slice trail (fewer than two points draws nothing)
    fn draw_trail(&mut self, _points: &[Vec2]) {}

    /// Fade out the slice trail at the end of a stroke
    fn fade_trail(&mut self) {}
}
