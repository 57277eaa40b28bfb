//! Slice Ninja - arcade slicing game core
//!
//! Core modules:
//! - `sim`: Deterministic gameplay (spawn sequencing, slicing, lives, game loop)
//! - `stage`: Rendering/physics/audio collaborator interface and a headless stage
//! - `audio`: Sound cues and the looping fuse cue
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod sim;
pub mod stage;
pub mod tuning;

pub use audio::{FuseCue, SoundEffect};
pub use stage::{Effect, Handle, HeadlessStage, LoopHandle, Stage};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play field dimensions (origin bottom-left, y up)
    pub const PLAY_WIDTH: f32 = 1024.0;
    pub const PLAY_HEIGHT: f32 = 768.0;

    /// Launch origin: x sampled in this range, y fixed below the field
    pub const SPAWN_X_MIN: i32 = 64;
    pub const SPAWN_X_MAX: i32 = 960;
    pub const SPAWN_Y: f32 = -128.0;

    /// Launch velocities are rolled in small integer bands and scaled by this
    pub const VELOCITY_SCALE: f32 = 40.0;
    /// Horizontal band for the outer quadrants
    pub const OUTER_X_SPEED: (i32, i32) = (8, 15);
    /// Horizontal band for the inner quadrants
    pub const INNER_X_SPEED: (i32, i32) = (3, 5);
    /// Vertical launch band
    pub const Y_SPEED: (i32, i32) = (24, 32);
    /// Angular velocity band (radians/sec, symmetric)
    pub const MAX_ANGULAR_VELOCITY: f32 = 3.0;

    /// Gravity in points/s² (6 m/s² at 150 points per meter)
    pub const GRAVITY: f32 = -900.0;

    /// Hit region radius for targets and bomb casings
    pub const ENTITY_RADIUS: f32 = 64.0;
    /// Hit region radius for the hazard inside a bomb casing
    pub const BOMB_RADIUS: f32 = 52.0;

    /// Number of life indicators shown (and the maximum starting lives)
    pub const MAX_LIVES: u8 = 3;
    /// Faces on the entity kind die
    pub const KIND_DIE_FACES: u8 = 8;
    /// Number of swoosh sound variants
    pub const SWOOSH_VARIANTS: u8 = 3;
}
