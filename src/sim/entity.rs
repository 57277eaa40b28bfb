//! Spawned objects and their launch kinematics

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::stage::Handle;

/// Session-unique entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What was thrown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Regular target: +1 when sliced, costs a life when missed
    Normal,
    /// Rare target: +5 when sliced, free to miss
    Bonus,
    /// The hazard inside a casing. Slicing it ends the game.
    Bomb,
    /// Harmless container carrying a `Bomb` and its fuse
    BombCasing,
}

impl EntityKind {
    /// Map a face of the kind die to a kind
    pub fn from_die(face: u8) -> Self {
        match face {
            0 => EntityKind::BombCasing,
            1 => EntityKind::Bonus,
            _ => EntityKind::Normal,
        }
    }

    /// Roll the kind for a spawn, honoring any forcing
    pub fn roll<R: Rng + ?Sized>(rng: &mut R, force: ForceBomb) -> Self {
        match force {
            ForceBomb::Never => EntityKind::Normal,
            ForceBomb::Always => EntityKind::BombCasing,
            ForceBomb::Random => Self::from_die(rng.random_range(0..KIND_DIE_FACES)),
        }
    }

    /// Whether this kind carries a lit fuse
    pub fn is_bomb_bearing(&self) -> bool {
        matches!(self, EntityKind::BombCasing)
    }
}

/// How a spawn treats the bomb roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForceBomb {
    /// Always a normal target
    Never,
    /// Always a bomb
    Always,
    /// Roll the kind die
    #[default]
    Random,
}

/// Lifecycle of a spawned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    Active,
    Sliced,
    Expired,
}

/// Initial physics state handed to the stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

impl Launch {
    /// Random launch from below the field, arcing back toward the center
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let x = rng.random_range(SPAWN_X_MIN..=SPAWN_X_MAX) as f32;
        let quarter = PLAY_WIDTH / 4.0;

        // Outer quadrants throw harder so edge launches still cross the field
        let x_speed = if x < quarter {
            rng.random_range(OUTER_X_SPEED.0..=OUTER_X_SPEED.1)
        } else if x < quarter * 2.0 {
            rng.random_range(INNER_X_SPEED.0..=INNER_X_SPEED.1)
        } else if x < quarter * 3.0 {
            -rng.random_range(INNER_X_SPEED.0..=INNER_X_SPEED.1)
        } else {
            -rng.random_range(OUTER_X_SPEED.0..=OUTER_X_SPEED.1)
        };
        let y_speed = rng.random_range(Y_SPEED.0..=Y_SPEED.1);

        Self {
            position: Vec2::new(x, SPAWN_Y),
            velocity: Vec2::new(x_speed as f32, y_speed as f32) * VELOCITY_SCALE,
            angular_velocity: rng.random_range(-MAX_ANGULAR_VELOCITY..=MAX_ANGULAR_VELOCITY),
        }
    }
}

/// A thrown object tracked by the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Body in the stage
    pub handle: Handle,
    /// Inner bomb region for casings
    pub hazard: Option<Handle>,
    pub launch: Launch,
    /// Last position reported by the stage
    pub position: Vec2,
    pub status: EntityStatus,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, handle: Handle, launch: Launch) -> Self {
        Self {
            id,
            kind,
            handle,
            hazard: None,
            launch,
            position: launch.position,
            status: EntityStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }

    /// Move out of `Active` into a terminal status.
    ///
    /// Returns false (and changes nothing) if already resolved, so the
    /// first of slice/expiry wins.
    pub fn resolve(&mut self, status: EntityStatus) -> bool {
        if !self.is_active() || status == EntityStatus::Active {
            return false;
        }
        self.status = status;
        true
    }
}
