//! Game balance tuning
//!
//! Loaded from JSON so difficulty can be adjusted without a rebuild.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_LIVES, SPAWN_Y};

/// Errors raised while loading or validating tuning data.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Balance knobs for spawning, pacing and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Pacing ===
    /// Delay before the very first wave (seconds)
    pub start_delay: f32,
    /// Initial delay between waves (seconds)
    pub popup_time: f32,
    /// Multiplier applied to `popup_time` after every wave
    pub popup_decay: f32,
    /// Lower bound for `popup_time`
    pub min_popup_time: f32,
    /// Initial chain spacing base (seconds)
    pub chain_delay: f32,
    /// Multiplier applied to `chain_delay` after every wave
    pub chain_decay: f32,
    /// Lower bound for `chain_delay`
    pub min_chain_delay: f32,

    // === World ===
    /// Initial physics time scale
    pub world_speed: f32,
    /// Multiplier applied to the world speed after every wave
    pub world_speed_growth: f32,
    /// Upper bound for the world speed
    pub max_world_speed: f32,
    /// Entities below this height have left the screen
    pub exit_y: f32,

    // === Sequence ===
    /// Random tokens appended after the scripted opening
    pub random_tail: usize,

    // === Slicing ===
    /// Trail points kept for rendering
    pub trail_length: usize,
    /// Length of one swoosh sound (seconds)
    pub swoosh_duration: f32,

    // === Scoring ===
    pub starting_lives: u8,
    pub normal_points: u64,
    pub bonus_points: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            start_delay: 2.0,
            popup_time: 0.9,
            popup_decay: 0.991,
            min_popup_time: 0.25,
            chain_delay: 3.0,
            chain_decay: 0.99,
            min_chain_delay: 0.5,

            world_speed: 0.85,
            world_speed_growth: 1.02,
            max_world_speed: 2.5,
            exit_y: -140.0,

            random_tail: 1001,

            trail_length: 12,
            swoosh_duration: 0.4,

            starting_lives: MAX_LIVES,
            normal_points: 1,
            bonus_points: 5,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON string
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a tuning file
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a tuning file, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default tuning ({})", err);
                Self::default()
            }
        }
    }

    /// Check that every knob is in a usable range
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        fn decay(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be in (0, 1], got {value}"),
                })
            }
        }

        if !self.start_delay.is_finite() || self.start_delay < 0.0 {
            return Err(TuningError::Invalid {
                field: "start_delay",
                reason: format!("must be non-negative, got {}", self.start_delay),
            });
        }
        positive("popup_time", self.popup_time)?;
        positive("min_popup_time", self.min_popup_time)?;
        positive("chain_delay", self.chain_delay)?;
        positive("min_chain_delay", self.min_chain_delay)?;
        positive("world_speed", self.world_speed)?;
        positive("max_world_speed", self.max_world_speed)?;
        positive("swoosh_duration", self.swoosh_duration)?;
        decay("popup_decay", self.popup_decay)?;
        decay("chain_decay", self.chain_decay)?;

        if !(self.world_speed_growth >= 1.0 && self.world_speed_growth.is_finite()) {
            return Err(TuningError::Invalid {
                field: "world_speed_growth",
                reason: format!("must be at least 1.0, got {}", self.world_speed_growth),
            });
        }
        if self.min_popup_time > self.popup_time {
            return Err(TuningError::Invalid {
                field: "min_popup_time",
                reason: format!(
                    "must not exceed popup_time ({}), got {}",
                    self.popup_time, self.min_popup_time
                ),
            });
        }
        if self.max_world_speed < self.world_speed {
            return Err(TuningError::Invalid {
                field: "max_world_speed",
                reason: format!(
                    "must be at least world_speed ({}), got {}",
                    self.world_speed, self.max_world_speed
                ),
            });
        }
        // Launches start at SPAWN_Y; an exit line at or above it expires them on the spot
        if !self.exit_y.is_finite() || self.exit_y >= SPAWN_Y {
            return Err(TuningError::Invalid {
                field: "exit_y",
                reason: format!("must be below the spawn line ({SPAWN_Y}), got {}", self.exit_y),
            });
        }
        if self.trail_length < 2 {
            return Err(TuningError::Invalid {
                field: "trail_length",
                reason: format!("must keep at least 2 points, got {}", self.trail_length),
            });
        }
        if self.starting_lives == 0 || self.starting_lives > MAX_LIVES {
            return Err(TuningError::Invalid {
                field: "starting_lives",
                reason: format!("must be 1..={MAX_LIVES}, got {}", self.starting_lives),
            });
        }
        Ok(())
    }
}
