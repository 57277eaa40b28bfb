//! Score, lives and game-over bookkeeping

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use crate::consts::MAX_LIVES;
use crate::tuning::Tuning;

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    /// A bomb was sliced
    Bomb,
    /// The last life was lost to a missed target
    OutOfLives,
}

/// One of the life icons in the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeIndicator {
    Lit,
    Lost,
}

/// Result of a target leaving the screen unsliced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryOutcome {
    /// No penalty (bonus, bomb, or the run already ended)
    Ignored,
    LifeLost { remaining: u8 },
    /// The last life went and the run ended
    GameOver,
}

/// Player-facing progress for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub score: u64,
    pub lives: u8,
    pub game_ended: bool,
    pub end_cause: Option<EndCause>,
    pub life_indicators: [LifeIndicator; MAX_LIVES as usize],
    /// Physics time scale; zero once the run ends
    pub world_speed: f32,
    /// Slicing input accepted
    pub input_enabled: bool,
    normal_points: u64,
    bonus_points: u64,
    world_speed_growth: f32,
    max_world_speed: f32,
}

impl GameState {
    pub fn new(tuning: &Tuning) -> Self {
        let lives = tuning.starting_lives.min(MAX_LIVES);
        let mut life_indicators = [LifeIndicator::Lit; MAX_LIVES as usize];
        // Fewer starting lives show the missing ones as already lost
        for indicator in life_indicators.iter_mut().take((MAX_LIVES - lives) as usize) {
            *indicator = LifeIndicator::Lost;
        }

        Self {
            score: 0,
            lives,
            game_ended: false,
            end_cause: None,
            life_indicators,
            world_speed: tuning.world_speed,
            input_enabled: true,
            normal_points: tuning.normal_points,
            bonus_points: tuning.bonus_points,
            world_speed_growth: tuning.world_speed_growth,
            max_world_speed: tuning.max_world_speed,
        }
    }

    /// Credit a sliced entity. Returns the points awarded.
    pub fn register_slice(&mut self, kind: EntityKind) -> u64 {
        let points = match kind {
            EntityKind::Normal => self.normal_points,
            EntityKind::Bonus => self.bonus_points,
            EntityKind::Bomb | EntityKind::BombCasing => 0,
        };
        self.score += points;
        points
    }

    /// Charge for an entity that fell off-screen unsliced
    pub fn register_expiry(&mut self, kind: EntityKind) -> ExpiryOutcome {
        if self.game_ended || kind != EntityKind::Normal || self.lives == 0 {
            return ExpiryOutcome::Ignored;
        }

        self.lives -= 1;
        // First loss dims the leftmost icon
        let lost_index = (MAX_LIVES - self.lives - 1) as usize;
        if let Some(indicator) = self.life_indicators.get_mut(lost_index) {
            *indicator = LifeIndicator::Lost;
        }

        if self.lives == 0 {
            self.end_game(EndCause::OutOfLives);
            ExpiryOutcome::GameOver
        } else {
            ExpiryOutcome::LifeLost {
                remaining: self.lives,
            }
        }
    }

    /// End the run. Returns false if it had already ended.
    pub fn end_game(&mut self, cause: EndCause) -> bool {
        if self.game_ended {
            return false;
        }

        self.game_ended = true;
        self.end_cause = Some(cause);
        self.world_speed = 0.0;
        self.input_enabled = false;

        // A bomb blanks every life, spent or not
        if cause == EndCause::Bomb {
            self.life_indicators = [LifeIndicator::Lost; MAX_LIVES as usize];
        }

        log::info!("Game over ({:?}), score {}", cause, self.score);
        true
    }

    /// Speed up the world after a wave launches
    pub fn accelerate(&mut self) {
        if !self.game_ended {
            self.world_speed = (self.world_speed * self.world_speed_growth).min(self.max_world_speed);
        }
    }

    pub fn triggered_by_bomb(&self) -> bool {
        self.end_cause == Some(EndCause::Bomb)
    }

    pub fn lost_indicators(&self) -> usize {
        self.life_indicators
            .iter()
            .filter(|i| **i == LifeIndicator::Lost)
            .count()
    }
}
