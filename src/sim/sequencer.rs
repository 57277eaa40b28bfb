//! Wave sequencing and difficulty pacing
//!
//! A run opens with a fixed, gentle script and then draws waves at random.
//! Every wave shortens the pause before the next one and tightens chains.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::entity::ForceBomb;
use crate::tuning::Tuning;

/// Composition of a single wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveToken {
    OneNoBomb,
    One,
    TwoWithOneBomb,
    Two,
    Three,
    Four,
    Chain,
    FastChain,
    BonusEnemy,
}

impl WaveToken {
    pub const ALL: [WaveToken; 9] = [
        WaveToken::OneNoBomb,
        WaveToken::One,
        WaveToken::TwoWithOneBomb,
        WaveToken::Two,
        WaveToken::Three,
        WaveToken::Four,
        WaveToken::Chain,
        WaveToken::FastChain,
        WaveToken::BonusEnemy,
    ];

    /// Scripted opening of every run
    pub const OPENING: [WaveToken; 7] = [
        WaveToken::OneNoBomb,
        WaveToken::OneNoBomb,
        WaveToken::TwoWithOneBomb,
        WaveToken::TwoWithOneBomb,
        WaveToken::Three,
        WaveToken::One,
        WaveToken::Chain,
    ];
}

/// One entity to create as part of a wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Seconds after the wave starts
    pub delay: f32,
    pub force: ForceBomb,
}

impl SpawnOrder {
    fn now(force: ForceBomb) -> Self {
        Self { delay: 0.0, force }
    }
}

/// A launched wave: its token and the spawns it produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub token: WaveToken,
    /// Index of this wave in the sequence
    pub index: usize,
    pub spawns: Vec<SpawnOrder>,
}

/// Number of follow-up spawns in a chain
const CHAIN_FOLLOWERS: u32 = 4;

/// Opening script followed by `total_waves` uniformly random tokens
pub fn build_sequence<R: Rng + ?Sized>(
    seed_waves: &[WaveToken],
    total_waves: usize,
    rng: &mut R,
) -> Vec<WaveToken> {
    let mut sequence = Vec::with_capacity(seed_waves.len() + total_waves);
    sequence.extend_from_slice(seed_waves);
    sequence.extend(random_tokens(total_waves, rng));
    sequence
}

fn random_tokens<R: Rng + ?Sized>(count: usize, rng: &mut R) -> impl Iterator<Item = WaveToken> + '_ {
    (0..count).filter_map(move |_| WaveToken::ALL.choose(&mut *rng).copied())
}

/// Decides what is thrown next and how long to wait
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSequencer {
    sequence: Vec<WaveToken>,
    position: usize,
    /// Pause between the field emptying and the next wave (seconds)
    pub popup_time: f32,
    /// Base spacing for chain waves (seconds)
    pub chain_delay: f32,
    /// A NextWave is already scheduled
    pub pending_next_wave: bool,
    /// Ran out of waves with nothing to refill; no more waves will launch
    exhausted: bool,
    popup_decay: f32,
    min_popup_time: f32,
    chain_decay: f32,
    min_chain_delay: f32,
    /// Tail length used when the sequence has to grow
    refill: usize,
}

impl SpawnSequencer {
    /// Opening script plus a random tail sized by the tuning
    pub fn new<R: Rng + ?Sized>(tuning: &Tuning, rng: &mut R) -> Self {
        let sequence = build_sequence(&WaveToken::OPENING, tuning.random_tail, rng);
        Self::from_tokens(sequence, tuning)
    }

    /// Use an explicit token list (scripted runs and tests)
    pub fn from_tokens(sequence: Vec<WaveToken>, tuning: &Tuning) -> Self {
        Self {
            sequence,
            position: 0,
            popup_time: tuning.popup_time,
            chain_delay: tuning.chain_delay,
            pending_next_wave: false,
            exhausted: false,
            popup_decay: tuning.popup_decay,
            min_popup_time: tuning.min_popup_time,
            chain_decay: tuning.chain_decay,
            min_chain_delay: tuning.min_chain_delay,
            refill: tuning.random_tail,
        }
    }

    /// Cursor into the sequence (number of waves launched)
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn sequence(&self) -> &[WaveToken] {
        &self.sequence
    }

    /// Token the next `advance` will launch, if any
    pub fn peek(&self) -> Option<WaveToken> {
        self.sequence.get(self.position).copied()
    }

    /// The sequence ran dry and cannot grow
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Launch the wave at the cursor.
    ///
    /// Decay is applied first so a chain uses the tightened spacing. When the
    /// cursor has run off the end the sequence is extended with a fresh random
    /// tail; an empty sequence with nothing to refill yields `None`.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Wave> {
        if self.position >= self.sequence.len() {
            if self.refill == 0 {
                if !self.exhausted {
                    log::warn!("Wave sequence exhausted at {}, nothing to launch", self.position);
                }
                self.exhausted = true;
                self.pending_next_wave = false;
                return None;
            }
            log::info!(
                "Wave sequence exhausted at {}, extending by {}",
                self.position,
                self.refill
            );
            let extra: Vec<_> = random_tokens(self.refill, rng).collect();
            self.sequence.extend(extra);
        }

        let token = *self.sequence.get(self.position)?;
        let index = self.position;

        self.popup_time = (self.popup_time * self.popup_decay).max(self.min_popup_time);
        self.chain_delay = (self.chain_delay * self.chain_decay).max(self.min_chain_delay);

        self.position += 1;
        self.pending_next_wave = false;

        Some(Wave {
            token,
            index,
            spawns: self.spawns_for(token),
        })
    }

    fn spawns_for(&self, token: WaveToken) -> Vec<SpawnOrder> {
        use ForceBomb::*;

        match token {
            WaveToken::OneNoBomb => vec![SpawnOrder::now(Never)],
            WaveToken::One | WaveToken::BonusEnemy => vec![SpawnOrder::now(Random)],
            WaveToken::TwoWithOneBomb => vec![SpawnOrder::now(Never), SpawnOrder::now(Always)],
            WaveToken::Two => vec![SpawnOrder::now(Random); 2],
            WaveToken::Three => vec![SpawnOrder::now(Random); 3],
            WaveToken::Four => vec![SpawnOrder::now(Random); 4],
            WaveToken::Chain => self.chain(5.0),
            WaveToken::FastChain => self.chain(10.0),
        }
    }

    fn chain(&self, divisor: f32) -> Vec<SpawnOrder> {
        let step = self.chain_delay / divisor;
        std::iter::once(SpawnOrder::now(ForceBomb::Random))
            .chain((1..=CHAIN_FOLLOWERS).map(|k| SpawnOrder {
                delay: step * k as f32,
                force: ForceBomb::Random,
            }))
            .collect()
    }
}
