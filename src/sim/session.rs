//! One run of the game
//!
//! The session owns every piece of mutable gameplay state. Input handlers and
//! [`tick`](super::tick::tick) borrow it mutably, so all changes are serialized
//! by construction.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, EntityKind, EntityStatus, ForceBomb, Launch};
use super::sequencer::{SpawnSequencer, WaveToken};
use super::slice::SliceTracker;
use super::state::{EndCause, ExpiryOutcome, GameState};
use super::timer::{SessionId, TimerEvent, TimerQueue};
use crate::audio::{FuseCue, SoundEffect};
use crate::consts::SWOOSH_VARIANTS;
use crate::stage::{Effect, Handle, Stage};
use crate::tuning::Tuning;

/// Notifications for the HUD and other observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    WaveLaunched { index: usize, token: WaveToken },
    Spawned { id: EntityId, kind: EntityKind },
    Sliced { id: EntityId, kind: EntityKind, points: u64 },
    BombSliced { id: EntityId },
    Expired { id: EntityId, kind: EntityKind },
    LifeLost { remaining: u8 },
    GameOver { cause: EndCause, score: u64 },
}

/// All state for one run
#[derive(Debug)]
pub struct GameSession {
    pub(super) id: SessionId,
    seed: u64,
    pub(super) tuning: Tuning,
    pub(super) rng: Pcg32,
    pub(super) state: GameState,
    pub(super) sequencer: SpawnSequencer,
    pub(super) slice: SliceTracker,
    /// Active entities in spawn order
    pub(super) entities: Vec<Entity>,
    pub(super) timers: TimerQueue,
    pub(super) fuse: FuseCue,
    pub(super) swoosh_active: bool,
    /// Seconds since the session was created (real time, unaffected by world speed)
    pub(super) clock: f64,
    next_id: u32,
    pub(super) events: Vec<GameEvent>,
}

impl GameSession {
    /// New run with the scripted opening and a random tail
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let sequencer = SpawnSequencer::new(&tuning, &mut rng);
        Self::assemble(SessionId(0), seed, tuning, rng, sequencer, 0.0)
    }

    /// New run with an explicit wave list
    pub fn with_sequence(seed: u64, tuning: Tuning, tokens: Vec<WaveToken>) -> Self {
        let rng = Pcg32::seed_from_u64(seed);
        let sequencer = SpawnSequencer::from_tokens(tokens, &tuning);
        Self::assemble(SessionId(0), seed, tuning, rng, sequencer, 0.0)
    }

    fn assemble(
        id: SessionId,
        seed: u64,
        tuning: Tuning,
        rng: Pcg32,
        sequencer: SpawnSequencer,
        clock: f64,
    ) -> Self {
        let mut session = Self {
            id,
            seed,
            state: GameState::new(&tuning),
            slice: SliceTracker::new(tuning.trail_length),
            tuning,
            rng,
            sequencer,
            entities: Vec::new(),
            timers: TimerQueue::new(),
            fuse: FuseCue::new(),
            swoosh_active: false,
            clock,
            next_id: 1,
            events: Vec::new(),
        };

        // The opening wave waits a little longer than the rest
        let due = session.clock + session.tuning.start_delay as f64;
        session.timers.schedule(session.id, due, TimerEvent::NextWave);
        session.sequencer.pending_next_wave = true;

        log::info!("Session {:?} started (seed {})", session.id, seed);
        session
    }

    /// Throw away the current run and start another.
    ///
    /// Timers already queued stay in the queue but carry the old session id,
    /// so they are discarded when they come due.
    pub fn restart<S: Stage + ?Sized>(&mut self, stage: &mut S, seed: u64) {
        for entity in self.entities.drain(..) {
            stage.remove(entity.handle);
        }
        self.fuse.stop(stage);

        let mut rng = Pcg32::seed_from_u64(seed);
        let sequencer = SpawnSequencer::new(&self.tuning, &mut rng);
        let id = SessionId(self.id.0 + 1);
        let old_timers = std::mem::take(&mut self.timers);
        let tuning = self.tuning.clone();

        *self = Self::assemble(id, seed, tuning, rng, sequencer, self.clock);
        self.timers.absorb(old_timers);
        stage.draw_trail(&[]);
    }

    // === Observers ===

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn lives(&self) -> u8 {
        self.state.lives
    }

    pub fn game_ended(&self) -> bool {
        self.state.game_ended
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn sequencer(&self) -> &SpawnSequencer {
        &self.sequencer
    }

    pub fn tracker(&self) -> &SliceTracker {
        &self.slice
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Active entities
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn fuse_playing(&self) -> bool {
        self.fuse.is_playing()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Spawning ===

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Throw one entity
    pub fn spawn_entity<S: Stage + ?Sized>(&mut self, stage: &mut S, force: ForceBomb) -> EntityId {
        let kind = EntityKind::roll(&mut self.rng, force);
        let launch = Launch::roll(&mut self.rng);
        let id = self.next_entity_id();

        let handle = stage.spawn(kind, &launch);
        let mut entity = Entity::new(id, kind, handle, launch);
        if kind.is_bomb_bearing() {
            entity.hazard = Some(stage.attach(handle, EntityKind::Bomb));
        } else {
            stage.play_sound(SoundEffect::Launch);
        }

        self.entities.push(entity);
        self.events.push(GameEvent::Spawned { id, kind });
        id
    }

    /// Launch the wave at the sequencer's cursor
    pub(super) fn launch_wave<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        let Some(wave) = self.sequencer.advance(&mut self.rng) else {
            return;
        };

        self.state.accelerate();
        log::debug!(
            "Wave {} {:?}: popup {:.3}s, chain {:.3}s, speed {:.3}",
            wave.index,
            wave.token,
            self.sequencer.popup_time,
            self.sequencer.chain_delay,
            self.state.world_speed
        );
        self.events.push(GameEvent::WaveLaunched {
            index: wave.index,
            token: wave.token,
        });

        for order in wave.spawns {
            if order.delay <= 0.0 {
                self.spawn_entity(stage, order.force);
            } else {
                let due = self.clock + order.delay as f64;
                self.timers
                    .schedule(self.id, due, TimerEvent::ChainSpawn { force: order.force });
            }
        }
    }

    // === Input ===

    /// Finger down / mouse press
    pub fn on_stroke_begin<S: Stage + ?Sized>(&mut self, stage: &mut S, point: Vec2) {
        if !self.state.input_enabled {
            return;
        }
        self.slice.clear_trail();
        self.slice.extend_trail(point);
        stage.draw_trail(&self.slice.points());
    }

    /// Finger drag: extend the trail and slice whatever is under the point
    pub fn on_stroke_move<S: Stage + ?Sized>(&mut self, stage: &mut S, point: Vec2) {
        if !self.state.input_enabled {
            return;
        }
        self.slice.extend_trail(point);
        stage.draw_trail(&self.slice.points());

        if !self.swoosh_active {
            let variant = self.rng.random_range(1..=SWOOSH_VARIANTS);
            stage.play_sound(SoundEffect::Swoosh(variant));
            self.swoosh_active = true;
            let due = self.clock + self.tuning.swoosh_duration as f64;
            self.timers.schedule(self.id, due, TimerEvent::SwooshFinished);
        }

        let hits = self.slice.hit_test(stage, point);
        self.resolve_hits(stage, &hits);
    }

    /// Finger up
    pub fn on_stroke_end<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        stage.fade_trail();
    }

    /// Apply slice rules to every body under the blade.
    ///
    /// Each handle is resolved on its own; a handle whose entity is gone or
    /// no longer active is skipped, so one burst never scores twice. Nothing
    /// after a bomb in the same burst counts.
    fn resolve_hits<S: Stage + ?Sized>(&mut self, stage: &mut S, hits: &[Handle]) {
        for &hit in hits {
            if self.state.game_ended {
                break;
            }
            if let Some(idx) = self.entities.iter().position(|e| e.hazard == Some(hit)) {
                self.slice_bomb(stage, idx);
            } else if let Some(idx) = self.entities.iter().position(|e| e.handle == hit) {
                match self.entities[idx].kind {
                    EntityKind::Normal | EntityKind::Bonus => self.slice_target(stage, idx),
                    // The casing itself is harmless
                    EntityKind::BombCasing | EntityKind::Bomb => {}
                }
            }
        }
    }

    fn slice_target<S: Stage + ?Sized>(&mut self, stage: &mut S, idx: usize) {
        let entity = &mut self.entities[idx];
        if !entity.resolve(EntityStatus::Sliced) {
            return;
        }
        let pos = stage.position(entity.handle).unwrap_or(entity.position);
        let (id, kind, handle) = (entity.id, entity.kind, entity.handle);

        let points = self.state.register_slice(kind);
        stage.play_effect(Effect::SliceHitEnemy, pos);
        stage.play_sound(SoundEffect::Whack);
        stage.remove(handle);
        self.entities.remove(idx);
        self.events.push(GameEvent::Sliced { id, kind, points });
    }

    fn slice_bomb<S: Stage + ?Sized>(&mut self, stage: &mut S, idx: usize) {
        let casing = &mut self.entities[idx];
        if !casing.resolve(EntityStatus::Sliced) {
            return;
        }
        let pos = stage.position(casing.handle).unwrap_or(casing.position);
        let (id, handle) = (casing.id, casing.handle);

        stage.play_effect(Effect::SliceHitBomb, pos);
        stage.play_sound(SoundEffect::Explosion);
        stage.remove(handle);
        self.entities.remove(idx);
        self.events.push(GameEvent::BombSliced { id });

        if self.state.end_game(EndCause::Bomb) {
            self.on_game_over(stage, EndCause::Bomb);
        }
    }

    /// Book an entity that fell off-screen. The caller removes it from the set.
    pub(super) fn expire<S: Stage + ?Sized>(&mut self, stage: &mut S, idx: usize) {
        let entity = &mut self.entities[idx];
        if !entity.resolve(EntityStatus::Expired) {
            return;
        }
        let (id, kind, handle) = (entity.id, entity.kind, entity.handle);

        stage.clear_actions(handle);
        stage.remove(handle);
        self.events.push(GameEvent::Expired { id, kind });

        match self.state.register_expiry(kind) {
            ExpiryOutcome::Ignored => {}
            ExpiryOutcome::LifeLost { remaining } => {
                stage.play_sound(SoundEffect::Wrong);
                self.events.push(GameEvent::LifeLost { remaining });
            }
            ExpiryOutcome::GameOver => {
                stage.play_sound(SoundEffect::Wrong);
                self.events.push(GameEvent::LifeLost { remaining: 0 });
                self.on_game_over(stage, EndCause::OutOfLives);
            }
        }
    }

    fn on_game_over<S: Stage + ?Sized>(&mut self, stage: &mut S, cause: EndCause) {
        self.fuse.stop(stage);
        self.slice.clear_trail();
        self.events.push(GameEvent::GameOver {
            cause,
            score: self.state.score,
        });
    }
}
