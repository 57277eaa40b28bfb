//! Per-frame game loop
//!
//! Advances the session by one frame: physics, off-screen expiry, wave
//! pacing, deferred events and the fuse cue, in that order.

use super::entity::EntityStatus;
use super::session::GameSession;
use super::timer::TimerEvent;
use crate::stage::Stage;

/// Advance the session by `dt` seconds
pub fn tick<S: Stage + ?Sized>(session: &mut GameSession, stage: &mut S, dt: f32) {
    session.clock += dt as f64;

    // Frozen world: nothing moves, nothing spawns, late timers are dropped
    if session.state.game_ended {
        session.fuse.stop(stage);
        let stale = session.timers.drain_due(session.id, session.clock);
        if !stale.is_empty() {
            log::debug!("Ignoring {} timer event(s) after game over", stale.len());
        }
        return;
    }

    stage.step(dt, session.state.world_speed);

    expire_fallen(session, stage);

    if !session.state.game_ended {
        queue_next_wave(session);
        deliver_timers(session, stage);
    }

    sync_fuse(session, stage);
}

/// Book every active entity that dropped below the exit line
fn expire_fallen<S: Stage + ?Sized>(session: &mut GameSession, stage: &mut S) {
    let exit_y = session.tuning.exit_y;
    let mut idx = 0;

    while idx < session.entities.len() {
        // Ending the run freezes whatever is still in flight
        if session.state.game_ended {
            break;
        }

        let entity = &mut session.entities[idx];
        let Some(pos) = stage.position(entity.handle) else {
            log::warn!("Entity {:?} lost its body, dropping it", entity.id);
            entity.resolve(EntityStatus::Expired);
            session.entities.remove(idx);
            continue;
        };
        entity.position = pos;

        if entity.is_active() && pos.y < exit_y {
            session.expire(stage, idx);
            session.entities.remove(idx);
        } else {
            idx += 1;
        }
    }
}

/// Schedule the next wave once the field is empty
fn queue_next_wave(session: &mut GameSession) {
    if !session.entities.is_empty()
        || session.sequencer.pending_next_wave
        || session.sequencer.is_exhausted()
    {
        return;
    }

    let due = session.clock + session.sequencer.popup_time as f64;
    session.timers.schedule(session.id, due, TimerEvent::NextWave);
    session.sequencer.pending_next_wave = true;
}

fn deliver_timers<S: Stage + ?Sized>(session: &mut GameSession, stage: &mut S) {
    for event in session.timers.drain_due(session.id, session.clock) {
        if session.state.game_ended {
            log::debug!("Dropping {:?} after game over", event);
            continue;
        }
        match event {
            TimerEvent::NextWave => session.launch_wave(stage),
            TimerEvent::ChainSpawn { force } => {
                session.spawn_entity(stage, force);
            }
            TimerEvent::SwooshFinished => session.swoosh_active = false,
        }
    }
}

/// Fuse hiss plays exactly while a bomb is on screen
fn sync_fuse<S: Stage + ?Sized>(session: &mut GameSession, stage: &mut S) {
    let bombs_active = !session.state.game_ended
        && session
            .entities
            .iter()
            .any(|e| e.is_active() && e.kind.is_bomb_bearing());
    session.fuse.sync(stage, bombs_active);
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::audio::SoundEffect;
    use crate::consts::SIM_DT;
    use crate::sim::{EndCause, EntityKind, ForceBomb, GameEvent, LifeIndicator, WaveToken};
    use crate::stage::{Effect, HeadlessStage};
    use crate::tuning::Tuning;

    fn run(session: &mut GameSession, stage: &mut HeadlessStage, seconds: f32) {
        let steps = (seconds / SIM_DT).ceil() as u32;
        for _ in 0..steps {
            tick(session, stage, SIM_DT);
        }
    }

    fn scripted(tokens: Vec<WaveToken>) -> (GameSession, HeadlessStage) {
        (
            GameSession::with_sequence(7, Tuning::default(), tokens),
            HeadlessStage::new(),
        )
    }

    fn swipe(session: &mut GameSession, stage: &mut HeadlessStage, at: Vec2) {
        session.on_stroke_begin(stage, at + Vec2::new(0.0, 20.0));
        session.on_stroke_move(stage, at);
        session.on_stroke_end(stage);
    }

    fn entity_pos(session: &GameSession, stage: &HeadlessStage, i: usize) -> Vec2 {
        stage.position(session.entities()[i].handle).unwrap()
    }

    #[test]
    fn first_wave_waits_for_the_start_delay() {
        let (mut session, mut stage) = scripted(vec![WaveToken::OneNoBomb]);
        assert!(session.sequencer().pending_next_wave);

        run(&mut session, &mut stage, 1.9);
        assert!(session.entities().is_empty());

        run(&mut session, &mut stage, 0.2);
        assert_eq!(session.entities().len(), 1);
        assert_eq!(session.entities()[0].kind, EntityKind::Normal);
        assert!(stage.sounds().contains(&SoundEffect::Launch));
        assert!(!session.sequencer().pending_next_wave);
    }

    #[test]
    fn slicing_a_target_scores_one() {
        let (mut session, mut stage) = scripted(vec![WaveToken::OneNoBomb]);
        run(&mut session, &mut stage, 2.3);
        assert_eq!(session.entities().len(), 1);

        let at = entity_pos(&session, &stage, 0);
        swipe(&mut session, &mut stage, at);

        assert_eq!(session.score(), 1);
        assert_eq!(session.lives(), 3);
        assert!(!session.game_ended());
        assert!(session.entities().is_empty());
        assert_eq!(stage.body_count(), 0);
        assert!(stage.sounds().contains(&SoundEffect::Whack));
        assert!(stage.effects().iter().any(|(effect, pos)| *effect == Effect::SliceHitEnemy && *pos == at));
        assert!(stage.trail_faded());
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Sliced { kind: EntityKind::Normal, points: 1, .. })));
    }

    #[test]
    fn bonus_targets_score_five() {
        let (mut session, mut stage) = scripted(Vec::new());
        let mut rolled_bonus = false;
        for _ in 0..200 {
            session.spawn_entity(&mut stage, ForceBomb::Random);
            if session.entities().last().map(|e| e.kind) == Some(EntityKind::Bonus) {
                rolled_bonus = true;
                break;
            }
        }
        assert!(rolled_bonus);

        // Clear everything else off the field first
        let bonus = session.entities().len() - 1;
        for i in 0..bonus {
            let h = session.entities()[i].handle;
            stage.set_position(h, Vec2::new(-5000.0, 5000.0));
        }
        let h = session.entities()[bonus].handle;
        stage.set_position(h, Vec2::new(500.0, 400.0));

        swipe(&mut session, &mut stage, Vec2::new(500.0, 400.0));
        assert_eq!(session.score(), 5);
    }

    #[test]
    fn slicing_a_bomb_ends_the_run_and_blanks_all_lives() {
        let (mut session, mut stage) = (0..500u64)
            .find_map(|seed| {
                let mut session =
                    GameSession::with_sequence(seed, Tuning::default(), vec![WaveToken::One]);
                let mut stage = HeadlessStage::new();
                run(&mut session, &mut stage, 2.05);
                (session.entities()[0].kind == EntityKind::BombCasing).then_some((session, stage))
            })
            .expect("some seed lands on the bomb face");

        assert!(session.fuse_playing());
        assert_eq!(stage.active_loops(), 1);

        let at = entity_pos(&session, &stage, 0);
        swipe(&mut session, &mut stage, at);

        let state = session.state();
        assert!(state.game_ended);
        assert!(state.triggered_by_bomb());
        assert_eq!(state.lives, 3);
        assert_eq!(state.life_indicators, [LifeIndicator::Lost; 3]);
        assert_eq!(state.world_speed, 0.0);
        assert_eq!(session.score(), 0);
        assert!(!session.fuse_playing());
        assert_eq!(stage.active_loops(), 0);
        assert_eq!(stage.body_count(), 0);
        assert!(stage.sounds().contains(&SoundEffect::Explosion));
        assert!(stage.effects().iter().any(|(effect, pos)| *effect == Effect::SliceHitBomb && *pos == at));
        assert!(!stage.effects().iter().any(|(effect, _)| *effect == Effect::SliceHitEnemy));
    }

    #[test]
    fn bomb_casing_alone_is_harmless() {
        let (mut session, mut stage) = scripted(Vec::new());
        session.spawn_entity(&mut stage, ForceBomb::Always);
        let casing = session.entities()[0].handle;

        // A point inside the casing but outside the inner bomb
        let edge = stage.position(casing).unwrap() + Vec2::new(60.0, 0.0);
        swipe(&mut session, &mut stage, edge);

        assert!(!session.game_ended());
        assert_eq!(session.entities().len(), 1);
    }

    #[test]
    fn nothing_after_a_bomb_in_one_swipe_counts() {
        let spot = Vec2::new(500.0, 400.0);

        // Target listed first: it scores, then the bomb ends the run
        let (mut session, mut stage) = scripted(Vec::new());
        session.spawn_entity(&mut stage, ForceBomb::Never);
        session.spawn_entity(&mut stage, ForceBomb::Always);
        for e in session.entities().to_vec() {
            stage.set_position(e.handle, spot);
        }
        swipe(&mut session, &mut stage, spot);
        assert_eq!(session.score(), 1);
        assert!(session.game_ended());

        // Bomb listed first: the target behind it is ignored
        let (mut session, mut stage) = scripted(Vec::new());
        session.spawn_entity(&mut stage, ForceBomb::Always);
        session.spawn_entity(&mut stage, ForceBomb::Never);
        for e in session.entities().to_vec() {
            stage.set_position(e.handle, spot);
        }
        swipe(&mut session, &mut stage, spot);
        assert_eq!(session.score(), 0);
        assert!(session.game_ended());
        assert_eq!(session.entities().len(), 1);
    }

    #[test]
    fn three_missed_targets_end_the_run() {
        let (mut session, mut stage) = scripted(vec![WaveToken::OneNoBomb; 3]);
        run(&mut session, &mut stage, 40.0);

        let state = session.state();
        assert_eq!(state.lives, 0);
        assert!(state.game_ended);
        assert_eq!(state.end_cause, Some(EndCause::OutOfLives));
        assert!(!state.triggered_by_bomb());

        let lives: Vec<u8> = session
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::LifeLost { remaining } => Some(remaining),
                _ => None,
            })
            .collect();
        assert_eq!(lives, vec![2, 1, 0]);
        assert_eq!(stage.sounds().iter().filter(|s| **s == SoundEffect::Wrong).count(), 3);
    }

    #[test]
    fn only_one_wave_is_pending_at_a_time() {
        let (mut session, mut stage) = scripted(vec![WaveToken::OneNoBomb; 4]);
        run(&mut session, &mut stage, 2.3);
        let at = entity_pos(&session, &stage, 0);
        swipe(&mut session, &mut stage, at);
        session.drain_events();

        // Field is empty: exactly one NextWave gets queued however long we idle
        run(&mut session, &mut stage, 0.5);
        assert!(session.sequencer().pending_next_wave);
        assert!(session.drain_events().is_empty());

        run(&mut session, &mut stage, 0.5);
        let waves = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::WaveLaunched { .. }))
            .count();
        assert_eq!(waves, 1);
        assert_eq!(session.sequencer().position(), 2);
    }

    #[test]
    fn chain_followers_arrive_over_time() {
        let (mut session, mut stage) = scripted(vec![WaveToken::Chain]);
        run(&mut session, &mut stage, 2.02);
        assert_eq!(session.entities().len(), 1);

        run(&mut session, &mut stage, 2.5);
        let spawned = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Spawned { .. }))
            .count();
        assert_eq!(spawned, 5);
    }

    #[test]
    fn chain_spawns_after_game_over_are_ignored() {
        let (mut session, mut stage) = scripted(vec![WaveToken::Chain]);
        run(&mut session, &mut stage, 2.02);
        assert!(session.pending_timers() >= 4);

        // Park the chain leader out of reach, then blow up a bomb
        let leader = session.entities()[0].handle;
        stage.set_position(leader, Vec2::new(-5000.0, 5000.0));
        session.spawn_entity(&mut stage, ForceBomb::Always);
        let at = entity_pos(&session, &stage, 1);
        swipe(&mut session, &mut stage, at);
        assert!(session.game_ended());
        session.drain_events();

        let bodies = stage.body_count();
        let frozen = stage.position(leader);
        run(&mut session, &mut stage, 5.0);

        assert!(session.drain_events().is_empty());
        assert_eq!(stage.body_count(), bodies);
        assert_eq!(stage.position(leader), frozen);
        assert_eq!(session.pending_timers(), 0);
    }

    #[test]
    fn sliced_and_expired_resolve_once() {
        // Slice first, then the same frame's expiry check finds nothing
        let (mut session, mut stage) = scripted(vec![WaveToken::OneNoBomb]);
        run(&mut session, &mut stage, 2.1);
        let h = session.entities()[0].handle;
        let below = Vec2::new(400.0, -300.0);
        stage.set_position(h, below);
        stage.set_velocity(h, Vec2::ZERO);
        swipe(&mut session, &mut stage, below);
        tick(&mut session, &mut stage, SIM_DT);
        assert_eq!(session.score(), 1);
        assert_eq!(session.lives(), 3);

        // Expire first, then a late swipe over the same spot finds nothing
        let (mut session, mut stage) = scripted(vec![WaveToken::OneNoBomb]);
        run(&mut session, &mut stage, 2.1);
        let h = session.entities()[0].handle;
        stage.set_position(h, below);
        tick(&mut session, &mut stage, SIM_DT);
        swipe(&mut session, &mut stage, below);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), 2);
    }

    #[test]
    fn fuse_follows_bombs_on_screen() {
        let (mut session, mut stage) = scripted(vec![WaveToken::TwoWithOneBomb]);
        run(&mut session, &mut stage, 2.05);
        assert!(session.fuse_playing());

        let casing = session
            .entities()
            .iter()
            .find(|e| e.kind == EntityKind::BombCasing)
            .map(|e| e.handle)
            .unwrap();
        stage.set_position(casing, Vec2::new(300.0, -1000.0));
        tick(&mut session, &mut stage, SIM_DT);

        assert!(!session.fuse_playing());
        assert_eq!(stage.active_loops(), 0);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.entities().len(), 1);
    }

    #[test]
    fn swoosh_plays_once_per_sound_length() {
        let (mut session, mut stage) = scripted(Vec::new());
        let swooshes = |stage: &HeadlessStage| {
            stage
                .sounds()
                .iter()
                .filter(|s| matches!(s, SoundEffect::Swoosh(1..=3)))
                .count()
        };

        session.on_stroke_begin(&mut stage, Vec2::new(10.0, 700.0));
        session.on_stroke_move(&mut stage, Vec2::new(20.0, 700.0));
        session.on_stroke_move(&mut stage, Vec2::new(30.0, 700.0));
        assert_eq!(swooshes(&stage), 1);
        assert_eq!(stage.trail().len(), 3);

        run(&mut session, &mut stage, 0.5);
        session.on_stroke_move(&mut stage, Vec2::new(40.0, 700.0));
        assert_eq!(swooshes(&stage), 2);
    }

    #[test]
    fn input_is_ignored_after_game_over() {
        let (mut session, mut stage) = scripted(Vec::new());
        session.spawn_entity(&mut stage, ForceBomb::Always);
        let at = entity_pos(&session, &stage, 0);
        swipe(&mut session, &mut stage, at);
        assert!(session.game_ended());

        session.spawn_entity(&mut stage, ForceBomb::Never);
        let at = entity_pos(&session, &stage, 0);
        session.on_stroke_begin(&mut stage, at);
        session.on_stroke_move(&mut stage, at);
        assert!(session.tracker().is_empty());
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn restart_drops_the_old_runs_timers() {
        let (mut session, mut stage) = scripted(vec![WaveToken::Chain]);
        run(&mut session, &mut stage, 2.05);
        let old_id = session.id();
        session.on_stroke_begin(&mut stage, Vec2::new(900.0, 700.0));
        session.on_stroke_move(&mut stage, Vec2::new(950.0, 700.0));
        session.on_stroke_end(&mut stage);
        assert_eq!(stage.trail().len(), 2);

        session.restart(&mut stage, 99);
        assert!(stage.trail().is_empty());
        assert!(session.tracker().is_empty());
        assert_ne!(session.id(), old_id);
        assert!(session.entities().is_empty());
        assert_eq!(stage.body_count(), 0);
        assert_eq!(session.score(), 0);
        session.drain_events();

        run(&mut session, &mut stage, 1.9);
        assert!(session
            .drain_events()
            .iter()
            .all(|e| !matches!(e, GameEvent::Spawned { .. })));

        run(&mut session, &mut stage, 0.2);
        assert!(!session.entities().is_empty());
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = GameSession::new(4242, Tuning::default());
        let mut b = GameSession::new(4242, Tuning::default());
        let (mut sa, mut sb) = (HeadlessStage::new(), HeadlessStage::new());

        for step in 0..1200 {
            tick(&mut a, &mut sa, SIM_DT);
            tick(&mut b, &mut sb, SIM_DT);
            if step % 20 == 0 {
                let p = Vec2::new((step % 1000) as f32, 300.0);
                a.on_stroke_move(&mut sa, p);
                b.on_stroke_move(&mut sb, p);
            }
        }

        assert_eq!(a.drain_events(), b.drain_events());
        assert_eq!(a.score(), b.score());
        assert_eq!(a.lives(), b.lives());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn every_entity_resolves_at_most_once(
            seed in any::<u64>(),
            strokes in prop::collection::vec((0.0f32..1024.0, 0.0f32..768.0, 1u32..30), 1..60),
        ) {
            let mut session = GameSession::new(seed, Tuning::default());
            let mut stage = HeadlessStage::new();
            let mut last_score = 0;
            let mut last_lives = session.lives();
            let mut resolved = std::collections::HashSet::new();

            for (x, y, frames) in strokes {
                for _ in 0..frames {
                    tick(&mut session, &mut stage, SIM_DT);
                }
                session.on_stroke_move(&mut stage, Vec2::new(x, y));

                prop_assert!(session.score() >= last_score);
                prop_assert!(session.lives() <= last_lives);
                last_score = session.score();
                last_lives = session.lives();

                for event in session.drain_events() {
                    match event {
                        GameEvent::Sliced { id, .. }
                        | GameEvent::Expired { id, .. }
                        | GameEvent::BombSliced { id } => {
                            prop_assert!(resolved.insert(id), "entity {:?} resolved twice", id);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
