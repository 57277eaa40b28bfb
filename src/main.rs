//! Slice Ninja headless runner
//!
//! Plays one run against the headless stage with a simple autoplay bot and
//! reports the result. Usage: `slice-ninja [tuning.json] [seed]`

use glam::Vec2;

use slice_ninja::consts::{ENTITY_RADIUS, MAX_SUBSTEPS, SIM_DT};
use slice_ninja::sim::{EntityKind, GameEvent, GameSession, tick};
use slice_ninja::{HeadlessStage, Stage, Tuning};

/// Wall-clock frame length the runner pretends to render at
const FRAME_DT: f32 = 1.0 / 50.0;
/// Give up after this many seconds even if the bot is still alive
const MAX_RUN_SECONDS: f32 = 600.0;
/// Seconds between bot swipes
const SWIPE_INTERVAL: f32 = 0.15;

/// Swipes at the highest target that has no bomb nearby
struct Autoplay {
    cooldown: f32,
}

impl Autoplay {
    fn new() -> Self {
        Self { cooldown: 0.0 }
    }

    fn update(&mut self, session: &mut GameSession, stage: &mut HeadlessStage, dt: f32) {
        self.cooldown -= dt;
        if self.cooldown > 0.0 || session.game_ended() {
            return;
        }

        let positions: Vec<(EntityKind, Vec2)> = session
            .entities()
            .iter()
            .filter_map(|e| stage.position(e.handle).map(|p| (e.kind, p)))
            .collect();
        let bombs: Vec<Vec2> = positions
            .iter()
            .filter(|(kind, _)| kind.is_bomb_bearing())
            .map(|(_, p)| *p)
            .collect();

        let target = positions
            .iter()
            .filter(|(kind, _)| matches!(kind, EntityKind::Normal | EntityKind::Bonus))
            .filter(|(_, p)| p.y > 0.0)
            .filter(|(_, p)| bombs.iter().all(|b| b.distance(*p) > ENTITY_RADIUS * 2.5))
            .max_by(|a, b| a.1.y.total_cmp(&b.1.y))
            .map(|(_, p)| *p);

        if let Some(point) = target {
            session.on_stroke_begin(stage, point + Vec2::new(-30.0, 30.0));
            session.on_stroke_move(stage, point);
            session.on_stroke_end(stage);
            self.cooldown = SWIPE_INTERVAL;
        }
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load(path),
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0x5EED);

    log::info!("Slice Ninja (headless) starting with seed {}", seed);

    let mut session = GameSession::new(seed, tuning);
    let mut stage = HeadlessStage::new();
    let mut bot = Autoplay::new();
    let mut accumulator = 0.0;
    let mut elapsed = 0.0;
    let mut waves = 0;

    while !session.game_ended() && elapsed < MAX_RUN_SECONDS {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut session, &mut stage, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        bot.update(&mut session, &mut stage, FRAME_DT);

        for event in session.drain_events() {
            match event {
                GameEvent::WaveLaunched { index, token } => {
                    waves += 1;
                    log::debug!("Wave {} launched: {:?}", index, token);
                }
                GameEvent::LifeLost { remaining } => log::info!("Life lost, {} left", remaining),
                GameEvent::GameOver { cause, score } => {
                    log::info!("Game over by {:?} with score {}", cause, score)
                }
                _ => {}
            }
        }
    }

    println!(
        "seed {} | score {} | lives {} | waves {} | {:.1}s",
        seed,
        session.score(),
        session.lives(),
        waves,
        elapsed
    );
}
