//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Deferred work is queued as data, never as closures over the session
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies beyond the [`Stage`](crate::stage::Stage) trait

pub mod entity;
pub mod sequencer;
pub mod session;
pub mod slice;
pub mod state;
pub mod tick;
pub mod timer;

pub use entity::{Entity, EntityId, EntityKind, EntityStatus, ForceBomb, Launch};
pub use sequencer::{SpawnOrder, SpawnSequencer, Wave, WaveToken, build_sequence};
pub use session::{GameEvent, GameSession};
pub use slice::SliceTracker;
pub use state::{EndCause, ExpiryOutcome, GameState, LifeIndicator};
pub use tick::tick;
pub use timer::{SessionId, TimerEvent, TimerQueue};
