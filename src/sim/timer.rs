//! Deferred events
//!
//! Delayed work (the next wave, chain follow-ups, the end of a swoosh) is
//! queued as plain data addressed to a session and delivered by the tick.
//! Nothing captures the session itself, so a stale event can only be dropped.

use serde::{Deserialize, Serialize};

use super::entity::ForceBomb;

/// Identity of one run; events carry it so a restarted run ignores old ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Work to do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Launch the next wave from the sequencer
    NextWave,
    /// A delayed member of a chain wave
    ChainSpawn { force: ForceBomb },
    /// The current swoosh sound finished playing
    SwooshFinished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled {
    due: f64,
    /// Insertion order, breaks ties between equal due times
    seq: u64,
    session: SessionId,
    event: TimerEvent,
}

/// One-shot timers ordered by due time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    pending: Vec<Scheduled>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` for `session` at absolute time `due`
    pub fn schedule(&mut self, session: SessionId, due: f64, event: TimerEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled {
            due,
            seq,
            session,
            event,
        });
    }

    /// Remove and return every event due at or before `now` for `session`,
    /// in due order. Events addressed to any other session are discarded.
    pub fn drain_due(&mut self, session: SessionId, now: f64) -> Vec<TimerEvent> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = rest;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter()
            .filter_map(|s| {
                if s.session == session {
                    Some(s.event)
                } else {
                    log::debug!("Dropping stale {:?} for {:?}", s.event, s.session);
                    None
                }
            })
            .collect()
    }

    /// Take over another queue's timers, keeping their addressees
    pub fn absorb(&mut self, other: TimerQueue) {
        for scheduled in other.pending {
            self.schedule(scheduled.session, scheduled.due, scheduled.event);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
