//! Delayed effect scheduling.
//!
//! Effects are plain data: a kind and a world position. Scheduling samples
//! everything up front and files the entry under its absolute fire tick in
//! a bucket map, so nothing in the queue refers back to the building that
//! spawned it. The world services the queue once per tick; due entries come
//! out in the order they were enqueued, regardless of their delay.
//!
//! [`EffectDirector`] is the world's [`WorldEffects`] implementation. It
//! routes immediate plays, sounds and shakes straight to an outbox and
//! delayed plays through a [`DelayedEffectScheduler`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collab::WorldEffects;
use crate::geom::Vec2;
use crate::sim::Ticks;

/// Default maximum number of pending delayed effects.
pub const DEFAULT_EFFECT_CAPACITY: usize = 4096;

// ---------------------------------------------------------------------------
// Effect identifiers
// ---------------------------------------------------------------------------

/// Visual effects the reactor can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Large expanding ring played the instant a reactor detonates.
    ImpactShockwave,
    ImpactCloud,
    Explosion,
    ImpactSmoke,
}

/// Sounds the reactor can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundKind {
    ExplosionBig,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Errors returned by [`DelayedEffectScheduler::schedule`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("effect queue full ({capacity} pending)")]
    Full { capacity: usize },
}

/// One pending effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEffect {
    /// Enqueue order, unique per scheduler.
    pub seq: u64,
    pub effect: EffectKind,
    pub at: Vec2,
    /// Delay requested at enqueue time, in ticks.
    pub delay: f32,
    /// Absolute tick on which the effect becomes due.
    pub fire_tick: Ticks,
}

/// Tick-bucketed queue of effects waiting to play.
///
/// The pending count is not stored; loading recounts it from the buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SchedulerRecord")]
pub struct DelayedEffectScheduler {
    buckets: BTreeMap<Ticks, Vec<ScheduledEffect>>,
    #[serde(skip)]
    len: usize,
    capacity: usize,
    next_seq: u64,
    dropped: u64,
}

#[derive(Deserialize)]
struct SchedulerRecord {
    buckets: BTreeMap<Ticks, Vec<ScheduledEffect>>,
    capacity: usize,
    next_seq: u64,
    dropped: u64,
}

impl From<SchedulerRecord> for DelayedEffectScheduler {
    fn from(record: SchedulerRecord) -> Self {
        let len = record.buckets.values().map(Vec::len).sum();
        Self {
            buckets: record.buckets,
            len,
            capacity: record.capacity,
            next_seq: record.next_seq,
            dropped: record.dropped,
        }
    }
}

impl DelayedEffectScheduler {
    /// Create a scheduler holding at most `capacity` pending effects.
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: BTreeMap::new(),
            len: 0,
            capacity,
            next_seq: 0,
            dropped: 0,
        }
    }

    /// Queue `effect` at `at`, due `delay` ticks after `now`.
    ///
    /// A fractional delay rounds up to the next whole tick; negative or NaN
    /// delays are treated as zero (due on `now` itself).
    pub fn schedule(
        &mut self,
        now: Ticks,
        effect: EffectKind,
        at: Vec2,
        delay: f32,
    ) -> Result<(), ScheduleError> {
        if self.len >= self.capacity {
            self.dropped += 1;
            return Err(ScheduleError::Full {
                capacity: self.capacity,
            });
        }
        let delay = if delay.is_nan() { 0.0 } else { delay.max(0.0) };
        let fire_tick = now.saturating_add(delay.ceil() as Ticks);
        let entry = ScheduledEffect {
            seq: self.next_seq,
            effect,
            at,
            delay,
            fire_tick,
        };
        self.next_seq += 1;
        self.buckets.entry(fire_tick).or_default().push(entry);
        self.len += 1;
        Ok(())
    }

    /// Remove and return every effect due on or before `now`, in enqueue order.
    pub fn drain_due(&mut self, now: Ticks) -> Vec<ScheduledEffect> {
        let later = match now.checked_add(1) {
            Some(next) => self.buckets.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.buckets, later);
        let mut fired: Vec<ScheduledEffect> = due.into_values().flatten().collect();
        fired.sort_by_key(|e| e.seq);
        self.len -= fired.len();
        fired
    }

    /// Pending effects in fire-tick order.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledEffect> + '_ {
        self.buckets.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Effects rejected because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl Default for DelayedEffectScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_EFFECT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Director
// ---------------------------------------------------------------------------

/// Something the host should play this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectCommand {
    Play { effect: EffectKind, at: Vec2 },
    Sound { sound: SoundKind, at: Vec2 },
    Shake { intensity: f32, duration: f32, at: Vec2 },
}

/// The world's effect front end: immediate outbox plus delayed queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectDirector {
    scheduler: DelayedEffectScheduler,
    now: Ticks,
    #[serde(skip)]
    outbox: Vec<EffectCommand>,
}

impl EffectDirector {
    pub fn new(capacity: usize) -> Self {
        Self {
            scheduler: DelayedEffectScheduler::new(capacity),
            now: 0,
            outbox: Vec::new(),
        }
    }

    /// Set the tick that newly scheduled delays are measured from.
    pub fn set_clock(&mut self, now: Ticks) {
        self.now = now;
    }

    /// Set the clock and move every delayed effect now due into the outbox.
    /// Returns how many were released.
    pub fn advance(&mut self, now: Ticks) -> usize {
        self.now = now;
        let due = self.scheduler.drain_due(now);
        let released = due.len();
        self.outbox.extend(due.into_iter().map(|e| EffectCommand::Play {
            effect: e.effect,
            at: e.at,
        }));
        released
    }

    /// Take everything the host should play.
    pub fn drain_commands(&mut self) -> Vec<EffectCommand> {
        std::mem::take(&mut self.outbox)
    }

    /// Commands waiting in the outbox.
    pub fn pending_commands(&self) -> usize {
        self.outbox.len()
    }

    pub fn scheduler(&self) -> &DelayedEffectScheduler {
        &self.scheduler
    }

    pub fn now(&self) -> Ticks {
        self.now
    }
}

impl WorldEffects for EffectDirector {
    fn play_immediate(&mut self, effect: EffectKind, at: Vec2) {
        self.outbox.push(EffectCommand::Play { effect, at });
    }

    fn schedule_delayed(&mut self, effect: EffectKind, at: Vec2, delay_ticks: f32) {
        if let Err(err) = self.scheduler.schedule(self.now, effect, at, delay_ticks) {
            tracing::warn!(?effect, %err, "dropping delayed effect");
        }
    }

    fn shake(&mut self, intensity: f32, duration: f32, at: Vec2) {
        self.outbox.push(EffectCommand::Shake {
            intensity,
            duration,
            at,
        });
    }

    fn play_sound(&mut self, sound: SoundKind, at: Vec2) {
        self.outbox.push(EffectCommand::Sound { sound, at });
    }
}
