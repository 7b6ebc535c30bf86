//! Global trigger events with a pre-allocated ring buffer.
//!
//! Reactors emit payload-free [`Trigger`]s through the [`EventSink`]
//! collaborator while they tick. The [`EventBus`] stamps each one with the
//! current tick, buffers it, and hands the batch to passive listeners when
//! the world calls [`EventBus::deliver`] at the end of the step.
//!
//! [`EventSink`]: crate::collab::EventSink

use crate::collab::EventSink;
use crate::sim::Ticks;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A fire-and-forget global trigger. Carries nothing beyond its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Trigger {
    /// A reactor's output just overtook its own power demand.
    ImpactPower,
}

/// A trigger as recorded by the bus, stamped with the tick it fired on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub trigger: Trigger,
    pub tick: Ticks,
}

// ---------------------------------------------------------------------------
// EventBuffer -- pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for event records. Fixed capacity; when full,
/// the oldest records are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    records: Vec<Option<EventRecord>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total records ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: vec![None; capacity],
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push a record. If full, the oldest record is dropped.
    pub fn push(&mut self, record: EventRecord) {
        self.records[self.head] = Some(record);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Iterate over records from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        // Once full, head points at the oldest entry.
        let start = if self.len < self.capacity() { 0 } else { self.head };
        (0..self.len).filter_map(move |i| {
            self.records[(start + i) % self.capacity()].as_ref()
        })
    }

    /// Clear all records. The lifetime write count is kept.
    pub fn clear(&mut self) {
        self.records.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A passive listener receives records read-only.
pub type PassiveListener = Box<dyn FnMut(&EventRecord)>;

/// The world's event bus: one ring buffer, listeners, per-trigger counters.
pub struct EventBus {
    buffer: EventBuffer,
    listeners: Vec<PassiveListener>,
    /// Tick stamped onto newly emitted records.
    current_tick: Ticks,
    impact_power_total: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffer", &self.buffer)
            .field("listeners", &self.listeners.len())
            .field("current_tick", &self.current_tick)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a new event bus holding at most `capacity` undelivered records.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: EventBuffer::new(capacity),
            listeners: Vec::new(),
            current_tick: 0,
            impact_power_total: 0,
        }
    }

    /// Set the tick stamped onto records emitted from now on.
    pub fn begin_tick(&mut self, tick: Ticks) {
        self.current_tick = tick;
    }

    /// Register a passive listener. Listeners run in registration order.
    pub fn on_passive(&mut self, listener: PassiveListener) {
        self.listeners.push(listener);
    }

    /// Deliver buffered records to every listener, oldest first, then clear.
    pub fn deliver(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let records: Vec<EventRecord> = self.buffer.iter().copied().collect();
        for listener in &mut self.listeners {
            for record in &records {
                listener(record);
            }
        }
        self.buffer.clear();
    }

    /// Records emitted but not yet delivered.
    pub fn pending(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.buffer.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.buffer.len()
    }

    /// Total records of `trigger` ever emitted (including dropped).
    pub fn total_emitted(&self, trigger: Trigger) -> u64 {
        match trigger {
            Trigger::ImpactPower => self.impact_power_total,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for EventBus {
    fn emit(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::ImpactPower => self.impact_power_total += 1,
        }
        self.buffer.push(EventRecord {
            trigger,
            tick: self.current_tick,
        });
    }
}
