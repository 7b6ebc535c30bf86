//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::collab::{AreaDamage, EventSink, FuelInventory, PowerQuery, WorldEffects};
use crate::config::{ReactorBlockConfig, Rules};
use crate::effect::{EffectKind, SoundKind};
use crate::event::Trigger;
use crate::geom::Vec2;
use crate::id::BlockTypeId;
use crate::reactor::{DestroyContext, Detonation, ReactorEntity, TickContext, TickOutcome};
use crate::rng::SimRng;

/// Seed used by [`destroy`] so detonation tests are reproducible.
pub const TEST_SEED: u64 = 0xDEAD_BEEF;

// ===========================================================================
// Fake collaborators
// ===========================================================================

/// Power view with fixed readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPower {
    pub supply: f32,
    pub demand: f32,
    pub satisfaction: f32,
}

impl FixedPower {
    /// Fully satisfied, no surplus.
    pub fn satisfied() -> Self {
        Self {
            supply: 0.0,
            demand: 0.0,
            satisfaction: 1.0,
        }
    }
}

impl PowerQuery for FixedPower {
    fn supply(&self) -> f32 {
        self.supply
    }

    fn demand(&self) -> f32 {
        self.demand
    }

    fn satisfaction_ratio(&self) -> f32 {
        self.satisfaction
    }
}

/// Fuel store that counts consumptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountingFuel {
    pub items: u32,
    pub consumed: u32,
}

impl CountingFuel {
    pub fn with_items(items: u32) -> Self {
        Self { items, consumed: 0 }
    }
}

impl FuelInventory for CountingFuel {
    fn is_consumable(&self) -> bool {
        self.items > 0
    }

    fn consume_one(&mut self) {
        self.items = self.items.saturating_sub(1);
        self.consumed += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingEvents {
    pub triggers: Vec<Trigger>,
}

impl EventSink for RecordingEvents {
    fn emit(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }
}

/// Records every effect call verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingEffects {
    pub immediate: Vec<(EffectKind, Vec2)>,
    pub delayed: Vec<(EffectKind, Vec2, f32)>,
    pub shakes: Vec<(f32, f32, Vec2)>,
    pub sounds: Vec<(SoundKind, Vec2)>,
}

impl RecordingEffects {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty()
            && self.delayed.is_empty()
            && self.shakes.is_empty()
            && self.sounds.is_empty()
    }
}

impl WorldEffects for RecordingEffects {
    fn play_immediate(&mut self, effect: EffectKind, at: Vec2) {
        self.immediate.push((effect, at));
    }

    fn schedule_delayed(&mut self, effect: EffectKind, at: Vec2, delay_ticks: f32) {
        self.delayed.push((effect, at, delay_ticks));
    }

    fn shake(&mut self, intensity: f32, duration: f32, at: Vec2) {
        self.shakes.push((intensity, duration, at));
    }

    fn play_sound(&mut self, sound: SoundKind, at: Vec2) {
        self.sounds.push((sound, at));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingDamage {
    pub hits: Vec<(Vec2, f32, u32)>,
}

impl AreaDamage for RecordingDamage {
    fn apply(&mut self, at: Vec2, radius: f32, amount: u32) {
        self.hits.push((at, radius, amount));
    }
}

// ===========================================================================
// Harness
// ===========================================================================

/// A reactor's surroundings bundled for repeated ticking.
#[derive(Debug, Clone)]
pub struct Harness {
    pub power: FixedPower,
    pub fuel: CountingFuel,
    pub rules: Rules,
    pub events: RecordingEvents,
}

impl Harness {
    /// Powered, fueled, default rules.
    pub fn active() -> Self {
        Self {
            power: FixedPower::satisfied(),
            fuel: CountingFuel::with_items(1_000),
            rules: Rules::default(),
            events: RecordingEvents::default(),
        }
    }

    /// No power at all.
    pub fn idle() -> Self {
        Self {
            power: FixedPower {
                satisfaction: 0.0,
                ..FixedPower::satisfied()
            },
            ..Self::active()
        }
    }

    pub fn tick(
        &mut self,
        reactor: &mut ReactorEntity,
        config: &ReactorBlockConfig,
    ) -> TickOutcome {
        let mut ctx = TickContext {
            power: Some(&self.power),
            fuel: Some(&mut self.fuel),
            rules: &self.rules,
            events: &mut self.events,
        };
        reactor.update(config, &mut ctx)
    }
}

/// A cold default reactor one tile from the origin.
pub fn reactor() -> ReactorEntity {
    ReactorEntity::new(BlockTypeId(0), Vec2::from_tile(1, 1))
}

/// Destroy `reactor` with a fixed-seed RNG, recording all side effects.
pub fn destroy(
    reactor: &ReactorEntity,
    config: &ReactorBlockConfig,
    rules: &Rules,
    effects: &mut RecordingEffects,
    damage: &mut RecordingDamage,
) -> Detonation {
    let mut rng = SimRng::new(TEST_SEED);
    let mut ctx = DestroyContext {
        rules,
        effects,
        damage,
        rng: &mut rng,
    };
    reactor.on_destroyed(config, &mut ctx)
}
