//! The impact reactor entity: per-tick state machine, detonation, save data.
//!
//! A reactor is **Active** while its fuel is consumable and its power
//! request is at least 99% satisfied, and **Idle** otherwise. Active
//! reactors ease warmup toward 1, burn fuel on a fixed cadence, and signal
//! [`Trigger::ImpactPower`] when their output first overtakes demand. Idle
//! reactors cool toward 0. Output efficiency is `warmup^5` on every tick.
//!
//! Destroying a reactor that is at least `min_warmup_to_explode` warm (and
//! explosions are allowed) damages everything in the blast radius and
//! scatters 96 delayed effects around the blast point. The delayed effects
//! carry only a position, so they play out after the entity is gone.

use serde::{Deserialize, Serialize};

use crate::collab::{AreaDamage, EventSink, FuelInventory, PowerQuery, RuleSet, WorldEffects};
use crate::config::ReactorBlockConfig;
use crate::easing::approach;
use crate::effect::{EffectKind, SoundKind};
use crate::event::Trigger;
use crate::geom::{TILE_SIZE, Vec2};
use crate::id::BlockTypeId;
use crate::persist::{PersistError, Reads, Writes};
use crate::production::ProductionState;
use crate::rng::SimRng;

/// Minimum power satisfaction for the reactor to run.
pub const ACTIVE_SATISFACTION: f32 = 0.99;

/// Multiplier applied to the configured explosion damage.
pub const EXPLOSION_DAMAGE_MULTIPLIER: u32 = 4;

/// Camera shake of a detonation.
pub const EXPLOSION_SHAKE_INTENSITY: f32 = 6.0;
pub const EXPLOSION_SHAKE_DURATION: f32 = 16.0;

/// Current save-data revision written by [`ReactorEntity::write`].
///
/// - 0: base generator fields only.
/// - 1: adds warmup.
pub const REACTOR_REVISION: u8 = 1;

/// One group of delayed effects spawned by a detonation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub effect: EffectKind,
    pub count: u32,
    /// Delays are uniform in `[0, max_delay)` ticks.
    pub max_delay: f32,
    /// Offsets from the blast point are uniform in `[0, max_offset)` world units.
    pub max_offset: f32,
}

/// Delayed effects of a detonation, in scheduling order.
pub const EXPLOSION_BURSTS: [Burst; 3] = [
    Burst {
        effect: EffectKind::ImpactCloud,
        count: 6,
        max_delay: 80.0,
        max_offset: 0.0,
    },
    Burst {
        effect: EffectKind::Explosion,
        count: 20,
        max_delay: 80.0,
        max_offset: 40.0,
    },
    Burst {
        effect: EffectKind::ImpactSmoke,
        count: 70,
        max_delay: 90.0,
        max_offset: 120.0,
    },
];

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// Collaborators visible to a reactor while it ticks.
///
/// A missing power or fuel collaborator reads as "not ready", which keeps
/// the reactor idle.
pub struct TickContext<'a> {
    pub power: Option<&'a dyn PowerQuery>,
    pub fuel: Option<&'a mut dyn FuelInventory>,
    pub rules: &'a dyn RuleSet,
    pub events: &'a mut dyn EventSink,
}

/// Collaborators visible to a reactor while it is being destroyed.
pub struct DestroyContext<'a> {
    pub rules: &'a dyn RuleSet,
    pub effects: &'a mut dyn WorldEffects,
    pub damage: &'a mut dyn AreaDamage,
    pub rng: &'a mut SimRng,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactorState {
    Idle,
    Active,
}

/// What happened during one [`ReactorEntity::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub state: ReactorState,
    pub fuel_consumed: bool,
    pub power_event: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FizzleReason {
    ExplosionsDisabled,
    TooCold,
}

/// Result of [`ReactorEntity::on_destroyed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detonation {
    /// Silent destruction: no damage, no effects.
    Fizzled(FizzleReason),
    Exploded {
        /// Delayed effects handed to the scheduler.
        scheduled: u32,
    },
}

// ---------------------------------------------------------------------------
// ReactorEntity
// ---------------------------------------------------------------------------

/// Mutable state of one placed reactor.
///
/// Serde goes through [`SavedReactor`], so snapshots carry the same
/// revisioned field stream as [`ReactorEntity::write`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SavedReactor", try_from = "SavedReactor")]
pub struct ReactorEntity {
    block: BlockTypeId,
    position: Vec2,
    warmup: f32,
    efficiency: f32,
    /// Active ticks since the last fuel consumption. Not saved.
    fuel_timer: f32,
    /// Edge detector for the power trigger. Not saved.
    production: ProductionState,
}

impl ReactorEntity {
    /// A cold reactor of type `block` at `position`.
    pub fn new(block: BlockTypeId, position: Vec2) -> Self {
        Self {
            block,
            position,
            warmup: 0.0,
            efficiency: 0.0,
            fuel_timer: 0.0,
            production: ProductionState::new(),
        }
    }

    pub fn block(&self) -> BlockTypeId {
        self.block
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn warmup(&self) -> f32 {
        self.warmup
    }

    /// Force the warmup (clamped to `[0, 1]`), e.g. for scenario setup.
    pub fn set_warmup(&mut self, warmup: f32) {
        self.warmup = if warmup.is_nan() { 0.0 } else { warmup.clamp(0.0, 1.0) };
        self.efficiency = ProductionState::efficiency(self.warmup);
    }

    pub fn fuel_timer(&self) -> f32 {
        self.fuel_timer
    }

    /// Output efficiency in `[0, 1]`, read by the power network.
    pub fn current_efficiency(&self) -> f32 {
        self.efficiency
    }

    /// Run one simulation tick.
    pub fn update(
        &mut self,
        config: &ReactorBlockConfig,
        ctx: &mut TickContext<'_>,
    ) -> TickOutcome {
        let fuel_ready = ctx.fuel.as_deref().is_some_and(|f| f.is_consumable());
        let powered = ctx
            .power
            .is_some_and(|p| p.satisfaction_ratio() >= ACTIVE_SATISFACTION);
        // The surplus reading is taken every tick, so an idle tick without
        // surplus re-arms the trigger.
        let crossed = ctx
            .power
            .is_some_and(|p| self.production.observe(p.supply(), p.demand()));

        let mut outcome = TickOutcome {
            state: ReactorState::Idle,
            fuel_consumed: false,
            power_event: false,
        };

        if fuel_ready && powered {
            outcome.state = ReactorState::Active;
            self.warmup = approach(self.warmup, 1.0, config.warmup_rise_per_tick);

            if crossed {
                tracing::debug!(block = ?self.block, "reactor output overtook demand");
                ctx.events.emit(Trigger::ImpactPower);
                outcome.power_event = true;
            }

            self.fuel_timer += 1.0;
            let time_scale = ctx.rules.time_scale();
            if time_scale > 0.0 && self.fuel_timer >= config.fuel_cycle_duration / time_scale {
                if let Some(fuel) = ctx.fuel.as_deref_mut() {
                    fuel.consume_one();
                }
                tracing::trace!(block = ?self.block, "reactor consumed fuel");
                self.fuel_timer = 0.0;
                outcome.fuel_consumed = true;
            }
        } else {
            self.warmup = approach(self.warmup, 0.0, config.warmup_fall_per_tick);
        }

        self.efficiency = ProductionState::efficiency(self.warmup);
        outcome
    }

    /// Evaluate the detonation of a reactor being destroyed.
    ///
    /// Called exactly once, by the world, while the entity still exists. The
    /// entity is not touched; everything it sets in motion is addressed by
    /// position.
    pub fn on_destroyed(
        &self,
        config: &ReactorBlockConfig,
        ctx: &mut DestroyContext<'_>,
    ) -> Detonation {
        if !ctx.rules.explosions_enabled() {
            tracing::debug!(block = ?self.block, "reactor destroyed with explosions disabled");
            return Detonation::Fizzled(FizzleReason::ExplosionsDisabled);
        }
        if self.warmup < config.min_warmup_to_explode {
            tracing::debug!(block = ?self.block, warmup = self.warmup, "reactor destroyed cold");
            return Detonation::Fizzled(FizzleReason::TooCold);
        }

        let at = self.position;
        tracing::info!(
            block = ?self.block,
            x = at.x,
            y = at.y,
            warmup = self.warmup,
            "impact reactor detonated"
        );

        ctx.effects.play_sound(SoundKind::ExplosionBig, at);
        ctx.effects.shake(EXPLOSION_SHAKE_INTENSITY, EXPLOSION_SHAKE_DURATION, at);
        ctx.effects.play_immediate(EffectKind::ImpactShockwave, at);
        ctx.damage.apply(
            at,
            config.explosion_radius * TILE_SIZE,
            config.explosion_damage.saturating_mul(EXPLOSION_DAMAGE_MULTIPLIER),
        );

        let mut scheduled = 0;
        for burst in &EXPLOSION_BURSTS {
            for _ in 0..burst.count {
                let delay = ctx.rng.range(burst.max_delay);
                let offset = if burst.max_offset > 0.0 {
                    let magnitude = ctx.rng.range(burst.max_offset);
                    ctx.rng.vector(magnitude)
                } else {
                    Vec2::ZERO
                };
                ctx.effects.schedule_delayed(burst.effect, at + offset, delay);
                scheduled += 1;
            }
        }

        Detonation::Exploded { scheduled }
    }

    /// Append save data: base generator fields, then warmup.
    pub fn write(&self, w: &mut Writes) {
        w.f32(self.efficiency);
        w.f32(self.warmup);
    }

    /// Restore save data written at `revision`.
    ///
    /// Fields newer than `revision` keep their zero value. The fuel timer and
    /// the power edge detector always restart from zero.
    pub fn read(&mut self, r: &mut Reads<'_>, revision: u8) -> Result<(), PersistError> {
        // Efficiency is re-derived below; the stored copy only keeps the
        // base layout intact.
        let _stored_efficiency = r.f32()?;
        let warmup = if revision >= 1 { r.f32()? } else { 0.0 };
        self.set_warmup(warmup);
        self.fuel_timer = 0.0;
        self.production.reset();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Save record
// ---------------------------------------------------------------------------

/// One reactor as stored in a save: identity, revision byte, field stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReactor {
    pub block: BlockTypeId,
    pub position: Vec2,
    pub revision: u8,
    pub payload: Vec<u8>,
}

impl From<ReactorEntity> for SavedReactor {
    fn from(entity: ReactorEntity) -> Self {
        let mut w = Writes::new();
        entity.write(&mut w);
        Self {
            block: entity.block,
            position: entity.position,
            revision: REACTOR_REVISION,
            payload: w.into_bytes(),
        }
    }
}

impl TryFrom<SavedReactor> for ReactorEntity {
    type Error = PersistError;

    fn try_from(saved: SavedReactor) -> Result<Self, Self::Error> {
        let mut entity = ReactorEntity::new(saved.block, saved.position);
        entity.read(&mut Reads::new(&saved.payload), saved.revision)?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::test_utils::*;

    fn config() -> ReactorBlockConfig {
        ReactorBlockConfig::default()
    }

    #[test]
    fn new_reactor_is_cold() {
        let r = ReactorEntity::new(BlockTypeId(0), Vec2::new(8.0, 8.0));
        assert_eq!(r.warmup(), 0.0);
        assert_eq!(r.current_efficiency(), 0.0);
        assert_eq!(r.fuel_timer(), 0.0);
    }

    #[test]
    fn active_tick_warms_and_idle_tick_cools() {
        let config = config();
        let mut harness = Harness::active();
        let mut r = reactor();

        let out = harness.tick(&mut r, &config);
        assert_eq!(out.state, ReactorState::Active);
        assert_eq!(r.warmup(), 0.001);

        harness.power.satisfaction = 0.5;
        let before = r.warmup();
        let out = harness.tick(&mut r, &config);
        assert_eq!(out.state, ReactorState::Idle);
        assert!(r.warmup() < before);
    }

    #[test]
    fn satisfaction_threshold_is_inclusive() {
        let config = config();
        let mut harness = Harness::active();
        harness.power.satisfaction = 0.99;
        let mut r = reactor();
        assert_eq!(harness.tick(&mut r, &config).state, ReactorState::Active);
        harness.power.satisfaction = 0.989;
        assert_eq!(harness.tick(&mut r, &config).state, ReactorState::Idle);
    }

    #[test]
    fn no_fuel_means_idle() {
        let config = config();
        let mut harness = Harness::active();
        harness.fuel.items = 0;
        let mut r = reactor();
        r.set_warmup(0.5);
        let out = harness.tick(&mut r, &config);
        assert_eq!(out.state, ReactorState::Idle);
        assert_eq!(harness.fuel.consumed, 0);
    }

    #[test]
    fn missing_collaborators_mean_idle() {
        let config = config();
        let rules = Rules::default();
        let mut events = RecordingEvents::default();
        let mut fuel = CountingFuel::with_items(10);
        let mut r = reactor();
        r.set_warmup(0.5);

        let mut ctx = TickContext {
            power: None,
            fuel: Some(&mut fuel),
            rules: &rules,
            events: &mut events,
        };
        assert_eq!(r.update(&config, &mut ctx).state, ReactorState::Idle);

        let power = FixedPower::satisfied();
        let mut ctx = TickContext {
            power: Some(&power),
            fuel: None,
            rules: &rules,
            events: &mut events,
        };
        assert_eq!(r.update(&config, &mut ctx).state, ReactorState::Idle);
        assert!(r.warmup() < 0.5);
    }

    #[test]
    fn efficiency_tracks_fifth_power() {
        let config = config();
        let mut harness = Harness::active();
        let mut r = reactor();
        r.set_warmup(0.8);
        for _ in 0..50 {
            harness.tick(&mut r, &config);
            assert_eq!(r.current_efficiency(), r.warmup().powi(5));
        }
    }

    #[test]
    fn fuel_consumed_on_cadence() {
        let config = config();
        let mut harness = Harness::active();
        let mut r = reactor();
        for tick in 1..=180 {
            let out = harness.tick(&mut r, &config);
            assert_eq!(out.fuel_consumed, tick % 60 == 0, "tick {tick}");
        }
        assert_eq!(harness.fuel.consumed, 3);
    }

    #[test]
    fn time_scale_shortens_fuel_cycle() {
        let config = config();
        let mut harness = Harness::active();
        harness.rules.time_scale = 2.0;
        let mut r = reactor();
        for _ in 0..120 {
            harness.tick(&mut r, &config);
        }
        assert_eq!(harness.fuel.consumed, 4);
    }

    #[test]
    fn idle_ticks_do_not_advance_fuel_timer() {
        let config = config();
        let mut harness = Harness::active();
        let mut r = reactor();
        for _ in 0..30 {
            harness.tick(&mut r, &config);
        }
        harness.power.satisfaction = 0.0;
        for _ in 0..100 {
            harness.tick(&mut r, &config);
        }
        assert_eq!(r.fuel_timer(), 30.0);
        harness.power.satisfaction = 1.0;
        for _ in 0..29 {
            harness.tick(&mut r, &config);
        }
        assert_eq!(harness.fuel.consumed, 0);
        harness.tick(&mut r, &config);
        assert_eq!(harness.fuel.consumed, 1);
    }

    #[test]
    fn power_event_on_rising_edge_only() {
        let config = config();
        let mut harness = Harness::active();
        harness.power.supply = 1.0;
        harness.power.demand = 2.0;
        let mut r = reactor();

        assert!(!harness.tick(&mut r, &config).power_event);
        harness.power.supply = 3.0;
        assert!(harness.tick(&mut r, &config).power_event);
        assert!(!harness.tick(&mut r, &config).power_event);
        harness.power.supply = 2.0;
        assert!(!harness.tick(&mut r, &config).power_event);
        harness.power.supply = 5.0;
        assert!(harness.tick(&mut r, &config).power_event);
        assert_eq!(harness.events.triggers, vec![Trigger::ImpactPower; 2]);
    }

    #[test]
    fn idle_tick_without_surplus_rearms_power_event() {
        let config = config();
        let mut harness = Harness::active();
        harness.power.supply = 2.0;
        harness.power.demand = 1.0;
        let mut r = reactor();
        assert!(harness.tick(&mut r, &config).power_event);

        harness.power.satisfaction = 0.5;
        harness.power.supply = 0.5;
        let out = harness.tick(&mut r, &config);
        assert_eq!(out.state, ReactorState::Idle);
        assert!(!out.power_event);

        harness.power.satisfaction = 1.0;
        harness.power.supply = 2.0;
        assert!(harness.tick(&mut r, &config).power_event);
        assert_eq!(harness.events.triggers, vec![Trigger::ImpactPower; 2]);
    }

    #[test]
    fn idle_surplus_is_tracked_but_not_signalled() {
        let config = config();
        let mut harness = Harness::active();
        harness.power.satisfaction = 0.5;
        harness.power.supply = 3.0;
        harness.power.demand = 1.0;
        let mut r = reactor();
        assert!(!harness.tick(&mut r, &config).power_event);

        // Surplus carried over from the idle tick is not a new crossing.
        harness.power.satisfaction = 1.0;
        assert!(!harness.tick(&mut r, &config).power_event);
        assert!(harness.events.triggers.is_empty());
    }

    #[test]
    fn cold_reactor_fizzles() {
        let config = config();
        let mut r = reactor();
        r.set_warmup(0.39);
        let mut fx = RecordingEffects::default();
        let mut dmg = RecordingDamage::default();
        let result = destroy(&r, &config, &Rules::default(), &mut fx, &mut dmg);
        assert_eq!(result, Detonation::Fizzled(FizzleReason::TooCold));
        assert!(fx.is_empty());
        assert!(dmg.hits.is_empty());
    }

    #[test]
    fn threshold_warmup_explodes() {
        let config = config();
        let mut r = reactor();
        r.set_warmup(0.4);
        let mut fx = RecordingEffects::default();
        let mut dmg = RecordingDamage::default();
        let result = destroy(&r, &config, &Rules::default(), &mut fx, &mut dmg);
        assert_eq!(result, Detonation::Exploded { scheduled: 96 });
    }

    #[test]
    fn disabled_explosions_fizzle_when_hot() {
        let config = config();
        let mut r = reactor();
        r.set_warmup(1.0);
        let rules = Rules {
            explosions_enabled: false,
            ..Rules::default()
        };
        let mut fx = RecordingEffects::default();
        let mut dmg = RecordingDamage::default();
        let result = destroy(&r, &config, &rules, &mut fx, &mut dmg);
        assert_eq!(result, Detonation::Fizzled(FizzleReason::ExplosionsDisabled));
        assert!(fx.is_empty());
        assert!(dmg.hits.is_empty());
    }

    #[test]
    fn hot_reactor_detonates() {
        let config = config();
        let mut r = reactor();
        r.set_warmup(1.0);
        let at = r.position();
        let mut fx = RecordingEffects::default();
        let mut dmg = RecordingDamage::default();
        destroy(&r, &config, &Rules::default(), &mut fx, &mut dmg);

        assert_eq!(fx.immediate, vec![(EffectKind::ImpactShockwave, at)]);
        assert_eq!(fx.shakes, vec![(6.0, 16.0, at)]);
        assert_eq!(fx.sounds, vec![(SoundKind::ExplosionBig, at)]);
        assert_eq!(dmg.hits, vec![(at, 50.0 * TILE_SIZE, 8000)]);
        assert_eq!(fx.delayed.len(), 96);

        for burst in &EXPLOSION_BURSTS {
            let group: Vec<_> = fx.delayed.iter().filter(|d| d.0 == burst.effect).collect();
            assert_eq!(group.len(), burst.count as usize);
            for &&(_, pos, delay) in &group {
                assert!(delay >= 0.0 && delay < burst.max_delay);
                if burst.max_offset == 0.0 {
                    assert_eq!(pos, at);
                } else {
                    assert!(pos.distance(at) < burst.max_offset + 1e-3);
                }
            }
        }
    }

    #[test]
    fn write_then_read_restores_warmup() {
        let mut r = reactor();
        r.set_warmup(0.73);
        let mut w = Writes::new();
        r.write(&mut w);
        let bytes = w.into_bytes();

        let mut restored = reactor();
        restored.fuel_timer = 12.0;
        restored
            .read(&mut Reads::new(&bytes), REACTOR_REVISION)
            .unwrap();
        assert_eq!(restored.warmup(), 0.73);
        assert_eq!(restored.current_efficiency(), 0.73f32.powi(5));
        assert_eq!(restored.fuel_timer(), 0.0);
    }

    #[test]
    fn revision_zero_stream_leaves_warmup_cold() {
        let mut w = Writes::new();
        w.f32(0.0);
        let bytes = w.into_bytes();
        let mut r = reactor();
        r.set_warmup(0.6);
        r.read(&mut Reads::new(&bytes), 0).unwrap();
        assert_eq!(r.warmup(), 0.0);
    }

    #[test]
    fn save_record_round_trips() {
        let mut r = reactor();
        r.set_warmup(0.73);
        let saved = SavedReactor::from(r.clone());
        assert_eq!(saved.revision, REACTOR_REVISION);
        assert_eq!(saved.payload.len(), 8);
        let restored = ReactorEntity::try_from(saved).unwrap();
        assert_eq!(restored, r);
    }

    #[test]
    fn corrupt_save_record_is_rejected() {
        let saved = SavedReactor {
            block: BlockTypeId(0),
            position: Vec2::ZERO,
            revision: REACTOR_REVISION,
            payload: vec![0; 6],
        };
        assert_eq!(
            ReactorEntity::try_from(saved),
            Err(PersistError::UnexpectedEof {
                needed: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn truncated_stream_fails() {
        let mut r = reactor();
        let err = r.read(&mut Reads::new(&[0, 0, 0, 0, 1]), REACTOR_REVISION);
        assert!(err.is_err());
    }
}
