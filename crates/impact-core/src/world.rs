//! Headless world driver.
//!
//! [`ReactorWorld`] owns every placed reactor together with the minimal
//! surroundings each one needs: a [`FuelBin`], a [`PowerLink`] describing
//! its grid connection, the shared block registry, rules, RNG, event bus,
//! and effect director. It is a stand-in for a real game world, not a fuel
//! accounting system or grid solver.
//!
//! # Step Pipeline
//!
//! 1. Every reactor ticks against its fuel bin and power link.
//! 2. Delayed effects due this tick move to the effect outbox.
//! 3. Buffered triggers are delivered to listeners.
//! 4. The tick counter advances.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::collab::{AreaDamage, FuelInventory, PowerQuery};
use crate::config::{BlockRegistry, Rules};
use crate::effect::{DEFAULT_EFFECT_CAPACITY, EffectCommand, EffectDirector};
use crate::event::EventBus;
use crate::geom::Vec2;
use crate::id::{BlockTypeId, ReactorId};
use crate::reactor::{DestroyContext, Detonation, ReactorEntity, ReactorState, TickContext};
use crate::rng::SimRng;
use crate::sim::{SimState, StateHash, Ticks};

/// Errors from world operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("unknown block type {0:?}")]
    UnknownBlock(BlockTypeId),
    #[error("unknown reactor {0:?}")]
    UnknownReactor(ReactorId),
}

// ---------------------------------------------------------------------------
// Per-reactor surroundings
// ---------------------------------------------------------------------------

/// Fuel items stored in a reactor. One cycle burns `per_cycle` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelBin {
    pub items: u32,
    pub per_cycle: u32,
}

impl Default for FuelBin {
    fn default() -> Self {
        Self {
            items: 0,
            per_cycle: 1,
        }
    }
}

impl FuelInventory for FuelBin {
    fn is_consumable(&self) -> bool {
        self.items >= self.per_cycle.max(1)
    }

    fn consume_one(&mut self) {
        self.items = self.items.saturating_sub(self.per_cycle.max(1));
    }
}

/// How the grid currently treats a reactor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLink {
    /// Fraction of the reactor's request being met, `[0, 1]`.
    pub satisfaction: f32,
    /// Power the reactor requests per tick.
    pub demand: f32,
}

/// The reactor's view of the grid: its own output versus its request.
struct LinkView {
    supply: f32,
    link: PowerLink,
}

impl PowerQuery for LinkView {
    fn supply(&self) -> f32 {
        self.supply
    }

    fn demand(&self) -> f32 {
        self.link.demand
    }

    fn satisfaction_ratio(&self) -> f32 {
        self.link.satisfaction
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ReactorSlot {
    pub(crate) entity: ReactorEntity,
    pub(crate) fuel: FuelBin,
    pub(crate) link: PowerLink,
}

/// Summary of one [`ReactorWorld::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub tick: Ticks,
    pub active: usize,
    pub fuel_consumed: usize,
    pub power_events: usize,
    pub effects_released: usize,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A headless world of impact reactors.
#[derive(Debug)]
pub struct ReactorWorld {
    pub(crate) registry: BlockRegistry,
    pub(crate) rules: Rules,
    pub(crate) reactors: SlotMap<ReactorId, ReactorSlot>,
    pub(crate) rng: SimRng,
    pub(crate) events: EventBus,
    pub(crate) effects: EffectDirector,
    pub(crate) sim_state: SimState,
}

impl ReactorWorld {
    pub fn new(registry: BlockRegistry, rules: Rules, seed: u64) -> Self {
        Self {
            registry,
            rules,
            reactors: SlotMap::with_key(),
            rng: SimRng::new(seed),
            events: EventBus::default(),
            effects: EffectDirector::new(DEFAULT_EFFECT_CAPACITY),
            sim_state: SimState::new(),
        }
    }

    /// Place a cold reactor. It starts unfueled and unpowered.
    pub fn place(&mut self, block: BlockTypeId, position: Vec2) -> Result<ReactorId, WorldError> {
        let config = self
            .registry
            .get(block)
            .ok_or(WorldError::UnknownBlock(block))?;
        let slot = ReactorSlot {
            entity: ReactorEntity::new(block, position),
            fuel: FuelBin::default(),
            link: PowerLink {
                satisfaction: 0.0,
                demand: config.power_use,
            },
        };
        let id = self.reactors.insert(slot);
        tracing::debug!(?id, ?block, x = position.x, y = position.y, "reactor placed");
        Ok(id)
    }

    pub fn add_fuel(&mut self, id: ReactorId, items: u32) -> Result<(), WorldError> {
        let slot = self.slot_mut(id)?;
        slot.fuel.items = slot.fuel.items.saturating_add(items);
        Ok(())
    }

    pub fn set_power(&mut self, id: ReactorId, link: PowerLink) -> Result<(), WorldError> {
        self.slot_mut(id)?.link = link;
        Ok(())
    }

    /// Set grid satisfaction, keeping the reactor's configured demand.
    pub fn set_satisfaction(&mut self, id: ReactorId, satisfaction: f32) -> Result<(), WorldError> {
        self.slot_mut(id)?.link.satisfaction = satisfaction;
        Ok(())
    }

    fn slot_mut(&mut self, id: ReactorId) -> Result<&mut ReactorSlot, WorldError> {
        self.reactors
            .get_mut(id)
            .ok_or(WorldError::UnknownReactor(id))
    }

    /// Advance the world by one tick.
    pub fn step(&mut self) -> StepReport {
        let tick = self.sim_state.tick;
        let mut report = StepReport {
            tick,
            ..StepReport::default()
        };
        self.events.begin_tick(tick);
        self.effects.set_clock(tick);

        for slot in self.reactors.values_mut() {
            let Some(config) = self.registry.get(slot.entity.block()) else {
                continue;
            };
            let view = LinkView {
                supply: config.power_production * slot.entity.current_efficiency(),
                link: slot.link,
            };
            let mut ctx = TickContext {
                power: Some(&view),
                fuel: Some(&mut slot.fuel),
                rules: &self.rules,
                events: &mut self.events,
            };
            let outcome = slot.entity.update(config, &mut ctx);
            if outcome.state == ReactorState::Active {
                report.active += 1;
            }
            report.fuel_consumed += usize::from(outcome.fuel_consumed);
            report.power_events += usize::from(outcome.power_event);
        }

        report.effects_released = self.effects.advance(tick);

        self.events.deliver();
        self.sim_state.tick += 1;
        report
    }

    /// Destroy a reactor, evaluating its detonation first.
    ///
    /// Delayed effects it schedules keep playing after the reactor is gone.
    pub fn destroy(
        &mut self,
        id: ReactorId,
        damage: &mut dyn AreaDamage,
    ) -> Result<Detonation, WorldError> {
        let slot = self.reactors.get(id).ok_or(WorldError::UnknownReactor(id))?;
        let block = slot.entity.block();
        let config = self
            .registry
            .get(block)
            .ok_or(WorldError::UnknownBlock(block))?;

        self.effects.set_clock(self.sim_state.tick);
        let mut ctx = DestroyContext {
            rules: &self.rules,
            effects: &mut self.effects,
            damage,
            rng: &mut self.rng,
        };
        let detonation = slot.entity.on_destroyed(config, &mut ctx);
        self.reactors.remove(id);
        Ok(detonation)
    }

    /// Effects the host should play, drained.
    pub fn drain_effects(&mut self) -> Vec<EffectCommand> {
        self.effects.drain_commands()
    }

    pub fn reactor(&self, id: ReactorId) -> Option<&ReactorEntity> {
        self.reactors.get(id).map(|s| &s.entity)
    }

    /// Mutable access to a reactor, e.g. to force its warmup in a scenario.
    pub fn reactor_mut(&mut self, id: ReactorId) -> Option<&mut ReactorEntity> {
        self.reactors.get_mut(id).map(|s| &mut s.entity)
    }

    pub fn fuel(&self, id: ReactorId) -> Option<FuelBin> {
        self.reactors.get(id).map(|s| s.fuel)
    }

    pub fn efficiency(&self, id: ReactorId) -> Option<f32> {
        self.reactor(id).map(ReactorEntity::current_efficiency)
    }

    /// Power a reactor currently produces per tick.
    pub fn power_output(&self, id: ReactorId) -> Option<f32> {
        let entity = self.reactor(id)?;
        let config = self.registry.get(entity.block())?;
        Some(config.power_production * entity.current_efficiency())
    }

    pub fn reactor_ids(&self) -> impl Iterator<Item = ReactorId> + '_ {
        self.reactors.keys()
    }

    pub fn reactor_count(&self) -> usize {
        self.reactors.len()
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: Rules) {
        self.rules = rules;
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn effects(&self) -> &EffectDirector {
        &self.effects
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    /// Deterministic hash of the simulation state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.sim_state.tick);
        h.write_u64(self.rng.state());
        for slot in self.reactors.values() {
            h.write_f32(slot.entity.warmup());
            h.write_f32(slot.entity.fuel_timer());
            h.write_u64(u64::from(slot.fuel.items));
        }
        h.write_u64(self.effects.scheduler().len() as u64);
        h.finish()
    }
}
