//! Collaborator interfaces consumed by the reactor.
//!
//! The reactor owns none of the surrounding world. Power, fuel, effects,
//! damage, global triggers and rule flags all arrive through these narrow
//! traits so every dependency shows up in a function signature. Readiness
//! checks are plain booleans; none of these methods can fail.

use crate::effect::{EffectKind, SoundKind};
use crate::event::Trigger;
use crate::geom::Vec2;

/// Read-only view of the power network the reactor is attached to.
pub trait PowerQuery {
    /// Power currently offered to the network by this building.
    fn supply(&self) -> f32;
    /// Power this building requests from the network.
    fn demand(&self) -> f32;
    /// Fraction of the building's request that the network satisfies, `[0, 1]`.
    fn satisfaction_ratio(&self) -> f32;
}

/// Fuel accounting for the building's item storage.
pub trait FuelInventory {
    /// Whether enough fuel is present for one consumption cycle.
    fn is_consumable(&self) -> bool;
    /// Remove one cycle's worth of fuel.
    fn consume_one(&mut self);
}

/// Effect playback in the world. Delayed effects are addressed purely by
/// position; they must not resolve back to the building that spawned them.
pub trait WorldEffects {
    fn play_immediate(&mut self, effect: EffectKind, at: Vec2);
    /// Queue `effect` to play `delay_ticks` from now. Must not block; a
    /// full queue drops the effect.
    fn schedule_delayed(&mut self, effect: EffectKind, at: Vec2, delay_ticks: f32);
    fn shake(&mut self, intensity: f32, duration: f32, at: Vec2);
    fn play_sound(&mut self, sound: SoundKind, at: Vec2) {
        let _ = (sound, at);
    }
}

/// Area damage primitive of the world.
pub trait AreaDamage {
    /// Damage everything damageable within `radius` world units of `at`.
    fn apply(&mut self, at: Vec2, radius: f32, amount: u32);
}

/// Global fire-and-forget trigger bus.
pub trait EventSink {
    fn emit(&mut self, trigger: Trigger);
}

/// Global rule flags.
pub trait RuleSet {
    /// Whether destroyed generators may explode.
    fn explosions_enabled(&self) -> bool;
    /// Simulation speed multiplier applied to fuel pacing.
    fn time_scale(&self) -> f32;
}

/// Sink that discards every trigger.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl EventSink for NullEvents {
    fn emit(&mut self, _trigger: Trigger) {}
}

/// Area damage that hits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDamage;

impl AreaDamage for NoDamage {
    fn apply(&mut self, _at: Vec2, _radius: f32, _amount: u32) {}
}
