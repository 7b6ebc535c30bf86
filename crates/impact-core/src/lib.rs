//! Impact Core -- simulation of the impact reactor generator block.
//!
//! This crate models one power-generating structure in a tile world: it
//! burns fuel on a fixed cadence, ramps its output through an eased warmup
//! curve, and detonates with a choreographed burst of delayed effects when
//! destroyed while hot.
//!
//! # Per-Tick Pipeline
//!
//! Each call to [`world::ReactorWorld::step`] advances the simulation by one
//! tick:
//!
//! 1. **Reactors** -- every placed reactor runs [`reactor::ReactorEntity::update`]
//!    against its fuel bin and power link.
//! 2. **Effects** -- the [`effect::EffectDirector`] releases every delayed
//!    effect whose fire tick has arrived, in enqueue order.
//! 3. **Events** -- buffered triggers are delivered to listeners.
//! 4. **Bookkeeping** -- the tick counter advances.
//!
//! # Collaborators
//!
//! The reactor never reaches into global state. Everything it reads or
//! affects is passed in through the traits in [`collab`], bundled into a
//! [`reactor::TickContext`] or [`reactor::DestroyContext`]. The headless
//! [`world::ReactorWorld`] provides concrete implementations.
//!
//! # Key Types
//!
//! - [`reactor::ReactorEntity`] -- per-placement mutable state.
//! - [`config::ReactorBlockConfig`] -- immutable per-type configuration,
//!   shared through a frozen [`config::BlockRegistry`].
//! - [`easing::approach`] -- exponential approach with snap-to-target.
//! - [`production::ProductionState`] -- efficiency and rising-edge detection.
//! - [`effect::DelayedEffectScheduler`] -- tick-bucketed delayed effects.
//! - [`persist`] -- revisioned field stream for per-entity save data.
//! - [`serialize`] -- versioned world snapshots via bitcode.

pub mod collab;
pub mod color;
pub mod config;
pub mod easing;
pub mod effect;
pub mod event;
pub mod geom;
pub mod id;
pub mod persist;
pub mod production;
pub mod reactor;
pub mod rng;
pub mod serialize;
pub mod sim;
pub mod stats;
pub mod visual;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
