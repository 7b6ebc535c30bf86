//! Block configuration, global rules, and the frozen block registry.
//!
//! A [`ReactorBlockConfig`] describes one reactor block type. It is shared,
//! immutable, and looked up by [`BlockTypeId`]; placed reactors store only
//! the id. The [`BlockRegistry`] is assembled through a
//! [`RegistryBuilder`] and frozen before the world starts ticking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collab::RuleSet;
use crate::color::Rgb;
use crate::id::BlockTypeId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{block}: {field} = {value} is out of range ({expected})")]
    OutOfRange {
        block: String,
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("duplicate block name '{0}'")]
    DuplicateName(String),
    #[error("time_scale = {0} must be positive and finite")]
    TimeScale(f32),
}

// ---------------------------------------------------------------------------
// ReactorBlockConfig
// ---------------------------------------------------------------------------

/// Immutable per-type configuration of an impact reactor block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorBlockConfig {
    pub name: String,
    /// Footprint edge length in tiles.
    pub size: u8,
    /// Number of concentric plasma layers drawn over the core.
    pub plasma_layers: u32,
    /// Easing rate toward full warmup while active.
    pub warmup_rise_per_tick: f32,
    /// Easing rate toward zero warmup while idle.
    pub warmup_fall_per_tick: f32,
    /// Active ticks between fuel consumptions at time scale 1.
    pub fuel_cycle_duration: f32,
    /// Blast radius in tiles.
    pub explosion_radius: f32,
    /// Base blast damage before the fixed multiplier.
    pub explosion_damage: u32,
    /// Warmup below which destruction is silent.
    pub min_warmup_to_explode: f32,
    /// Power produced per tick at full efficiency.
    pub power_production: f32,
    /// Power requested per tick to keep the reaction contained.
    pub power_use: f32,
    pub plasma_inner: Rgb,
    pub plasma_outer: Rgb,
}

impl Default for ReactorBlockConfig {
    fn default() -> Self {
        Self {
            name: "impact-reactor".to_string(),
            size: 4,
            plasma_layers: 4,
            warmup_rise_per_tick: 0.001,
            warmup_fall_per_tick: 0.01,
            fuel_cycle_duration: 60.0,
            explosion_radius: 50.0,
            explosion_damage: 2000,
            min_warmup_to_explode: 0.4,
            power_production: 130.0 / 60.0,
            power_use: 25.0 / 60.0,
            plasma_inner: Rgb::new(1.0, 208.0 / 255.0, 107.0 / 255.0),
            plasma_outer: Rgb::new(1.0, 54.0 / 255.0, 27.0 / 255.0),
        }
    }
}

impl ReactorBlockConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let out_of_range = |field: &'static str, value: f64, expected: &'static str| {
            Err(ConfigError::OutOfRange {
                block: self.name.clone(),
                field,
                value,
                expected,
            })
        };
        let unit_open = |v: f32| v > 0.0 && v <= 1.0;

        if self.size == 0 {
            return out_of_range("size", 0.0, ">= 1");
        }
        if self.plasma_layers == 0 {
            return out_of_range("plasma_layers", 0.0, ">= 1");
        }
        if !unit_open(self.warmup_rise_per_tick) {
            return out_of_range(
                "warmup_rise_per_tick",
                self.warmup_rise_per_tick.into(),
                "(0, 1]",
            );
        }
        if !unit_open(self.warmup_fall_per_tick) {
            return out_of_range(
                "warmup_fall_per_tick",
                self.warmup_fall_per_tick.into(),
                "(0, 1]",
            );
        }
        if !(self.fuel_cycle_duration > 0.0 && self.fuel_cycle_duration.is_finite()) {
            return out_of_range(
                "fuel_cycle_duration",
                self.fuel_cycle_duration.into(),
                "> 0",
            );
        }
        if !(self.explosion_radius > 0.0 && self.explosion_radius.is_finite()) {
            return out_of_range("explosion_radius", self.explosion_radius.into(), "> 0");
        }
        if self.explosion_damage == 0 {
            return out_of_range("explosion_damage", 0.0, "> 0");
        }
        if !(0.0..=1.0).contains(&self.min_warmup_to_explode) {
            return out_of_range(
                "min_warmup_to_explode",
                self.min_warmup_to_explode.into(),
                "[0, 1]",
            );
        }
        if !(self.power_production >= 0.0 && self.power_production.is_finite()) {
            return out_of_range("power_production", self.power_production.into(), ">= 0");
        }
        if !(self.power_use >= 0.0 && self.power_use.is_finite()) {
            return out_of_range("power_use", self.power_use.into(), ">= 0");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Global rule flags of a world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub explosions_enabled: bool,
    pub time_scale: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            explosions_enabled: true,
            time_scale: 1.0,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_scale > 0.0 && self.time_scale.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::TimeScale(self.time_scale))
        }
    }
}

impl RuleSet for Rules {
    fn explosions_enabled(&self) -> bool {
        self.explosions_enabled
    }

    fn time_scale(&self) -> f32 {
        self.time_scale
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Builder for an immutable [`BlockRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    blocks: Vec<ReactorBlockConfig>,
    name_to_id: HashMap<String, BlockTypeId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a block type. Returns its ID.
    pub fn register(&mut self, config: ReactorBlockConfig) -> Result<BlockTypeId, ConfigError> {
        config.validate()?;
        if self.name_to_id.contains_key(&config.name) {
            return Err(ConfigError::DuplicateName(config.name));
        }
        let id = BlockTypeId(self.blocks.len() as u32);
        self.name_to_id.insert(config.name.clone(), id);
        self.blocks.push(config);
        Ok(id)
    }

    /// Freeze into an immutable registry.
    pub fn build(self) -> BlockRegistry {
        BlockRegistry {
            blocks: self.blocks,
            name_to_id: self.name_to_id,
        }
    }
}

/// Frozen set of reactor block types.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: Vec<ReactorBlockConfig>,
    name_to_id: HashMap<String, BlockTypeId>,
}

impl BlockRegistry {
    pub fn get(&self, id: BlockTypeId) -> Option<&ReactorBlockConfig> {
        self.blocks.get(id.0 as usize)
    }

    pub fn id_of(&self, name: &str) -> Option<BlockTypeId> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockTypeId, &ReactorBlockConfig)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, c)| (BlockTypeId(i as u32), c))
    }
}
