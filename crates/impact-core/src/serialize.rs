//! World snapshots.
//!
//! A [`ReactorWorld`] serializes to a single bitcode blob behind a
//! versioned [`SnapshotHeader`]. Reactors are stored through their
//! revisioned field stream; pending delayed effects, the RNG, rules and
//! the tick counter are stored as-is.
//!
//! Not stored: the block registry (supplied again on load), event
//! listeners (closures), and effects already released to the outbox but
//! not yet drained by the host.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::config::{BlockRegistry, Rules};
use crate::effect::EffectDirector;
use crate::event::EventBus;
use crate::id::{BlockTypeId, ReactorId};
use crate::rng::SimRng;
use crate::sim::SimState;
use crate::world::{ReactorSlot, ReactorWorld};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a reactor world snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x1A9C_7001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    /// Also covers reactor field streams that fail to read back.
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot references block type {0:?} missing from the registry")]
    UnknownBlock(BlockTypeId),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header stored at the front of every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode a snapshot and return only its header.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: WorldSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

#[derive(Debug, Serialize, Deserialize)]
struct WorldSnapshot {
    header: SnapshotHeader,
    rules: Rules,
    sim_state: SimState,
    rng: SimRng,
    effects: EffectDirector,
    reactors: SlotMap<ReactorId, ReactorSlot>,
}

// ---------------------------------------------------------------------------
// World serialization methods
// ---------------------------------------------------------------------------

impl ReactorWorld {
    /// Serialize the world to a binary blob.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = WorldSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            rules: self.rules,
            sim_state: self.sim_state.clone(),
            rng: self.rng.clone(),
            effects: self.effects.clone(),
            reactors: self.reactors.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Restore a world from a blob produced by [`ReactorWorld::serialize`].
    ///
    /// Every reactor's block type must exist in `registry`. Event listeners
    /// must be registered again afterwards.
    pub fn deserialize(data: &[u8], registry: BlockRegistry) -> Result<Self, DeserializeError> {
        let snapshot: WorldSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        if let Some(slot) = snapshot
            .reactors
            .values()
            .find(|slot| registry.get(slot.entity.block()).is_none())
        {
            return Err(DeserializeError::UnknownBlock(slot.entity.block()));
        }

        tracing::debug!(
            tick = snapshot.sim_state.tick,
            reactors = snapshot.reactors.len(),
            pending_effects = snapshot.effects.scheduler().len(),
            "world restored"
        );

        Ok(ReactorWorld {
            registry,
            rules: snapshot.rules,
            reactors: snapshot.reactors,
            rng: snapshot.rng,
            events: EventBus::default(),
            effects: snapshot.effects,
            sim_state: snapshot.sim_state,
        })
    }
}
