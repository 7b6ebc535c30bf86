//! Simulation clock and state hashing.

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Simulation ticks per real-time second at normal speed.
pub const TICKS_PER_SECOND: f32 = 60.0;

/// Mutable simulation state tracked by the world.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Current tick counter. Incremented by 1 for each simulation step.
    pub tick: Ticks,
}

impl SimState {
    /// Create a new simulation state starting at tick 0.
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed a u64 into the hash.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed an f32 into the hash by its bit pattern.
    pub fn write_f32(&mut self, v: f32) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
