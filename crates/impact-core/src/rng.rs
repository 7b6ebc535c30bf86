//! Deterministic PRNG for simulation use (explosion delays, scatter offsets).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable for snapshots.

use std::f32::consts::TAU;

use crate::geom::Vec2;

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, so two worlds seeded alike schedule the
/// same explosion choreography.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform `f32` in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits fill the f32 mantissa exactly.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform `f32` in `[0, max)`. Returns 0 for a non-positive `max`.
    pub fn range(&mut self, max: f32) -> f32 {
        if max <= 0.0 || max.is_nan() {
            return 0.0;
        }
        // Rounding of the product can land on `max` itself; keep it open.
        (self.next_f32() * max).min(max * (1.0 - f32::EPSILON))
    }

    /// A vector with a uniformly random direction and the given length.
    pub fn vector(&mut self, length: f32) -> Vec2 {
        let angle = self.next_f32() * TAU;
        Vec2::new(angle.cos() * length, angle.sin() * length)
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(0x1A2B_3C4D)
    }
}
