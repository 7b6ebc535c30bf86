//! Production efficiency and the supply-overtakes-demand edge detector.

/// Exponent of the warmup-to-efficiency curve. Output stays near zero until
/// warmup is close to 1.
pub const EFFICIENCY_EXPONENT: i32 = 5;

/// Remembers the last supply/demand comparison so a crossing is reported
/// once per contiguous interval of surplus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductionState {
    prev_supply_exceeds_demand: bool,
}

impl ProductionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Efficiency for a given warmup.
    pub fn efficiency(warmup: f32) -> f32 {
        warmup.powi(EFFICIENCY_EXPONENT)
    }

    /// Record a reading. Returns true only when supply first overtakes
    /// demand after a reading where it did not.
    pub fn observe(&mut self, supply: f32, demand: f32) -> bool {
        let exceeds = supply > demand;
        let crossed = exceeds && !self.prev_supply_exceeds_demand;
        self.prev_supply_exceeds_demand = exceeds;
        crossed
    }

    pub fn supply_exceeded_demand(&self) -> bool {
        self.prev_supply_exceeds_demand
    }

    /// Forget the last reading; the next surplus counts as a crossing.
    pub fn reset(&mut self) {
        self.prev_supply_exceeds_demand = false;
    }
}
