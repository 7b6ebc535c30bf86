//! Exponential-approach easing used for reactor warmup.
//!
//! Each step closes a fixed fraction of the remaining distance to the
//! target. Pure exponential approach never arrives, so values within
//! [`SNAP_EPSILON`] of the target are snapped onto it.

/// Distance from the target below which the eased value snaps onto it.
pub const SNAP_EPSILON: f32 = 0.001;

/// Advance `current` one step toward `target` at `rate`.
///
/// `next = current + (target - current) * rate`, clamped to `[0, 1]`, then
/// snapped to `target` when within [`SNAP_EPSILON`]. `rate` is clamped to
/// `[0, 1]` so a step can never overshoot.
pub fn approach(current: f32, target: f32, rate: f32) -> f32 {
    let rate = rate.clamp(0.0, 1.0);
    let next = (current + (target - current) * rate).clamp(0.0, 1.0);
    if (next - target).abs() < SNAP_EPSILON {
        target
    } else {
        next
    }
}

/// Stateful wrapper around [`approach`] with separate rise and fall rates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EasingClock {
    pub value: f32,
    pub rise: f32,
    pub fall: f32,
}

impl EasingClock {
    pub fn new(rise: f32, fall: f32) -> Self {
        Self {
            value: 0.0,
            rise,
            fall,
        }
    }

    /// Step toward 1.0 at the rise rate and return the new value.
    pub fn rise_toward_one(&mut self) -> f32 {
        self.value = approach(self.value, 1.0, self.rise);
        self.value
    }

    /// Step toward 0.0 at the fall rate and return the new value.
    pub fn fall_toward_zero(&mut self) -> f32 {
        self.value = approach(self.value, 0.0, self.fall);
        self.value
    }

    /// Ticks needed to converge from `from` to `target` at `rate`, or `None`
    /// if it never arrives (zero rate with a gap larger than the epsilon).
    pub fn ticks_to_settle(from: f32, target: f32, rate: f32) -> Option<u32> {
        let mut value = from;
        let mut ticks = 0u32;
        while value != target {
            let next = approach(value, target, rate);
            if next == value {
                return None;
            }
            value = next;
            ticks += 1;
        }
        Some(ticks)
    }
}
