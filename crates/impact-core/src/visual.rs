//! Read-only sampling of how a reactor looks at a point in time.
//!
//! Nothing here feeds back into the simulation. A renderer calls
//! [`sample_visual`] with the reactor's warmup and an animation clock and
//! draws what comes back.

use crate::color::Rgb;
use crate::config::ReactorBlockConfig;
use crate::geom::{TILE_SIZE, Vec2};

/// Inset of the plasma sprites from the block edge, in world units.
const PLASMA_INSET: f32 = 3.0;

/// Light radius of a fully warm reactor before pulsing.
pub const LIGHT_BASE_RADIUS: f32 = 110.0;

/// Light intensity of a fully warm reactor.
pub const LIGHT_INTENSITY: f32 = 0.8;

/// One concentric plasma sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasmaLayer {
    /// Edge length in world units.
    pub size: f32,
    pub alpha: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub radius: f32,
    pub intensity: f32,
    pub color: Rgb,
}

/// Everything needed to draw one reactor for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualFrame {
    pub center: Vec2,
    /// Innermost layer first.
    pub layers: Vec<PlasmaLayer>,
    pub light: Light,
}

/// Non-negative sine pulse: oscillates in `[0, magnitude]` with period
/// `scale * 4π`.
pub fn absin(input: f32, scale: f32, magnitude: f32) -> f32 {
    ((input / (scale * 2.0)).sin() * magnitude + magnitude) / 2.0
}

/// Sample the plasma layers and light of a reactor.
///
/// `time` is an animation clock in ticks; `warmup` is clamped to `[0, 1]`.
pub fn sample_visual(
    config: &ReactorBlockConfig,
    warmup: f32,
    center: Vec2,
    time: f32,
) -> VisualFrame {
    let warmup = if warmup.is_nan() { 0.0 } else { warmup.clamp(0.0, 1.0) };
    let base = f32::from(config.size) * TILE_SIZE - PLASMA_INSET;
    let count = config.plasma_layers;

    let layers = (0..count)
        .map(|i| {
            let i = i as f32;
            PlasmaLayer {
                size: base + absin(time, 2.0 + i, 5.0 - i * 0.5),
                alpha: (0.3 + absin(time, 2.0 + i * 2.0, 0.3 + i * 0.05)) * warmup,
                rotation: time * (12.0 + i * 6.0) * warmup,
                color: config.plasma_inner.lerp(config.plasma_outer, i / count as f32),
            }
        })
        .collect();

    let light = Light {
        radius: (LIGHT_BASE_RADIUS + absin(time, 5.0, 5.0)) * warmup,
        intensity: LIGHT_INTENSITY * warmup,
        color: config
            .plasma_outer
            .lerp(config.plasma_inner, absin(time, 7.0, 0.2)),
    };

    VisualFrame {
        center,
        layers,
        light,
    }
}
