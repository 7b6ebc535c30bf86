//! Derived figures for tooltips and balance sheets.

use crate::config::ReactorBlockConfig;
use crate::sim::TICKS_PER_SECOND;

/// Seconds between fuel consumptions at time scale 1.
pub fn production_time_seconds(config: &ReactorBlockConfig) -> f32 {
    config.fuel_cycle_duration / TICKS_PER_SECOND
}

/// Net power per second after the reactor's own draw, never negative.
pub fn net_power_output_per_second(
    config: &ReactorBlockConfig,
    efficiency: f32,
    time_scale: f32,
) -> f32 {
    let net = config.power_production * efficiency - config.power_use;
    net.max(0.0) * TICKS_PER_SECOND * time_scale
}

/// Fuel items burned per minute of continuous operation.
pub fn fuel_per_minute(config: &ReactorBlockConfig, time_scale: f32) -> f32 {
    if config.fuel_cycle_duration <= 0.0 {
        return 0.0;
    }
    60.0 / production_time_seconds(config) * time_scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn default_cycle_is_one_second() {
        assert_eq!(production_time_seconds(&ReactorBlockConfig::default()), 1.0);
        assert_eq!(fuel_per_minute(&ReactorBlockConfig::default(), 1.0), 60.0);
    }

    #[test]
    fn full_efficiency_nets_production_minus_use() {
        let config = ReactorBlockConfig::default();
        assert!(close(net_power_output_per_second(&config, 1.0, 1.0), 105.0));
        assert!(close(net_power_output_per_second(&config, 1.0, 2.0), 210.0));
    }

    #[test]
    fn cold_reactor_reports_zero_not_negative() {
        let config = ReactorBlockConfig::default();
        assert_eq!(net_power_output_per_second(&config, 0.0, 1.0), 0.0);
        assert_eq!(net_power_output_per_second(&config, 0.1, 1.0), 0.0);
    }
}
