//! Tunable constants of the material rules
//!
//! Defaults give the classic falling-sand tuning. The struct is serde-friendly so
//! a scenario can override individual constants from a JSON config; missing
//! fields fall back to their defaults.

use serde::{Deserialize, Serialize};

/// Per-material rule constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParams {
    // Sand
    /// Gravity acceleration (cells/s²)
    pub gravity: f32,
    /// Extra gravity factor applied to sand velocity integration
    pub sand_gravity_scale: f32,
    /// Sand vertical velocity is clamped to `±sand_max_speed`
    pub sand_max_speed: f32,
    /// Water must move this much faster than sand to be jumped into
    pub water_displace_speed: f32,
    /// Rows searched above a displaced water cell for a free slot
    pub displace_search_rows: i32,
    /// Columns searched on each side of a displaced water cell
    pub displace_search_half_width: i32,
    /// Upward speed given to displaced water
    pub displace_kick: f32,
    /// Displaced water gets a horizontal speed in `±displace_spread`
    pub displace_spread: i32,
    /// Diagonal free-fall gives sand a horizontal speed in `±sand_scatter`
    pub sand_scatter: f32,
    /// Chance per tick that resting sand sinks into adjacent liquid
    pub sand_sink_chance: f32,

    // Water
    /// Mass of a full, uncompressed water cell
    pub max_mass: f32,
    /// Extra mass a cell may hold per cell of water above it
    pub max_compress: f32,
    /// Largest mass one flow operation may move
    pub max_speed: f32,
    /// Flows above this are halved for smoothing
    pub min_flow: f32,

    // Fire / smoke
    /// Fuel burned per tick
    pub fire_decay: f32,
    pub fire_spawn_min: f32,
    pub fire_spawn_max: f32,
    /// Chance that fire turns an adjacent AIR cell into smoke
    pub smoke_spawn_chance: f32,
    /// Smoke density lost per tick
    pub smoke_decay: f32,
    /// Chance per tick that smoke rises
    pub smoke_rise_chance: f32,

    // Napalm
    /// Self-ignition chance when resting on napalm
    pub napalm_chain_chance: f32,
    /// Upper bound of fire fuel from napalm-on-napalm ignition
    pub napalm_chain_intensity: f32,
    /// Self-ignition chance when resting on a solid
    pub napalm_contact_chance: f32,
    /// Upper bound of fire fuel from napalm-on-solid ignition
    pub napalm_contact_intensity: f32,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            gravity: 10.0,
            sand_gravity_scale: 5.0,
            sand_max_speed: 10.0,
            water_displace_speed: 10.0,
            displace_search_rows: 10,
            displace_search_half_width: 10,
            displace_kick: 4.0,
            displace_spread: 2,
            sand_scatter: 2.0,
            sand_sink_chance: 0.1,

            max_mass: 1.0,
            max_compress: 0.02,
            max_speed: 1.0,
            min_flow: 0.01,

            fire_decay: 0.05,
            fire_spawn_min: 0.6,
            fire_spawn_max: 1.0,
            smoke_spawn_chance: 0.4,
            smoke_decay: 0.005,
            smoke_rise_chance: 0.4,

            napalm_chain_chance: 0.001,
            napalm_chain_intensity: 4.0,
            napalm_contact_chance: 0.1,
            napalm_contact_intensity: 2.0,
        }
    }
}

impl RuleParams {
    /// Equilibrium mass of the lower cell of a two-cell water column
    ///
    /// * total ≤ `max_mass`: everything fits below
    /// * total < `2·max_mass + max_compress`: compressibility-weighted split
    /// * otherwise: the lower cell holds `max_compress` more than the upper
    #[inline]
    pub fn stable_state_below(&self, total: f32) -> f32 {
        let max = self.max_mass;
        let compress = self.max_compress;
        if total <= max {
            max
        } else if total < 2.0 * max + compress {
            (max * max + total * compress) / (max + compress)
        } else {
            (total + compress) / 2.0
        }
    }

    /// Largest mass a water cell can hold in any reachable state
    #[inline]
    pub fn max_water_mass(&self) -> f32 {
        self.max_mass + self.max_compress
    }

    /// Apply flow smoothing and clamp into `[0, limit]`
    #[inline]
    pub(crate) fn smooth_flow(&self, flow: f32, limit: f32) -> f32 {
        let flow = if flow > self.min_flow { flow * 0.5 } else { flow };
        flow.clamp(0.0, limit.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let params = RuleParams::default();
        assert_eq!(params.max_mass, 1.0);
        assert_eq!(params.fire_decay, 0.05);
        assert_eq!(params.smoke_decay, 0.005);
        assert_eq!(params.smoke_rise_chance, 0.4);
    }

    #[test]
    fn test_stable_state_regimes() {
        let params = RuleParams::default();

        // Fits fully
        assert_relative_eq!(params.stable_state_below(0.5), 1.0);
        assert_relative_eq!(params.stable_state_below(1.0), 1.0);

        // Compressed interpolation
        let expected = (1.0 + 1.5 * 0.02) / 1.02;
        assert_relative_eq!(params.stable_state_below(1.5), expected);

        // Beyond two full cells
        assert_relative_eq!(params.stable_state_below(3.0), 1.51);
    }

    #[test]
    fn test_stable_state_is_continuous() {
        let params = RuleParams::default();
        let edge = 2.0 * params.max_mass + params.max_compress;
        let below = params.stable_state_below(edge - 1e-4);
        let above = params.stable_state_below(edge);
        assert_relative_eq!(below, above, epsilon = 1e-3);
    }

    #[test]
    fn test_smooth_flow() {
        let params = RuleParams::default();
        assert_relative_eq!(params.smooth_flow(0.4, 1.0), 0.2);
        assert_relative_eq!(params.smooth_flow(0.005, 1.0), 0.005);
        assert_relative_eq!(params.smooth_flow(0.4, 0.1), 0.1);
        assert_relative_eq!(params.smooth_flow(-0.3, 1.0), 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: RuleParams = serde_json::from_str(r#"{ "fire_decay": 0.1 }"#).unwrap();
        assert_eq!(params.fire_decay, 0.1);
        assert_eq!(params.max_mass, 1.0);
    }
}
