//! Simulation configuration.
//!
//! Every knob has a default matching the shipped game tuning, and every
//! section is `#[serde(default)]`, so a JSON document only needs to name the
//! values it overrides:
//!
//! ```
//! use horde_sim::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "pool": { "max_entities": 64 } }"#).unwrap();
//! assert_eq!(config.pool.max_entities, 64);
//! assert_eq!(config.collision.cell_size, 100.0);
//! ```

use horde_ecs::manager::PoolConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A knob that must be strictly positive (and finite) is not.
    #[error("config field `{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// The JSON document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Collision tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Spatial grid cell edge length in world units.
    pub cell_size: f32,
    /// Projectiles farther than this from the player are not tested.
    pub culling_range: f32,
    /// Minimum seconds between two contact-damage hits on the player.
    pub player_damage_interval: f32,
    /// Damage dealt to the player by touching an enemy.
    pub contact_damage: f32,
    /// Assumed largest neighbour radius, added to broad-phase search radii.
    pub neighbor_radius: f32,
    /// Separation search radius as a multiple of the collider's radius.
    pub separation_search_factor: f32,
    /// Push depth used when a separating pair is not circle-circle.
    pub separation_fallback_depth: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            cell_size: 100.0,
            culling_range: 1400.0,
            player_damage_interval: 0.5,
            contact_damage: 5.0,
            neighbor_radius: 50.0,
            separation_search_factor: 2.5,
            separation_fallback_depth: 10.0,
        }
    }
}

/// Event bus tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Maximum nesting of synchronous `emit` calls.
    pub max_emit_depth: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { max_emit_depth: 16 }
    }
}

/// Tick driver tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick.
    pub fixed_dt: f32,
}

impl Default for TickConfig {
    /// 60 Hz.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

/// XP gem spawning policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// A new gem within this distance of an existing one merges into it.
    pub merge_radius: f32,
    /// At this many live gems the one farthest from the player is dropped
    /// before a new one is spawned.
    pub max_gems: usize,
    pub magnet_range: f32,
    pub pickup_range: f32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            merge_radius: 25.0,
            max_gems: 150,
            magnet_range: 100.0,
            pickup_range: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for a [`Simulation`](crate::tick::Simulation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub pool: PoolConfig,
    pub collision: CollisionConfig,
    pub events: EventConfig,
    pub tick: TickConfig,
    pub pickups: PickupConfig,
}

impl SimConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every knob is strictly positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, f64); 16] = [
            ("pool.max_entities", self.pool.max_entities as f64),
            ("pool.cleanup_interval", self.pool.cleanup_interval as f64),
            ("pool.cleanup_threshold", self.pool.cleanup_threshold as f64),
            ("collision.cell_size", self.collision.cell_size as f64),
            ("collision.culling_range", self.collision.culling_range as f64),
            (
                "collision.player_damage_interval",
                self.collision.player_damage_interval as f64,
            ),
            ("collision.contact_damage", self.collision.contact_damage as f64),
            ("collision.neighbor_radius", self.collision.neighbor_radius as f64),
            (
                "collision.separation_search_factor",
                self.collision.separation_search_factor as f64,
            ),
            (
                "collision.separation_fallback_depth",
                self.collision.separation_fallback_depth as f64,
            ),
            ("events.max_emit_depth", self.events.max_emit_depth as f64),
            ("tick.fixed_dt", self.tick.fixed_dt as f64),
            ("pickups.merge_radius", self.pickups.merge_radius as f64),
            ("pickups.max_gems", self.pickups.max_gems as f64),
            ("pickups.magnet_range", self.pickups.magnet_range as f64),
            ("pickups.pickup_range", self.pickups.pickup_range as f64),
        ];
        for (field, value) in checks {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_tuning() {
        let config = SimConfig::default();
        assert_eq!(config.pool.max_entities, 500);
        assert_eq!(config.pool.cleanup_interval, 0.5);
        assert_eq!(config.pool.cleanup_threshold, 10);
        assert_eq!(config.collision.cell_size, 100.0);
        assert_eq!(config.collision.culling_range, 1400.0);
        assert_eq!(config.collision.player_damage_interval, 0.5);
        assert_eq!(config.events.max_emit_depth, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = SimConfig::from_json_str(
            r#"{ "collision": { "contact_damage": 12.5 }, "tick": { "fixed_dt": 0.02 } }"#,
        )
        .unwrap();
        assert_eq!(config.collision.contact_damage, 12.5);
        assert_eq!(config.collision.cell_size, 100.0);
        assert_eq!(config.tick.fixed_dt, 0.02);
        assert_eq!(config.pool, PoolConfig::default());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SimConfig::from_json_str("{}").unwrap(), SimConfig::default());
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let err = SimConfig::from_json_str(r#"{ "collision": { "cell_size": 0 } }"#).unwrap_err();
        match err {
            ConfigError::NonPositive { field, value } => {
                assert_eq!(field, "collision.cell_size");
                assert_eq!(value, 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut config = SimConfig::default();
        config.tick.fixed_dt = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "tick.fixed_dt",
                ..
            })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse config"));
    }
}
