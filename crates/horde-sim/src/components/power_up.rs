//! Power-up pickups.
//!
//! A power-up only carries what it does when collected. Collection itself
//! (overlap with the player, applying the effect, the `PowerUpCollected`
//! event) lives in [`collect_power_ups`](crate::systems::collect_power_ups).

use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use super::buff::{BuffEffect, BuffKind};
use crate::render::Color;

/// What happens to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PowerUpEffect {
    /// Restore this much health at once.
    Heal(f32),
    /// Apply a buff effect.
    Buff(BuffEffect),
    /// Collect every XP gem within `radius` of the collector at once, or
    /// every gem in the arena when `radius` is `None`.
    Magnet { radius: Option<f32> },
}

/// A pickup that despawns after `lifetime` seconds if nobody takes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub name: String,
    pub effect: PowerUpEffect,
    pub radius: f32,
    pub color: Color,
    pub lifetime: f32,
}

impl PowerUp {
    pub const LIFETIME: f32 = 30.0;
    const RADIUS: f32 = 12.0;

    pub fn new(name: impl Into<String>, effect: PowerUpEffect) -> Self {
        Self {
            name: name.into(),
            effect,
            radius: Self::RADIUS,
            color: Color::WHITE,
            lifetime: Self::LIFETIME,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    // -- stock power-ups ----------------------------------------------------

    pub fn health_pack() -> Self {
        Self::new("Health Pack", PowerUpEffect::Heal(25.0)).with_color(Color::GREEN)
    }

    pub fn damage_boost() -> Self {
        Self::timed_buff("Damage Boost", BuffKind::DamageBoost, 0.5, 10.0).with_color(Color::RED)
    }

    pub fn speed_boost() -> Self {
        Self::timed_buff("Speed Boost", BuffKind::SpeedBoost, 0.5, 10.0)
            .with_color(Color::rgb(0, 255, 255))
    }

    pub fn invulnerability() -> Self {
        Self::timed_buff("Invulnerability", BuffKind::Invulnerability, 1.0, 5.0)
            .with_color(Color::YELLOW)
    }

    pub fn xp_boost() -> Self {
        Self::timed_buff("XP Boost", BuffKind::XpMultiplier, 1.0, 15.0)
            .with_color(Color::rgb(255, 0, 255))
    }

    pub fn small_magnet() -> Self {
        Self::new("Small Magnet", PowerUpEffect::Magnet { radius: Some(200.0) })
            .with_color(Color::rgb(150, 150, 255))
    }

    pub fn large_magnet() -> Self {
        let mut power_up = Self::new("Large Magnet", PowerUpEffect::Magnet { radius: None })
            .with_color(Color::rgb(100, 100, 255));
        power_up.radius = 15.0;
        power_up
    }

    fn timed_buff(name: &str, kind: BuffKind, value: f32, duration: f32) -> Self {
        Self::new(name, PowerUpEffect::Buff(BuffEffect::new(name, kind, value, duration)))
    }
}

impl Component for PowerUp {}

impl Update for PowerUp {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.lifetime -= ctx.dt();
        if self.lifetime <= 0.0 {
            ctx.destroy_owner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_buffs_share_the_power_up_name() {
        let boost = PowerUp::damage_boost();
        match &boost.effect {
            PowerUpEffect::Buff(effect) => {
                assert_eq!(effect.name, boost.name);
                assert_eq!(effect.kind, BuffKind::DamageBoost);
                assert_eq!(effect.duration, 10.0);
            }
            other => panic!("unexpected effect {other:?}"),
        };
        assert_eq!(PowerUp::large_magnet().radius, 15.0);
    }

    #[test]
    fn unclaimed_power_up_despawns() {
        let mut manager = EntityManager::default();
        manager.register_update::<PowerUp>();
        let e = manager.create_entity().unwrap();
        let mut power_up = PowerUp::health_pack();
        power_up.lifetime = 0.5;
        manager.add_component(e, power_up).unwrap();

        manager.run_updates(0.25);
        assert!(manager.is_active(e));
        manager.run_updates(0.25);
        assert!(!manager.is_active(e));
    }
}
