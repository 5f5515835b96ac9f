//! Horde -- simulation core of a top-down survival arena.
//!
//! This crate builds on [`horde_ecs`] with the arena's component kinds, a
//! uniform-grid broad phase, multi-pass collision resolution, a deferred
//! event bus, event-driven particle effects and the fixed-timestep
//! [`Simulation`](tick::Simulation) that ties them together.
//!
//! # Quick Start
//!
//! ```
//! use horde_sim::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap().with_default_systems();
//!
//! let m = sim.manager_mut();
//! let player = m.create_entity().unwrap();
//! m.set_tag(player, "Player").unwrap();
//! m.add_component(player, Transform::default()).unwrap();
//! m.add_component(player, Collider::circle(16.0)).unwrap();
//! m.add_component(player, Health::new(100.0)).unwrap();
//!
//! let enemy = m.create_entity().unwrap();
//! m.set_tag(enemy, "Enemy").unwrap();
//! m.add_component(enemy, Transform::at(Vec2::new(10.0, 0.0))).unwrap();
//! m.add_component(enemy, Collider::circle(12.0)).unwrap();
//!
//! sim.tick();
//! assert_eq!(sim.manager().get_component::<Health>(player).unwrap().current, 95.0);
//! ```

#![deny(unsafe_code)]

pub mod collision;
pub mod components;
pub mod config;
pub mod events;
pub mod particles;
pub mod render;
pub mod spatial;
pub mod systems;
pub mod tick;

/// Re-export the ECS crate for convenience.
pub use horde_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common simulation usage.
pub mod prelude {
    pub use horde_ecs::prelude::*;

    pub use glam::Vec2;

    pub use crate::collision::{CollisionReport, CollisionSystem, Kill, ENEMY_TAG, PLAYER_TAG};
    pub use crate::components::{
        register_all, Ai, AiBehavior, Bounty, Buff, BuffEffect, BuffKind, Collider, ColliderShape,
        DamageOutcome, Experience, Health, Particle, ParticleKind, Physics, PowerUp, PowerUpEffect,
        Projectile, Sprite, Transform, Weapon, WeaponData, XpPickup,
    };
    pub use crate::config::{
        CollisionConfig, ConfigError, EventConfig, PickupConfig, SimConfig, TickConfig,
    };
    pub use crate::events::{EventBus, EventKind, GameEvent, ListenerId};
    pub use crate::particles::{
        subscribe_particle_effects, Effect, EffectAnchor, EffectRequest, ParticleEffects,
        PARTICLE_TAG,
    };
    pub use crate::render::{draw_list, Color, DebugShape, DrawCommand, DrawList};
    pub use crate::spatial::SpatialGrid;
    pub use crate::systems::{
        apply_buff, collect_pickups, collect_power_ups, fire_weapons, grant_xp, spawn_power_up,
        spawn_xp_gem, tick_buffs, GemDrop, POWER_UP_TAG, XP_GEM_TAG,
    };
    pub use crate::tick::{Simulation, SystemContext, SystemFn, TickDiagnostics};
}
