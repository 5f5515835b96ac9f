//! The concrete component kinds of the arena simulation.
//!
//! Each kind is a plain data struct implementing
//! [`Component`](horde_ecs::component::Component). Kinds that act on their own
//! every tick also implement [`Update`](horde_ecs::component::Update);
//! [`Sprite`] implements [`Render`](horde_ecs::component::Render) for the
//! [`DrawList`](crate::render::DrawList) canvas. Kinds needing the event bus
//! (buffs, experience) are driven by helpers in [`crate::systems`] instead.
//!
//! [`register_all`] registers every kind in the order their update hooks run.

pub mod ai;
pub mod buff;
pub mod collider;
pub mod combat;
pub mod effects;
pub mod motion;
pub mod power_up;
pub mod progression;

use horde_ecs::manager::EntityManager;

pub use ai::{Ai, AiBehavior};
pub use buff::{Buff, BuffEffect, BuffKind};
pub use collider::{Collider, ColliderShape, CollisionCallback};
pub use combat::{Bounty, DamageOutcome, Health, Projectile, Weapon, WeaponData};
pub use effects::{Particle, ParticleKind, Sprite};
pub use motion::{Physics, Transform};
pub use power_up::{PowerUp, PowerUpEffect};
pub use progression::{xp_for_level, Experience, LevelUp, XpPickup};

use crate::render::DrawList;

/// Register every component kind with `manager`.
///
/// Update order: steering, weapon cooldowns, integration, projectile, gem
/// and power-up lifetimes, particles.
pub fn register_all(manager: &mut EntityManager) {
    manager.register::<Transform>();
    manager.register_update::<Ai>();
    manager.register_update::<Weapon>();
    manager.register_update::<Physics>();
    manager.register_update::<Projectile>();
    manager.register_update::<XpPickup>();
    manager.register_update::<PowerUp>();
    manager.register_update::<Particle>();
    manager.register::<Collider>();
    manager.register::<Health>();
    manager.register::<Bounty>();
    manager.register::<Buff>();
    manager.register::<Experience>();
    manager.register_render::<Sprite, DrawList>();
}
