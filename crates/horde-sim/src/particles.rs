//! Event-driven particle effects.
//!
//! The `spawn_*` helpers create short-lived [`Particle`] entities directly.
//! [`subscribe_particle_effects`] wires them to the event bus: listeners
//! cannot reach the entity manager, so they only record what to spawn, and
//! [`ParticleEffects::flush`] turns those requests into entities. The
//! [`Simulation`](crate::tick::Simulation) flushes right after the
//! end-of-tick event drain when effects are enabled.

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use horde_ecs::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::collision::PLAYER_TAG;
use crate::components::{Particle, ParticleKind, Transform};
use crate::events::{EventBus, EventKind, GameEvent, ListenerId};
use crate::render::Color;

pub const PARTICLE_TAG: &str = "Particle";

pub const EXPLOSION_PARTICLES: usize = 20;
pub const PICKUP_PARTICLES: usize = 10;
pub const SPARK_PARTICLES: usize = 5;
pub const BUFF_APPLIED_PARTICLES: usize = 18;
pub const BUFF_EXPIRED_PARTICLES: usize = 8;
pub const LEVEL_UP_PARTICLES: usize = 30;

const GOLD: Color = Color::rgb(255, 215, 0);
const CYAN: Color = Color::rgb(0, 255, 255);

// ---------------------------------------------------------------------------
// Spawn helpers
// ---------------------------------------------------------------------------

fn spawn_particle(
    manager: &mut EntityManager,
    position: Vec2,
    particle: Particle,
) -> Result<EntityId, EcsError> {
    let id = manager.create_entity()?;
    manager.set_tag(id, PARTICLE_TAG)?;
    manager.add_component(id, Transform::at(position))?;
    manager.add_component(id, particle)?;
    Ok(id)
}

/// Spawn up to `count` particles built by `make(i)`. Stops at the first
/// failure, since a full pool rejects the rest too.
fn burst(
    manager: &mut EntityManager,
    position: Vec2,
    count: usize,
    mut make: impl FnMut(usize) -> Particle,
) -> usize {
    for i in 0..count {
        if let Err(err) = spawn_particle(manager, position, make(i)) {
            tracing::debug!(%err, spawned = i, count, "particle burst cut short");
            return i;
        }
    }
    count
}

/// Velocity on the `i`-th of `count` evenly spaced rays.
fn ring_velocity(i: usize, count: usize, speed: f32) -> Vec2 {
    Vec2::from_angle(i as f32 / count as f32 * TAU) * speed
}

fn random_velocity<R: Rng>(rng: &mut R, speed: std::ops::Range<f32>) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU)) * rng.gen_range(speed)
}

/// A floating label showing `amount`, rounded to a whole number.
pub fn spawn_damage_number<R: Rng>(
    manager: &mut EntityManager,
    rng: &mut R,
    position: Vec2,
    amount: f32,
) -> usize {
    let velocity = Vec2::new(rng.gen_range(-20.0..20.0), -100.0);
    burst(manager, position, 1, |_| {
        let mut p = Particle::new(ParticleKind::DamageNumber, 1.5, velocity);
        p.gravity = 50.0;
        p.text = format!("{amount:.0}");
        p
    })
}

/// Orange-to-yellow debris flying out in random directions, shrinking.
pub fn spawn_explosion<R: Rng>(
    manager: &mut EntityManager,
    rng: &mut R,
    position: Vec2,
    count: usize,
) -> usize {
    burst(manager, position, count, |_| {
        let velocity = random_velocity(rng, 50.0..150.0);
        let mut p = Particle::new(ParticleKind::Explosion, rng.gen_range(0.5..1.0), velocity);
        p.damping = 0.92;
        p.scale = rng.gen_range(2.0..5.0);
        p.scale_speed = -2.0;
        let mix: f32 = rng.gen();
        p.color = Color::rgb(255, (100.0 + mix * 155.0) as u8, 0);
        p
    })
}

/// A cyan ring expanding from a collected pickup.
pub fn spawn_pickup_effect<R: Rng>(manager: &mut EntityManager, rng: &mut R, position: Vec2) -> usize {
    burst(manager, position, PICKUP_PARTICLES, |i| {
        let speed = rng.gen_range(30.0..80.0);
        let mut p = Particle::new(
            ParticleKind::Pickup,
            0.8,
            ring_velocity(i, PICKUP_PARTICLES, speed),
        );
        p.scale = 3.0;
        p.scale_speed = -3.0;
        p.color = CYAN;
        p
    })
}

/// Fast yellow sparks that fall under gravity.
pub fn spawn_sparks<R: Rng>(
    manager: &mut EntityManager,
    rng: &mut R,
    position: Vec2,
    count: usize,
) -> usize {
    burst(manager, position, count, |_| {
        let mut p = Particle::new(ParticleKind::Spark, 0.5, random_velocity(rng, 100.0..200.0));
        p.damping = 0.90;
        p.gravity = 200.0;
        p.scale = 2.0;
        p.color = Color::YELLOW;
        p
    })
}

/// A ring burst in the buff's colour.
pub fn spawn_buff_applied<R: Rng>(
    manager: &mut EntityManager,
    rng: &mut R,
    position: Vec2,
    color: Color,
    count: usize,
) -> usize {
    burst(manager, position, count, |i| {
        let speed = rng.gen_range(80.0..120.0);
        let mut p = Particle::new(ParticleKind::Pickup, 1.0, ring_velocity(i, count, speed));
        p.damping = 0.93;
        p.scale = 4.0;
        p.scale_speed = -4.0;
        p.color = color;
        p
    })
}

/// A small grey puff.
pub fn spawn_buff_expired<R: Rng>(
    manager: &mut EntityManager,
    rng: &mut R,
    position: Vec2,
    count: usize,
) -> usize {
    burst(manager, position, count, |_| {
        let mut p = Particle::new(ParticleKind::Trail, 0.6, random_velocity(rng, 20.0..50.0));
        p.scale = 3.0;
        p.scale_speed = -2.0;
        p.color = Color::rgb(150, 150, 150);
        p
    })
}

/// A gold star burst.
pub fn spawn_level_up<R: Rng>(
    manager: &mut EntityManager,
    rng: &mut R,
    position: Vec2,
    count: usize,
) -> usize {
    burst(manager, position, count, |i| {
        let speed = rng.gen_range(100.0..180.0);
        let mut p = Particle::new(ParticleKind::Spark, 1.2, ring_velocity(i, count, speed));
        p.damping = 0.88;
        p.gravity = 100.0;
        p.scale = 5.0;
        p.scale_speed = -3.0;
        p.color = GOLD;
        p
    })
}

/// Colour of the burst for a buff, picked from its name.
pub fn buff_color(name: &str) -> Color {
    if name.contains("Damage") {
        Color::rgb(255, 100, 100)
    } else if name.contains("Speed") {
        Color::rgb(100, 255, 255)
    } else if name.contains("Invulnerability") {
        Color::rgb(255, 255, 100)
    } else if name.contains("XP") {
        Color::rgb(255, 100, 255)
    } else if name.contains("Health") || name.contains("Regen") {
        Color::rgb(100, 255, 100)
    } else if name.contains("Fire") {
        Color::rgb(255, 165, 0)
    } else {
        Color::WHITE
    }
}

// ---------------------------------------------------------------------------
// Event wiring
// ---------------------------------------------------------------------------

/// Where an effect is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectAnchor {
    At(Vec2),
    /// The player's position when the request is flushed.
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// A damage label plus sparks.
    Hit(f32),
    Explosion,
    Pickup,
    BuffApplied(Color),
    BuffExpired,
    LevelUp,
}

/// One effect waiting to be spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    pub effect: Effect,
    pub anchor: EffectAnchor,
}

impl EffectRequest {
    /// The effect an event calls for, if any.
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let (effect, anchor) = match event {
            GameEvent::EnemyKilled { position, .. } => (Effect::Explosion, EffectAnchor::At(*position)),
            GameEvent::PlayerDamaged { amount, .. } => (Effect::Hit(*amount), EffectAnchor::Player),
            GameEvent::PowerUpCollected { .. } => (Effect::Pickup, EffectAnchor::Player),
            GameEvent::BuffApplied { name, .. } => {
                (Effect::BuffApplied(buff_color(name)), EffectAnchor::Player)
            }
            GameEvent::BuffExpired { .. } => (Effect::BuffExpired, EffectAnchor::Player),
            GameEvent::PlayerLevelUp { .. } => (Effect::LevelUp, EffectAnchor::Player),
            _ => return None,
        };
        Some(Self { effect, anchor })
    }
}

/// Bus listeners that collect effect requests, plus the RNG used to spawn
/// them.
#[derive(Debug)]
pub struct ParticleEffects {
    pending: Rc<RefCell<Vec<EffectRequest>>>,
    listeners: Vec<(EventKind, ListenerId)>,
    rng: Pcg32,
}

/// Subscribe to every event kind that has a visual effect. Particle motion
/// is seeded from `seed`.
pub fn subscribe_particle_effects(bus: &EventBus, seed: u64) -> ParticleEffects {
    let pending = Rc::new(RefCell::new(Vec::new()));
    let kinds = [
        EventKind::EnemyKilled,
        EventKind::PlayerDamaged,
        EventKind::PowerUpCollected,
        EventKind::BuffApplied,
        EventKind::BuffExpired,
        EventKind::PlayerLevelUp,
    ];
    let listeners = kinds
        .into_iter()
        .map(|kind| {
            let sink = Rc::clone(&pending);
            let id = bus.subscribe(kind, move |event, _| {
                if let Some(request) = EffectRequest::for_event(event) {
                    sink.borrow_mut().push(request);
                }
            });
            (kind, id)
        })
        .collect();
    ParticleEffects {
        pending,
        listeners,
        rng: Pcg32::seed_from_u64(seed),
    }
}

impl ParticleEffects {
    /// Requests recorded since the last flush.
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Spawn every pending effect. Player-anchored effects are dropped when
    /// there is no player with a transform. Returns the particles spawned.
    pub fn flush(&mut self, manager: &mut EntityManager) -> usize {
        let requests = std::mem::take(&mut *self.pending.borrow_mut());
        if requests.is_empty() {
            return 0;
        }
        let player_pos = manager
            .first_by_tag(PLAYER_TAG)
            .and_then(|p| manager.get_component::<Transform>(p))
            .map(|t| t.position);

        let rng = &mut self.rng;
        let mut spawned = 0;
        for request in &requests {
            let position = match (request.anchor, player_pos) {
                (EffectAnchor::At(at), _) => at,
                (EffectAnchor::Player, Some(at)) => at,
                (EffectAnchor::Player, None) => continue,
            };
            spawned += match request.effect {
                Effect::Hit(amount) => {
                    spawn_damage_number(manager, rng, position, amount)
                        + spawn_sparks(manager, rng, position, SPARK_PARTICLES)
                }
                Effect::Explosion => spawn_explosion(manager, rng, position, EXPLOSION_PARTICLES),
                Effect::Pickup => spawn_pickup_effect(manager, rng, position),
                Effect::BuffApplied(color) => {
                    spawn_buff_applied(manager, rng, position, color, BUFF_APPLIED_PARTICLES)
                }
                Effect::BuffExpired => {
                    spawn_buff_expired(manager, rng, position, BUFF_EXPIRED_PARTICLES)
                }
                Effect::LevelUp => spawn_level_up(manager, rng, position, LEVEL_UP_PARTICLES),
            };
        }
        tracing::trace!(requests = requests.len(), spawned, "flushed particle effects");
        spawned
    }

    /// Remove the bus listeners. Requests already recorded stay pending.
    pub fn unsubscribe(&self, bus: &EventBus) {
        for &(kind, id) in &self.listeners {
            bus.unsubscribe(kind, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{register_all, Health};

    fn setup() -> (EntityManager, EventBus) {
        let mut manager = EntityManager::default();
        register_all(&mut manager);
        (manager, EventBus::default())
    }

    fn particles(manager: &EntityManager) -> Vec<EntityId> {
        manager.entities_with::<(Transform, Particle)>()
    }

    #[test]
    fn explosion_spawns_tagged_shrinking_debris() {
        let (mut manager, _) = setup();
        let mut rng = Pcg32::seed_from_u64(1);
        let at = Vec2::new(40.0, -10.0);
        assert_eq!(spawn_explosion(&mut manager, &mut rng, at, 6), 6);

        let ids = particles(&manager);
        assert_eq!(ids.len(), 6);
        for id in ids {
            assert_eq!(manager.entity(id).unwrap().tag(), PARTICLE_TAG);
            assert_eq!(manager.get_component::<Transform>(id).unwrap().position, at);
            let p = manager.get_component::<Particle>(id).unwrap();
            assert_eq!(p.kind, ParticleKind::Explosion);
            assert!(p.scale_speed < 0.0);
            assert!((49.9..=150.1).contains(&p.velocity.length()));
        }
    }

    #[test]
    fn damage_number_shows_rounded_amount() {
        let (mut manager, _) = setup();
        let mut rng = Pcg32::seed_from_u64(2);
        assert_eq!(spawn_damage_number(&mut manager, &mut rng, Vec2::ZERO, 12.6), 1);
        let id = particles(&manager)[0];
        let p = manager.get_component::<Particle>(id).unwrap();
        assert_eq!(p.text, "13");
        assert_eq!(p.velocity.y, -100.0);
    }

    #[test]
    fn burst_stops_when_the_pool_is_full() {
        let mut manager = EntityManager::new(PoolConfig {
            max_entities: 4,
            ..PoolConfig::default()
        });
        register_all(&mut manager);
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(spawn_level_up(&mut manager, &mut rng, Vec2::ZERO, 30), 4);
        assert_eq!(manager.active_count(), 4);
    }

    #[test]
    fn ring_bursts_are_evenly_spaced() {
        let (mut manager, _) = setup();
        let mut rng = Pcg32::seed_from_u64(4);
        spawn_buff_applied(&mut manager, &mut rng, Vec2::ZERO, Color::RED, 4);
        let mut angles: Vec<f32> = particles(&manager)
            .into_iter()
            .map(|id| {
                let v = manager.get_component::<Particle>(id).unwrap().velocity;
                v.y.atan2(v.x).rem_euclid(TAU)
            })
            .collect();
        angles.sort_by(f32::total_cmp);
        for pair in angles.windows(2) {
            assert!((pair[1] - pair[0] - TAU / 4.0).abs() < 1e-3);
        }
    }

    #[test]
    fn buff_colors_follow_the_name() {
        assert_eq!(buff_color("Damage Boost"), Color::rgb(255, 100, 100));
        assert_eq!(buff_color("XP Boost"), Color::rgb(255, 100, 255));
        assert_eq!(buff_color("mystery"), Color::WHITE);
    }

    #[test]
    fn queued_buff_event_becomes_particles_after_drain() {
        let (mut manager, bus) = setup();
        let player = manager.create_entity().unwrap();
        manager.set_tag(player, PLAYER_TAG).unwrap();
        manager.add_component(player, Transform::at(Vec2::new(5.0, 5.0))).unwrap();
        manager.add_component(player, Health::new(100.0)).unwrap();
        manager.maintain(0.0);
        let mut effects = subscribe_particle_effects(&bus, 7);

        bus.queue_event(GameEvent::BuffApplied {
            name: "Speed Boost".into(),
            duration: 10.0,
        });
        assert_eq!(effects.flush(&mut manager), 0, "nothing delivered yet");

        bus.process_events();
        assert_eq!(effects.pending_len(), 1);
        assert_eq!(effects.flush(&mut manager), BUFF_APPLIED_PARTICLES);
        assert_eq!(effects.pending_len(), 0);

        let ids = particles(&manager);
        assert_eq!(ids.len(), BUFF_APPLIED_PARTICLES);
        for id in ids {
            assert_eq!(
                manager.get_component::<Transform>(id).unwrap().position,
                Vec2::new(5.0, 5.0)
            );
            assert_eq!(
                manager.get_component::<Particle>(id).unwrap().color,
                Color::rgb(100, 255, 255)
            );
        }
    }

    #[test]
    fn kill_explodes_where_the_enemy_died() {
        let (mut manager, bus) = setup();
        let mut effects = subscribe_particle_effects(&bus, 8);
        bus.emit(&GameEvent::EnemyKilled {
            experience_value: 1.0,
            position: Vec2::new(-30.0, 2.0),
        });
        // No player needed for a positioned effect.
        assert_eq!(effects.flush(&mut manager), EXPLOSION_PARTICLES);
        let id = particles(&manager)[0];
        assert_eq!(
            manager.get_component::<Transform>(id).unwrap().position,
            Vec2::new(-30.0, 2.0)
        );
    }

    #[test]
    fn player_effects_without_player_are_dropped() {
        let (mut manager, bus) = setup();
        let mut effects = subscribe_particle_effects(&bus, 9);
        bus.emit(&GameEvent::PlayerLevelUp {
            new_level: 2,
            previous_level: 1,
        });
        assert_eq!(effects.flush(&mut manager), 0);
        assert_eq!(effects.pending_len(), 0);
    }

    #[test]
    fn unsubscribed_effects_ignore_events() {
        let (mut manager, bus) = setup();
        let mut effects = subscribe_particle_effects(&bus, 10);
        effects.unsubscribe(&bus);
        assert_eq!(bus.listener_count(EventKind::EnemyKilled), 0);
        bus.emit(&GameEvent::EnemyKilled {
            experience_value: 1.0,
            position: Vec2::ZERO,
        });
        assert_eq!(effects.flush(&mut manager), 0);
    }
}
