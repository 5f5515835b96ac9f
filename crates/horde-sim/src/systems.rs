//! Gameplay helpers that need both the entity manager and the event bus.
//!
//! Each `*_system` function has the [`SystemFn`](crate::tick::SystemFn)
//! signature and can be handed to
//! [`Simulation::add_system`](crate::tick::Simulation::add_system); the
//! plain helpers are usable on their own by spawn or upgrade logic.

use glam::Vec2;
use horde_ecs::prelude::*;

use crate::collision::{ENEMY_TAG, PLAYER_TAG};
use crate::components::{
    Buff, BuffEffect, BuffKind, Collider, Experience, Health, LevelUp, Physics, PowerUp,
    PowerUpEffect, Projectile, Transform, Weapon, XpPickup,
};
use crate::config::PickupConfig;
use crate::events::{EventBus, GameEvent};
use crate::tick::SystemContext;

pub const XP_GEM_TAG: &str = "XPGem";
pub const POWER_UP_TAG: &str = "PowerUp";

const PROJECTILE_RADIUS: f32 = 5.0;
const GEM_RADIUS: f32 = 10.0;

// ---------------------------------------------------------------------------
// Buffs
// ---------------------------------------------------------------------------

/// Add `effect` to `id`, creating its [`Buff`] container if needed.
///
/// Queues `BuffApplied` when the effect is new; a refresh of an existing
/// effect queues nothing. Returns whether the effect was new.
pub fn apply_buff(
    manager: &mut EntityManager,
    bus: &EventBus,
    id: EntityId,
    effect: BuffEffect,
) -> Result<bool, EcsError> {
    if !manager.has_component::<Buff>(id) {
        manager.add_component(id, Buff::new())?;
    }
    let (name, duration) = (effect.name.clone(), effect.duration);
    let added = manager
        .get_component_mut::<Buff>(id)
        .is_some_and(|buff| buff.add(effect));
    if added {
        bus.queue_event(GameEvent::BuffApplied { name, duration });
    }
    sync_invulnerability(manager, id);
    Ok(added)
}

/// Count down every buff, queue `BuffExpired` for each effect that ran out,
/// and apply health regeneration. Returns the number of expired effects.
pub fn tick_buffs(manager: &mut EntityManager, bus: &EventBus, dt: f32) -> usize {
    let mut expired_total = 0;
    for id in manager.entities_with::<(Buff,)>() {
        let Some(buff) = manager.get_component_mut::<Buff>(id) else {
            continue;
        };
        let regen = buff.value(BuffKind::HealthRegen);
        let expired = buff.tick(dt);

        if regen > 0.0 {
            if let Some(health) = manager.get_component_mut::<Health>(id) {
                health.heal(regen * dt);
            }
        }
        for effect in &expired {
            bus.queue_event(GameEvent::BuffExpired {
                name: effect.name.clone(),
            });
        }
        expired_total += expired.len();
        sync_invulnerability(manager, id);
    }
    expired_total
}

/// Mirror the presence of an `Invulnerability` effect onto `Health`.
fn sync_invulnerability(manager: &mut EntityManager, id: EntityId) {
    let shielded = manager.get_component::<Buff>(id).is_some_and(|b| {
        b.effects()
            .iter()
            .any(|e| e.kind == BuffKind::Invulnerability)
    });
    if let Some(health) = manager.get_component_mut::<Health>(id) {
        health.invulnerable = shielded;
    }
}

// ---------------------------------------------------------------------------
// Experience
// ---------------------------------------------------------------------------

/// Give `amount` XP to `id`, scaled by its `XpMultiplier` buff.
///
/// Queues `XpCollected`, then one `PlayerLevelUp` per level gained.
/// Entities without [`Experience`] gain nothing.
pub fn grant_xp(manager: &mut EntityManager, bus: &EventBus, id: EntityId, amount: f32) -> Vec<LevelUp> {
    let multiplier = manager
        .get_component::<Buff>(id)
        .map_or(1.0, |b| b.multiplier(BuffKind::XpMultiplier));
    let Some(experience) = manager.get_component_mut::<Experience>(id) else {
        return Vec::new();
    };
    let gained = amount * multiplier;
    let ups = experience.add_xp(gained);
    bus.queue_event(GameEvent::XpCollected {
        amount: gained,
        total_xp: experience.xp,
    });
    for up in &ups {
        tracing::info!(%id, level = up.new_level, "level up");
        bus.queue_event(GameEvent::PlayerLevelUp {
            new_level: up.new_level,
            previous_level: up.previous_level,
        });
    }
    ups
}

/// Collect every gem within its pickup range of the player. Returns the
/// number collected.
pub fn collect_pickups(manager: &mut EntityManager, bus: &EventBus) -> usize {
    let Some(player) = manager.first_by_tag(PLAYER_TAG) else {
        return 0;
    };
    let Some(player_pos) = manager.get_component::<Transform>(player).map(|t| t.position) else {
        return 0;
    };
    let gems: Vec<EntityId> = manager.entities_by_tag(XP_GEM_TAG).collect();
    let mut collected = 0;
    for gem in gems {
        let ready = match (
            manager.get_component::<XpPickup>(gem),
            manager.get_component::<Transform>(gem),
        ) {
            (Some(pickup), Some(t)) if t.position.distance(player_pos) <= pickup.pickup_range => {
                Some(pickup.value)
            }
            _ => None,
        };
        if let Some(value) = ready {
            grant_xp(manager, bus, player, value);
            manager.destroy_entity(gem);
            collected += 1;
        }
    }
    collected
}

/// Result of [`spawn_xp_gem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemDrop {
    /// The value was folded into a nearby existing gem.
    Merged(EntityId),
    Spawned(EntityId),
}

/// Drop `value` XP at `position`.
///
/// A live gem within `merge_radius` absorbs the value instead. At
/// `max_gems` live gems the one farthest from the player is destroyed
/// first. Gems spawned this tick are only visible to merging after the
/// next tag-cache rebuild.
pub fn spawn_xp_gem(
    manager: &mut EntityManager,
    config: &PickupConfig,
    position: Vec2,
    value: f32,
) -> Result<GemDrop, EcsError> {
    let gems: Vec<EntityId> = manager.entities_by_tag(XP_GEM_TAG).collect();
    let merge_sq = config.merge_radius * config.merge_radius;
    let merge_into = gems.iter().copied().find(|&gem| {
        manager.has_component::<XpPickup>(gem)
            && manager
                .get_component::<Transform>(gem)
                .is_some_and(|t| t.position.distance_squared(position) <= merge_sq)
    });
    if let Some(gem) = merge_into {
        if let Some(pickup) = manager.get_component_mut::<XpPickup>(gem) {
            pickup.add_value(value);
        }
        return Ok(GemDrop::Merged(gem));
    }

    let player = manager.first_by_tag(PLAYER_TAG);
    if gems.len() >= config.max_gems {
        let anchor = player
            .and_then(|p| manager.get_component::<Transform>(p))
            .map_or(Vec2::ZERO, |t| t.position);
        let farthest = gems
            .iter()
            .copied()
            .filter_map(|g| {
                let t = manager.get_component::<Transform>(g)?;
                Some((g, t.position.distance_squared(anchor)))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(g, _)| g);
        if let Some(gem) = farthest {
            tracing::debug!(%gem, "gem cap reached, dropping farthest");
            manager.destroy_entity(gem);
        }
    }

    let gem = manager.create_entity()?;
    manager.set_tag(gem, XP_GEM_TAG)?;
    manager.add_component(gem, Transform::at(position))?;
    manager.add_component(
        gem,
        XpPickup::new(value, player).with_ranges(config.magnet_range, config.pickup_range),
    )?;
    manager.add_component(gem, Collider::circle(GEM_RADIUS).trigger())?;
    Ok(GemDrop::Spawned(gem))
}

// ---------------------------------------------------------------------------
// Power-ups
// ---------------------------------------------------------------------------

/// Place `power_up` at `position` with a trigger collider of its radius.
pub fn spawn_power_up(
    manager: &mut EntityManager,
    position: Vec2,
    power_up: PowerUp,
) -> Result<EntityId, EcsError> {
    let id = manager.create_entity()?;
    manager.set_tag(id, POWER_UP_TAG)?;
    manager.add_component(id, Transform::at(position))?;
    manager.add_component(id, Collider::circle(power_up.radius).trigger())?;
    manager.add_component(id, power_up)?;
    Ok(id)
}

/// Give the player every power-up it overlaps. Returns the number
/// collected.
///
/// Overlap is centre distance below the sum of the player's bounding radius
/// and the power-up's radius. Each collected power-up applies its effect,
/// queues `PowerUpCollected` and is destroyed.
pub fn collect_power_ups(manager: &mut EntityManager, bus: &EventBus) -> usize {
    let Some(player) = manager.first_by_tag(PLAYER_TAG) else {
        return 0;
    };
    let Some(player_pos) = manager.get_component::<Transform>(player).map(|t| t.position) else {
        return 0;
    };
    let player_radius = manager
        .get_component::<Collider>(player)
        .map_or(0.0, Collider::bounding_radius);

    let mut collected = 0;
    for id in manager.entities_with::<(Transform, PowerUp)>() {
        let touching = match (
            manager.get_component::<Transform>(id),
            manager.get_component::<PowerUp>(id),
        ) {
            (Some(t), Some(p)) => t.position.distance(player_pos) < player_radius + p.radius,
            _ => false,
        };
        if !touching {
            continue;
        }
        let Some(power_up) = manager.remove_component::<PowerUp>(id) else {
            continue;
        };
        let position = manager
            .get_component::<Transform>(id)
            .map_or(player_pos, |t| t.position);
        manager.destroy_entity(id);

        apply_power_up(manager, bus, player, player_pos, power_up.effect);
        tracing::debug!(%player, name = %power_up.name, "power-up collected");
        bus.queue_event(GameEvent::PowerUpCollected {
            name: power_up.name,
            position,
        });
        collected += 1;
    }
    collected
}

fn apply_power_up(
    manager: &mut EntityManager,
    bus: &EventBus,
    player: EntityId,
    player_pos: Vec2,
    effect: PowerUpEffect,
) {
    match effect {
        PowerUpEffect::Heal(amount) => {
            let Some(health) = manager.get_component_mut::<Health>(player) else {
                return;
            };
            let restored = health.heal(amount);
            let current_health = health.current;
            if restored > 0.0 {
                bus.queue_event(GameEvent::PlayerHealed {
                    amount: restored,
                    current_health,
                });
            }
        }
        PowerUpEffect::Buff(effect) => {
            if let Err(err) = apply_buff(manager, bus, player, effect) {
                tracing::warn!(%err, "failed to apply power-up buff");
            }
        }
        PowerUpEffect::Magnet { radius } => {
            let gems: Vec<EntityId> = manager.entities_by_tag(XP_GEM_TAG).collect();
            for gem in gems {
                let value = match (
                    manager.get_component::<XpPickup>(gem),
                    manager.get_component::<Transform>(gem),
                ) {
                    (Some(pickup), Some(t))
                        if radius.map_or(true, |r| t.position.distance(player_pos) <= r) =>
                    {
                        pickup.value
                    }
                    _ => continue,
                };
                grant_xp(manager, bus, player, value);
                manager.destroy_entity(gem);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Weapons
// ---------------------------------------------------------------------------

/// Fire every ready auto-fire weapon at the nearest entity of the opposing
/// tag. Returns the number of projectiles spawned.
///
/// A weapon fires its whole `projectile_count` at once, fanned evenly
/// across `spread` degrees. Damage is scaled by the shooter's
/// `DamageBoost` buff.
pub fn fire_weapons(manager: &mut EntityManager, bus: &EventBus) -> usize {
    let mut spawned = 0;
    for shooter in manager.entities_with::<(Transform, Weapon)>() {
        let ready = manager
            .get_component_mut::<Weapon>(shooter)
            .is_some_and(|w| w.auto_fire && w.try_fire());
        if !ready {
            continue;
        }
        let Some(tag) = manager.entity(shooter).map(|e| e.tag().to_owned()) else {
            continue;
        };
        let Some(origin) = manager.get_component::<Transform>(shooter).map(|t| t.position) else {
            continue;
        };
        let Some(target_pos) = nearest_target(manager, &tag, origin) else {
            continue;
        };
        let Some(weapon) = manager.get_component::<Weapon>(shooter).cloned() else {
            continue;
        };
        let damage = weapon.data.damage
            * manager
                .get_component::<Buff>(shooter)
                .map_or(1.0, |b| b.multiplier(BuffKind::DamageBoost));
        let aim = (target_pos - origin).normalize_or_zero();
        if aim == Vec2::ZERO {
            continue;
        }

        for direction in fan(aim, weapon.data.projectile_count, weapon.data.spread) {
            let spawn = spawn_projectile(manager, &tag, origin, direction, damage, &weapon);
            match spawn {
                Ok(_) => {
                    bus.queue_event(GameEvent::ProjectileFired {
                        position: origin,
                        direction,
                        damage,
                    });
                    spawned += 1;
                }
                // The pool is full; later shots would fail too.
                Err(_) => return spawned,
            }
        }
    }
    spawned
}

fn nearest_target(manager: &EntityManager, shooter_tag: &str, origin: Vec2) -> Option<Vec2> {
    let target_tag = if shooter_tag == PLAYER_TAG {
        ENEMY_TAG
    } else {
        PLAYER_TAG
    };
    manager
        .entities_by_tag(target_tag)
        .filter_map(|t| manager.get_component::<Transform>(t).map(|t| t.position))
        .min_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)))
}

/// `count` unit directions spread evenly across `spread` degrees around
/// `aim`.
fn fan(aim: Vec2, count: u32, spread: f32) -> Vec<Vec2> {
    if count <= 1 {
        return vec![aim];
    }
    let step = spread / (count - 1) as f32;
    (0..count)
        .map(|i| {
            let degrees = -spread / 2.0 + step * i as f32;
            Vec2::from_angle(degrees.to_radians()).rotate(aim)
        })
        .collect()
}

fn spawn_projectile(
    manager: &mut EntityManager,
    shooter_tag: &str,
    origin: Vec2,
    direction: Vec2,
    damage: f32,
    weapon: &Weapon,
) -> Result<EntityId, EcsError> {
    let id = manager.create_entity()?;
    manager.set_tag(id, format!("{shooter_tag}Projectile"))?;
    manager.add_component(id, Transform::at(origin))?;
    manager.add_component(id, Physics::ballistic(direction * weapon.data.projectile_speed))?;
    manager.add_component(
        id,
        Projectile::new(
            damage,
            weapon.data.piercing,
            weapon.projectile_lifetime(),
            shooter_tag,
        ),
    )?;
    manager.add_component(id, Collider::circle(PROJECTILE_RADIUS))?;
    Ok(id)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn buff_system(ctx: &mut SystemContext<'_>) {
    tick_buffs(ctx.manager, ctx.bus, ctx.dt);
}

pub fn weapon_system(ctx: &mut SystemContext<'_>) {
    fire_weapons(ctx.manager, ctx.bus);
}

/// Turn the previous tick's kills into XP gems.
pub fn xp_drop_system(ctx: &mut SystemContext<'_>) {
    for kill in &ctx.last_collision.kills {
        if kill.experience <= 0.0 {
            continue;
        }
        if let Err(err) = spawn_xp_gem(ctx.manager, &ctx.config.pickups, kill.position, kill.experience) {
            tracing::warn!(%err, "failed to spawn xp gem");
            break;
        }
    }
}

pub fn pickup_system(ctx: &mut SystemContext<'_>) {
    collect_pickups(ctx.manager, ctx.bus);
}

pub fn power_up_system(ctx: &mut SystemContext<'_>) {
    collect_power_ups(ctx.manager, ctx.bus);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::components::{register_all, WeaponData};
    use crate::events::EventKind;

    fn setup() -> (EntityManager, EventBus) {
        let mut manager = EntityManager::default();
        register_all(&mut manager);
        (manager, EventBus::default())
    }

    fn player(manager: &mut EntityManager, at: Vec2) -> EntityId {
        let p = manager.create_entity().unwrap();
        manager.set_tag(p, PLAYER_TAG).unwrap();
        manager.add_component(p, Transform::at(at)).unwrap();
        manager.add_component(p, Health::new(100.0)).unwrap();
        manager.add_component(p, Experience::default()).unwrap();
        p
    }

    fn record(bus: &EventBus, kind: EventKind) -> Rc<RefCell<Vec<GameEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        bus.subscribe(kind, move |e, _| sink.borrow_mut().push(e.clone()));
        log
    }

    // -- buffs --------------------------------------------------------------

    #[test]
    fn apply_buff_queues_only_new_effects() {
        let (mut manager, bus) = setup();
        let applied = record(&bus, EventKind::BuffApplied);
        let p = player(&mut manager, Vec2::ZERO);

        let haste = BuffEffect::new("haste", BuffKind::SpeedBoost, 0.5, 3.0);
        assert!(apply_buff(&mut manager, &bus, p, haste.clone()).unwrap());
        assert!(!apply_buff(&mut manager, &bus, p, haste).unwrap());
        bus.process_events();
        assert_eq!(
            *applied.borrow(),
            vec![GameEvent::BuffApplied {
                name: "haste".into(),
                duration: 3.0
            }]
        );
    }

    #[test]
    fn expiring_buffs_queue_events_and_drop_shield() {
        let (mut manager, bus) = setup();
        let expired = record(&bus, EventKind::BuffExpired);
        let p = player(&mut manager, Vec2::ZERO);
        let shield = BuffEffect::new("shield", BuffKind::Invulnerability, 1.0, 0.5);
        apply_buff(&mut manager, &bus, p, shield).unwrap();
        assert!(manager.get_component::<Health>(p).unwrap().invulnerable);

        assert_eq!(tick_buffs(&mut manager, &bus, 0.25), 0);
        assert_eq!(tick_buffs(&mut manager, &bus, 0.25), 1);
        assert!(!manager.get_component::<Health>(p).unwrap().invulnerable);
        bus.process_events();
        assert_eq!(expired.borrow().len(), 1);
    }

    #[test]
    fn regeneration_heals_over_time() {
        let (mut manager, bus) = setup();
        let p = player(&mut manager, Vec2::ZERO);
        manager.get_component_mut::<Health>(p).unwrap().take_damage(50.0);
        let regen = BuffEffect::permanent("regen", BuffKind::HealthRegen, 10.0);
        apply_buff(&mut manager, &bus, p, regen).unwrap();
        tick_buffs(&mut manager, &bus, 0.5);
        assert_eq!(manager.get_component::<Health>(p).unwrap().current, 55.0);
    }

    // -- experience ---------------------------------------------------------

    #[test]
    fn grant_xp_applies_multiplier_and_reports_levels() {
        let (mut manager, bus) = setup();
        let levels = record(&bus, EventKind::PlayerLevelUp);
        let xp = record(&bus, EventKind::XpCollected);
        let p = player(&mut manager, Vec2::ZERO);
        let boost = BuffEffect::permanent("wisdom", BuffKind::XpMultiplier, 1.0);
        apply_buff(&mut manager, &bus, p, boost).unwrap();

        // Level 1 needs 12 XP; 7 doubled is 14.
        let ups = grant_xp(&mut manager, &bus, p, 7.0);
        assert_eq!(ups.len(), 1);
        bus.process_events();
        assert_eq!(
            *levels.borrow(),
            vec![GameEvent::PlayerLevelUp {
                new_level: 2,
                previous_level: 1
            }]
        );
        let collected = xp.borrow();
        match &collected[0] {
            GameEvent::XpCollected { amount, total_xp } => {
                assert_eq!(*amount, 14.0);
                assert!((total_xp - 2.0).abs() < 1e-4);
            }
            other => panic!("unexpected event {other:?}"),
        };
    }

    #[test]
    fn pickups_in_range_are_collected() {
        let (mut manager, bus) = setup();
        let p = player(&mut manager, Vec2::ZERO);
        let config = PickupConfig::default();
        spawn_xp_gem(&mut manager, &config, Vec2::new(10.0, 0.0), 3.0).unwrap();
        spawn_xp_gem(&mut manager, &config, Vec2::new(500.0, 0.0), 3.0).unwrap();
        manager.maintain(1.0);

        assert_eq!(collect_pickups(&mut manager, &bus), 1);
        assert_eq!(manager.get_component::<Experience>(p).unwrap().xp, 3.0);
        manager.maintain(1.0);
        assert_eq!(manager.entities_by_tag(XP_GEM_TAG).count(), 1);
    }

    #[test]
    fn nearby_gems_merge() {
        let (mut manager, _bus) = setup();
        let config = PickupConfig::default();
        let first = spawn_xp_gem(&mut manager, &config, Vec2::ZERO, 2.0).unwrap();
        manager.maintain(1.0);
        let GemDrop::Spawned(gem) = first else {
            panic!("first drop must spawn");
        };
        let second = spawn_xp_gem(&mut manager, &config, Vec2::new(20.0, 0.0), 5.0).unwrap();
        assert_eq!(second, GemDrop::Merged(gem));
        assert_eq!(manager.get_component::<XpPickup>(gem).unwrap().value, 7.0);
    }

    #[test]
    fn gem_cap_drops_the_farthest() {
        let (mut manager, _bus) = setup();
        player(&mut manager, Vec2::ZERO);
        let config = PickupConfig {
            max_gems: 2,
            ..PickupConfig::default()
        };
        let GemDrop::Spawned(near) = spawn_xp_gem(&mut manager, &config, Vec2::new(100.0, 0.0), 1.0).unwrap() else {
            panic!("expected spawn");
        };
        let GemDrop::Spawned(far) = spawn_xp_gem(&mut manager, &config, Vec2::new(900.0, 0.0), 1.0).unwrap() else {
            panic!("expected spawn");
        };
        manager.maintain(1.0);
        spawn_xp_gem(&mut manager, &config, Vec2::new(300.0, 0.0), 1.0).unwrap();
        assert!(manager.is_active(near));
        assert!(!manager.is_active(far));
    }

    // -- power-ups ----------------------------------------------------------

    #[test]
    fn buff_power_up_round_trip() {
        let (mut manager, bus) = setup();
        let applied = record(&bus, EventKind::BuffApplied);
        let collected = record(&bus, EventKind::PowerUpCollected);
        let p = player(&mut manager, Vec2::ZERO);
        let near = spawn_power_up(&mut manager, Vec2::new(5.0, 0.0), PowerUp::damage_boost()).unwrap();
        let far = spawn_power_up(&mut manager, Vec2::new(100.0, 0.0), PowerUp::speed_boost()).unwrap();
        manager.maintain(1.0);

        assert_eq!(collect_power_ups(&mut manager, &bus), 1);
        assert!(!manager.is_active(near));
        assert!(manager.is_active(far));
        assert!(manager.get_component::<Buff>(p).unwrap().has("Damage Boost"));

        bus.process_events();
        assert_eq!(
            *applied.borrow(),
            vec![GameEvent::BuffApplied {
                name: "Damage Boost".into(),
                duration: 10.0
            }]
        );
        assert_eq!(
            *collected.borrow(),
            vec![GameEvent::PowerUpCollected {
                name: "Damage Boost".into(),
                position: Vec2::new(5.0, 0.0)
            }]
        );

        // Already taken; nothing left in reach.
        assert_eq!(collect_power_ups(&mut manager, &bus), 0);
    }

    #[test]
    fn player_collider_widens_power_up_reach() {
        let (mut manager, bus) = setup();
        let p = player(&mut manager, Vec2::ZERO);
        manager.add_component(p, Collider::circle(16.0)).unwrap();
        spawn_power_up(&mut manager, Vec2::new(25.0, 0.0), PowerUp::xp_boost()).unwrap();
        manager.maintain(1.0);
        assert_eq!(collect_power_ups(&mut manager, &bus), 1);
    }

    #[test]
    fn health_pack_heals_and_reports_only_real_healing() {
        let (mut manager, bus) = setup();
        let healed = record(&bus, EventKind::PlayerHealed);
        let p = player(&mut manager, Vec2::ZERO);
        manager.get_component_mut::<Health>(p).unwrap().current = 90.0;
        spawn_power_up(&mut manager, Vec2::ZERO, PowerUp::health_pack()).unwrap();
        spawn_power_up(&mut manager, Vec2::new(1.0, 0.0), PowerUp::health_pack()).unwrap();
        manager.maintain(1.0);

        // The second pack finds the player already full.
        assert_eq!(collect_power_ups(&mut manager, &bus), 2);
        bus.process_events();
        assert_eq!(
            *healed.borrow(),
            vec![GameEvent::PlayerHealed {
                amount: 10.0,
                current_health: 100.0
            }]
        );
    }

    #[test]
    fn magnets_pull_in_gems_by_radius() {
        let (mut manager, bus) = setup();
        let p = player(&mut manager, Vec2::ZERO);
        let config = PickupConfig::default();
        let GemDrop::Spawned(inside) = spawn_xp_gem(&mut manager, &config, Vec2::new(150.0, 0.0), 3.0).unwrap() else {
            panic!("expected spawn");
        };
        let GemDrop::Spawned(outside) = spawn_xp_gem(&mut manager, &config, Vec2::new(0.0, 400.0), 4.0).unwrap() else {
            panic!("expected spawn");
        };
        spawn_power_up(&mut manager, Vec2::ZERO, PowerUp::small_magnet()).unwrap();
        manager.maintain(1.0);

        assert_eq!(collect_power_ups(&mut manager, &bus), 1);
        assert!(!manager.is_active(inside));
        assert!(manager.is_active(outside));
        assert_eq!(manager.get_component::<Experience>(p).unwrap().xp, 3.0);

        spawn_power_up(&mut manager, Vec2::ZERO, PowerUp::large_magnet()).unwrap();
        assert_eq!(collect_power_ups(&mut manager, &bus), 1);
        assert!(!manager.is_active(outside));
        assert_eq!(manager.get_component::<Experience>(p).unwrap().xp, 7.0);
    }

    // -- weapons ------------------------------------------------------------

    #[test]
    fn weapon_fans_projectiles_at_nearest_enemy() {
        let (mut manager, bus) = setup();
        let fired = record(&bus, EventKind::ProjectileFired);
        let p = player(&mut manager, Vec2::ZERO);
        manager
            .add_component(
                p,
                Weapon::new(WeaponData {
                    projectile_count: 3,
                    spread: 90.0,
                    ..WeaponData::default()
                }),
            )
            .unwrap();
        for x in [300.0, 100.0] {
            let e = manager.create_entity().unwrap();
            manager.set_tag(e, ENEMY_TAG).unwrap();
            manager.add_component(e, Transform::at(Vec2::new(x, 0.0))).unwrap();
        }
        manager.maintain(1.0);

        assert_eq!(fire_weapons(&mut manager, &bus), 3);
        // Cooling down now.
        assert_eq!(fire_weapons(&mut manager, &bus), 0);

        bus.process_events();
        let directions: Vec<Vec2> = fired
            .borrow()
            .iter()
            .map(|e| match e {
                GameEvent::ProjectileFired { direction, .. } => *direction,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert!((directions[1] - Vec2::X).length() < 1e-5);
        assert!(directions[0].y < 0.0 && directions[2].y > 0.0);

        let shots = manager.entities_with::<(Projectile,)>();
        assert_eq!(shots.len(), 3);
        let tag = manager.entity(shots[0]).unwrap().tag();
        assert_eq!(tag, "PlayerProjectile");
        let projectile = manager.get_component::<Projectile>(shots[0]).unwrap();
        assert_eq!(projectile.target_tag(), ENEMY_TAG);
        assert_eq!(projectile.lifetime, 1.5);
    }

    #[test]
    fn damage_boost_scales_projectiles() {
        let (mut manager, bus) = setup();
        let p = player(&mut manager, Vec2::ZERO);
        manager.add_component(p, Weapon::new(WeaponData::default())).unwrap();
        let boost = BuffEffect::permanent("might", BuffKind::DamageBoost, 0.5);
        apply_buff(&mut manager, &bus, p, boost).unwrap();
        let e = manager.create_entity().unwrap();
        manager.set_tag(e, ENEMY_TAG).unwrap();
        manager.add_component(e, Transform::at(Vec2::new(0.0, 50.0))).unwrap();
        manager.maintain(1.0);

        fire_weapons(&mut manager, &bus);
        let shot = manager.entities_with::<(Projectile,)>()[0];
        assert_eq!(manager.get_component::<Projectile>(shot).unwrap().damage, 15.0);
    }

    #[test]
    fn fan_of_one_is_the_aim() {
        assert_eq!(fan(Vec2::Y, 1, 45.0), vec![Vec2::Y]);
        assert_eq!(fan(Vec2::Y, 0, 45.0), vec![Vec2::Y]);
    }
}
