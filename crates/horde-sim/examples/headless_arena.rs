//! Headless arena run.
//!
//! Spawns a player with an auto-firing weapon, drips in seeded waves of
//! chasing enemies, drops a random power-up every few seconds, and logs what
//! the event bus reports.
//!
//! ```text
//! cargo run -p horde-sim --example headless_arena
//! RUST_LOG=horde_sim=debug cargo run -p horde-sim --example headless_arena -- 1800
//! ```
//!
//! The optional argument is the number of ticks to run (default 600). A JSON
//! config may be supplied through `HORDE_CONFIG`.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use horde_sim::prelude::*;

const WAVE_EVERY: u64 = 120;
const WAVE_SIZE: usize = 12;
const SPAWN_RADIUS: f32 = 700.0;
const POWER_UP_EVERY: u64 = 600;

#[derive(Default)]
struct Tally {
    kills: Cell<u32>,
    level: Cell<u32>,
    damage_taken: Cell<f32>,
    shots: Cell<u32>,
    power_ups: Cell<u32>,
}

fn spawn_player(sim: &mut Simulation) -> anyhow::Result<EntityId> {
    let m = sim.manager_mut();
    let player = m.create_entity()?;
    m.set_tag(player, PLAYER_TAG)?;
    m.add_component(player, Transform::default())?;
    m.add_component(player, Collider::circle(16.0))?;
    m.add_component(player, Health::new(100.0))?;
    m.add_component(player, Experience::default())?;
    m.add_component(
        player,
        Weapon::new(WeaponData {
            projectile_count: 3,
            spread: 30.0,
            piercing: 2,
            ..WeaponData::default()
        }),
    )?;
    m.add_component(player, Sprite::new("player.png", 10))?;
    Ok(player)
}

fn spawn_wave(sim: &mut Simulation, rng: &mut Pcg32, player: EntityId) -> usize {
    let m = sim.manager_mut();
    let mut spawned = 0;
    for _ in 0..WAVE_SIZE {
        let Ok(enemy) = m.create_entity() else {
            break;
        };
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let at = Vec2::from_angle(angle) * SPAWN_RADIUS;
        let speed = rng.gen_range(80.0..140.0);
        let ok = m.set_tag(enemy, ENEMY_TAG).is_ok()
            && m.add_component(enemy, Transform::at(at)).is_ok()
            && m.add_component(enemy, Collider::circle(12.0)).is_ok()
            && m.add_component(enemy, Health::new(20.0)).is_ok()
            && m.add_component(enemy, Bounty { experience: 3.0 }).is_ok()
            && m.add_component(enemy, Physics::new(1.0, 0.9)).is_ok()
            && m.add_component(enemy, Ai::chasing(player, speed)).is_ok()
            && m.add_component(enemy, Sprite::new("enemy.png", 5)).is_ok();
        if ok {
            spawned += 1;
        }
    }
    spawned
}

/// A random stock power-up 200 to 400 units from the player.
fn drop_power_up(sim: &mut Simulation, rng: &mut Pcg32, player: EntityId) -> anyhow::Result<()> {
    let origin = sim
        .manager()
        .get_component::<Transform>(player)
        .map_or(Vec2::ZERO, |t| t.position);
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance: f32 = rng.gen_range(200.0..400.0);
    let at = origin + Vec2::from_angle(angle) * distance;
    let power_up = match rng.gen_range(0..7) {
        0 => PowerUp::health_pack(),
        1 => PowerUp::damage_boost(),
        2 => PowerUp::speed_boost(),
        3 => PowerUp::xp_boost(),
        4 => PowerUp::small_magnet(),
        5 => PowerUp::large_magnet(),
        _ => PowerUp::invulnerability(),
    };
    let name = power_up.name.clone();
    spawn_power_up(sim.manager_mut(), at, power_up)?;
    tracing::info!(%name, x = at.x, y = at.y, "power-up dropped");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let ticks: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("tick count must be an integer")?,
        None => 600,
    };
    let config = match std::env::var("HORDE_CONFIG") {
        Ok(json) => SimConfig::from_json_str(&json).context("invalid HORDE_CONFIG")?,
        Err(_) => SimConfig::default(),
    };

    let mut sim = Simulation::new(config)?
        .with_default_systems()
        .with_particle_effects(0x5eed);
    let mut rng = Pcg32::seed_from_u64(0x5eed);

    let tally = Rc::new(Tally::default());
    {
        let bus = sim.bus();
        let t = tally.clone();
        bus.subscribe(EventKind::EnemyKilled, move |_, _| t.kills.set(t.kills.get() + 1));
        let t = tally.clone();
        bus.subscribe(EventKind::PlayerLevelUp, move |e, _| {
            if let GameEvent::PlayerLevelUp { new_level, .. } = e {
                t.level.set(*new_level);
                tracing::info!(level = new_level, "player levelled up");
            }
        });
        let t = tally.clone();
        bus.subscribe(EventKind::PlayerDamaged, move |e, _| {
            if let GameEvent::PlayerDamaged { amount, remaining_health } = e {
                t.damage_taken.set(t.damage_taken.get() + amount);
                tracing::debug!(amount, remaining_health, "player hit");
            }
        });
        let t = tally.clone();
        bus.subscribe(EventKind::ProjectileFired, move |_, _| t.shots.set(t.shots.get() + 1));
        let t = tally.clone();
        bus.subscribe(EventKind::PowerUpCollected, move |e, _| {
            if let GameEvent::PowerUpCollected { name, .. } = e {
                t.power_ups.set(t.power_ups.get() + 1);
                tracing::info!(%name, "power-up collected");
            }
        });
    }

    let player = spawn_player(&mut sim)?;
    for tick in 0..ticks {
        if tick % WAVE_EVERY == 0 {
            let spawned = spawn_wave(&mut sim, &mut rng, player);
            tracing::info!(tick, spawned, active = sim.manager().active_count(), "wave");
        }
        if tick > 0 && tick % POWER_UP_EVERY == 0 {
            if let Err(err) = drop_power_up(&mut sim, &mut rng, player) {
                tracing::warn!(%err, "could not drop power-up");
            }
        }
        sim.tick();
        let alive = sim
            .manager()
            .get_component::<Health>(player)
            .is_some_and(Health::is_alive);
        if !alive {
            tracing::warn!(tick, "player died");
            break;
        }
    }

    let mut frame = DrawList::new();
    sim.manager().render(&mut frame);
    frame.sort_by_layer();

    let diagnostics = sim.last_diagnostics();
    tracing::info!(
        ticks = sim.tick_count(),
        sim_time = sim.sim_time(),
        kills = tally.kills.get(),
        level = tally.level.get(),
        shots = tally.shots.get(),
        power_ups = tally.power_ups.get(),
        damage_taken = tally.damage_taken.get(),
        active = sim.manager().active_count(),
        sprites = frame.len(),
        last_tick_us = diagnostics.total_time.as_micros() as u64,
        "run complete"
    );
    Ok(())
}
