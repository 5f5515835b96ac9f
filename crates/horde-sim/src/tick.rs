//! Fixed-timestep driver for the arena simulation.
//!
//! The [`Simulation`] owns the entity manager, the event bus and the
//! collision system. Each tick:
//!
//! 1. The manager is maintained (pool compaction, then tag-cache rebuild)
//!    and every component `Update` hook runs.
//! 2. All registered gameplay systems run in declaration order.
//! 3. Collision resolution runs against the updated positions.
//! 4. Events queued during the tick are delivered, and when particle
//!    effects are enabled the effects those events asked for are spawned.
//! 5. The tick counter advances.
//!
//! Entities destroyed during a tick drop out of tag queries immediately;
//! entities created during a tick appear in them from the next tick.
//!
//! # Example
//!
//! ```
//! use horde_sim::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! sim.add_system("noop", |_ctx| {});
//! sim.run_ticks(10);
//!
//! assert_eq!(sim.tick_count(), 10);
//! assert!((sim.sim_time() - 10.0 / 60.0).abs() < 1e-6);
//! ```

use std::time::{Duration, Instant};

use horde_ecs::manager::EntityManager;

use crate::collision::{CollisionReport, CollisionSystem};
use crate::components::register_all;
use crate::config::{ConfigError, SimConfig};
use crate::events::EventBus;
use crate::particles::{subscribe_particle_effects, ParticleEffects};
use crate::systems;

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Maintenance plus component update hooks.
    pub update_time: Duration,
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(String, Duration)>,
    pub collision_time: Duration,
    pub event_time: Duration,
    /// Events delivered by the end-of-tick drain.
    pub events_delivered: usize,
    /// Particles spawned from those events.
    pub particles_spawned: usize,
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// What a gameplay system sees during a tick.
pub struct SystemContext<'a> {
    pub manager: &'a mut EntityManager,
    pub bus: &'a EventBus,
    pub config: &'a SimConfig,
    /// The collision report from the previous tick.
    pub last_collision: &'a CollisionReport,
    pub dt: f32,
    /// Index of the tick being run, starting at 0.
    pub tick: u64,
}

/// A gameplay system run once per tick.
pub type SystemFn = fn(&mut SystemContext<'_>);

#[derive(Debug)]
struct RegisteredSystem {
    name: String,
    func: SystemFn,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

pub struct Simulation {
    manager: EntityManager,
    bus: EventBus,
    collision: CollisionSystem,
    systems: Vec<RegisteredSystem>,
    config: SimConfig,
    tick_counter: u64,
    last_collision: CollisionReport,
    last_diagnostics: TickDiagnostics,
    effects: Option<ParticleEffects>,
}

impl Simulation {
    /// Validate `config` and build an empty arena with every component kind
    /// registered and no systems.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut manager = EntityManager::new(config.pool.clone());
        register_all(&mut manager);
        Ok(Self {
            manager,
            bus: EventBus::new(config.events.max_emit_depth),
            collision: CollisionSystem::new(config.collision.clone()),
            systems: Vec::new(),
            config,
            tick_counter: 0,
            last_collision: CollisionReport::default(),
            last_diagnostics: TickDiagnostics::default(),
            effects: None,
        })
    }

    /// Register the stock gameplay systems: buffs, weapons, XP drops,
    /// pickups, power-ups.
    pub fn with_default_systems(mut self) -> Self {
        self.add_system("buffs", systems::buff_system);
        self.add_system("weapons", systems::weapon_system);
        self.add_system("xp_drops", systems::xp_drop_system);
        self.add_system("pickups", systems::pickup_system);
        self.add_system("power_ups", systems::power_up_system);
        self
    }

    /// Spawn particle effects for kills, hits, buffs, level-ups and
    /// power-ups, with motion seeded from `seed`. Replaces any earlier
    /// effect wiring.
    pub fn with_particle_effects(mut self, seed: u64) -> Self {
        if let Some(old) = self.effects.take() {
            old.unsubscribe(&self.bus);
        }
        self.effects = Some(subscribe_particle_effects(&self.bus, seed));
        self
    }

    /// Register a system to run each tick, after all earlier ones.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Execute one tick and return its collision report.
    pub fn tick(&mut self) -> &CollisionReport {
        let dt = self.config.tick.fixed_dt;
        let tick_start = Instant::now();

        let phase = Instant::now();
        self.manager.update(dt);
        let update_time = phase.elapsed();

        let mut system_times = Vec::with_capacity(self.systems.len());
        {
            let mut ctx = SystemContext {
                manager: &mut self.manager,
                bus: &self.bus,
                config: &self.config,
                last_collision: &self.last_collision,
                dt,
                tick: self.tick_counter,
            };
            for system in &self.systems {
                let start = Instant::now();
                (system.func)(&mut ctx);
                system_times.push((system.name.clone(), start.elapsed()));
            }
        }

        let phase = Instant::now();
        self.last_collision = self.collision.update(&mut self.manager, &self.bus, dt);
        let collision_time = phase.elapsed();

        let phase = Instant::now();
        let events_delivered = self.bus.process_events();
        let particles_spawned = self
            .effects
            .as_mut()
            .map_or(0, |effects| effects.flush(&mut self.manager));
        let event_time = phase.elapsed();

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            update_time,
            system_times,
            collision_time,
            event_time,
            events_delivered,
            particles_spawned,
            total_time: tick_start.elapsed(),
        };

        tracing::debug!(
            tick = self.tick_counter,
            active = self.manager.active_count(),
            total = self.manager.total_count(),
            kills = self.last_collision.kills.len(),
            events = events_delivered,
            "tick"
        );
        &self.last_collision
    }

    /// Run `count` ticks. Returns the total number of kills across them.
    pub fn run_ticks(&mut self, count: u64) -> usize {
        let mut kills = 0;
        for _ in 0..count {
            kills += self.tick().kills.len();
        }
        kills
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, computed as `tick_count * fixed_dt` so it does
    /// not drift.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt()
    }

    pub fn fixed_dt(&self) -> f64 {
        f64::from(self.config.tick.fixed_dt)
    }

    pub fn manager(&self) -> &EntityManager {
        &self.manager
    }

    /// Mutable access for setup and spawning between ticks.
    pub fn manager_mut(&mut self) -> &mut EntityManager {
        &mut self.manager
    }

    /// The manager and the bus at once, for helpers that need both between
    /// ticks.
    pub fn split_mut(&mut self) -> (&mut EntityManager, &EventBus) {
        (&mut self.manager, &self.bus)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn collision(&self) -> &CollisionSystem {
        &self.collision
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn last_collision(&self) -> &CollisionReport {
        &self.last_collision
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick_counter)
            .field("systems", &self.system_names())
            .field("manager", &self.manager)
            .field("bus", &self.bus)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
