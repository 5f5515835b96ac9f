//! Multi-pass collision resolution over the spatial grid.
//!
//! [`CollisionSystem::update`] runs once per tick:
//!
//! 1. tick the player-damage cooldown and rebuild the grid,
//! 2. general broad phase firing `on_collision_enter` callbacks,
//! 3. projectiles against their opposing tag,
//! 4. contact damage from enemies to the player,
//! 5. enemy-enemy separation.
//!
//! Nothing is tracked between ticks except the cooldown, so overlapping
//! pairs fire their callbacks on every tick they overlap.

use glam::Vec2;
use horde_ecs::prelude::*;

use crate::components::{Bounty, Collider, Health, Projectile, Transform};
use crate::config::CollisionConfig;
use crate::events::{EventBus, GameEvent};
use crate::spatial::SpatialGrid;

pub const PLAYER_TAG: &str = "Player";
pub const ENEMY_TAG: &str = "Enemy";

/// An enemy killed by a projectile, captured before it was destroyed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub entity: EntityId,
    pub position: Vec2,
    pub experience: f32,
}

/// What one [`CollisionSystem::update`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    /// Overlapping pairs from the broad phase, `a < b`.
    pub enter_pairs: Vec<(EntityId, EntityId)>,
    pub projectile_hits: usize,
    /// Enemies killed by projectiles (already destroyed).
    pub kills: Vec<Kill>,
    pub player_damaged: bool,
    pub separations: usize,
}

#[derive(Debug)]
pub struct CollisionSystem {
    config: CollisionConfig,
    grid: SpatialGrid,
    damage_cooldown: f32,
}

impl CollisionSystem {
    pub fn new(config: CollisionConfig) -> Self {
        let grid = SpatialGrid::new(config.cell_size);
        Self {
            config,
            grid,
            damage_cooldown: 0.0,
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// The grid as rebuilt by the last update.
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Seconds until the player can take contact damage again.
    pub fn damage_cooldown(&self) -> f32 {
        self.damage_cooldown
    }

    pub fn update(&mut self, manager: &mut EntityManager, bus: &EventBus, dt: f32) -> CollisionReport {
        let mut report = CollisionReport::default();

        if self.damage_cooldown > 0.0 {
            self.damage_cooldown = (self.damage_cooldown - dt).max(0.0);
        }
        self.rebuild_grid(manager);

        self.broad_phase(manager, bus, &mut report);
        self.projectile_pass(manager, bus, &mut report);
        self.player_pass(manager, bus, &mut report);
        self.separation_pass(manager, &mut report);

        tracing::trace!(
            pairs = report.enter_pairs.len(),
            hits = report.projectile_hits,
            kills = report.kills.len(),
            separations = report.separations,
            "collision pass"
        );
        report
    }

    fn rebuild_grid(&mut self, manager: &EntityManager) {
        self.grid.clear();
        for id in manager.entities_with::<(Transform, Collider)>() {
            self.grid.insert_entity(manager, id);
        }
    }

    // -- broad phase ------------------------------------------------------

    fn broad_phase(&self, manager: &mut EntityManager, bus: &EventBus, report: &mut CollisionReport) {
        for a in manager.entities_with::<(Transform, Collider)>() {
            let Some((pos_a, col_a)) = body(manager, a) else {
                continue;
            };
            let search = col_a.bounding_radius() + self.config.neighbor_radius;
            for b in self.grid.query(pos_a, search) {
                if b <= a {
                    continue;
                }
                let Some((pos_b, col_b)) = body(manager, b) else {
                    continue;
                };
                if col_a.intersects(pos_a, col_b, pos_b) {
                    report.enter_pairs.push((a, b));
                }
            }
        }

        for &(a, b) in &report.enter_pairs {
            fire_enter(manager, bus, a, b);
            fire_enter(manager, bus, b, a);
        }
    }

    // -- projectiles ------------------------------------------------------

    fn projectile_pass(&self, manager: &mut EntityManager, bus: &EventBus, report: &mut CollisionReport) {
        let player_pos = manager
            .first_by_tag(PLAYER_TAG)
            .and_then(|p| manager.get_component::<Transform>(p))
            .map_or(Vec2::ZERO, |t| t.position);
        let cull_sq = self.config.culling_range * self.config.culling_range;

        for projectile in manager.entities_with::<(Transform, Projectile, Collider)>() {
            if !manager.is_active(projectile) {
                continue;
            }
            let Some((pos, collider)) = body(manager, projectile) else {
                continue;
            };
            if pos.distance_squared(player_pos) > cull_sq {
                continue;
            }
            let collider = collider.clone();
            let Some((target_tag, damage)) = manager
                .get_component::<Projectile>(projectile)
                .map(|p| (p.target_tag(), p.damage))
            else {
                continue;
            };

            let search = collider.bounding_radius() + self.config.neighbor_radius;
            for target in self.grid.query(pos, search) {
                if !is_hittable(manager, projectile, target, target_tag) {
                    continue;
                }
                let Some((target_pos, target_collider)) = body(manager, target) else {
                    continue;
                };
                if !collider.intersects(pos, target_collider, target_pos) {
                    continue;
                }

                let Some(health) = manager.get_component_mut::<Health>(target) else {
                    continue;
                };
                let outcome = health.take_damage(damage);
                let remaining = health.current;
                report.projectile_hits += 1;

                if target_tag == PLAYER_TAG {
                    bus.queue_event(GameEvent::PlayerDamaged {
                        amount: outcome.applied,
                        remaining_health: remaining,
                    });
                } else if outcome.killed {
                    let experience_value = manager
                        .get_component::<Bounty>(target)
                        .map_or(0.0, |b| b.experience);
                    bus.queue_event(GameEvent::EnemyKilled {
                        experience_value,
                        position: target_pos,
                    });
                    manager.destroy_entity(target);
                    report.kills.push(Kill {
                        entity: target,
                        position: target_pos,
                        experience: experience_value,
                    });
                }

                let alive = manager
                    .get_component_mut::<Projectile>(projectile)
                    .is_some_and(|p| p.record_hit(target));
                if !alive {
                    manager.destroy_entity(projectile);
                    break;
                }
            }
        }
    }

    // -- contact damage -----------------------------------------------------

    fn player_pass(&mut self, manager: &mut EntityManager, bus: &EventBus, report: &mut CollisionReport) {
        if self.damage_cooldown > 0.0 {
            return;
        }
        let Some(player) = manager.first_by_tag(PLAYER_TAG) else {
            return;
        };
        if !manager.has_component::<Health>(player) {
            return;
        }
        let Some((pos, collider)) = body(manager, player) else {
            return;
        };
        let collider = collider.clone();

        let search = collider.bounding_radius() + self.config.neighbor_radius;
        let hit = self.grid.query(pos, search).into_iter().find(|&enemy| {
            manager.is_active(enemy)
                && manager.entity(enemy).is_some_and(|e| e.tag() == ENEMY_TAG)
                && body(manager, enemy).is_some_and(|(ep, ec)| collider.intersects(pos, ec, ep))
        });
        let Some(enemy) = hit else {
            return;
        };
        let Some(health) = manager.get_component_mut::<Health>(player) else {
            return;
        };
        let outcome = health.take_damage(self.config.contact_damage);
        let remaining = health.current;
        self.damage_cooldown = self.config.player_damage_interval;
        if outcome.applied > 0.0 {
            bus.queue_event(GameEvent::PlayerDamaged {
                amount: outcome.applied,
                remaining_health: remaining,
            });
            report.player_damaged = true;
            tracing::debug!(%enemy, amount = outcome.applied, remaining, "contact damage");
        }
    }

    // -- separation ---------------------------------------------------------

    fn separation_pass(&self, manager: &mut EntityManager, report: &mut CollisionReport) {
        let enemies: Vec<EntityId> = manager.entities_by_tag(ENEMY_TAG).collect();
        for a in enemies {
            let Some((pos_a, col_a)) = body(manager, a) else {
                continue;
            };
            let col_a = col_a.clone();
            let search = col_a.bounding_radius() * self.config.separation_search_factor;
            // The grid holds start-of-tick positions; bodies are re-read
            // below so earlier pushes are seen.
            for b in self.grid.query(pos_a, search) {
                if b <= a
                    || !manager.is_active(b)
                    || manager.entity(b).map(|e| e.tag()) != Some(ENEMY_TAG)
                {
                    continue;
                }
                let Some((pos_a, _)) = body(manager, a) else {
                    break;
                };
                let Some((pos_b, col_b)) = body(manager, b) else {
                    continue;
                };
                if !col_a.intersects(pos_a, col_b, pos_b) {
                    continue;
                }
                let delta = pos_b - pos_a;
                let distance = delta.length();
                if distance <= 0.0 {
                    continue;
                }
                let depth = match (col_a.is_circle(), col_b.is_circle()) {
                    (true, true) => col_a.bounding_radius() + col_b.bounding_radius() - distance,
                    _ => self.config.separation_fallback_depth,
                };
                let push = delta / distance * (depth * 0.5);
                if let Some(t) = manager.get_component_mut::<Transform>(a) {
                    t.position -= push;
                }
                if let Some(t) = manager.get_component_mut::<Transform>(b) {
                    t.position += push;
                }
                report.separations += 1;
            }
        }
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

/// Position and collider of an active entity that has both.
fn body(manager: &EntityManager, id: EntityId) -> Option<(Vec2, &Collider)> {
    if !manager.is_active(id) {
        return None;
    }
    let position = manager.get_component::<Transform>(id)?.position;
    let collider = manager.get_component::<Collider>(id)?;
    Some((position, collider))
}

fn is_hittable(manager: &EntityManager, projectile: EntityId, target: EntityId, tag: &str) -> bool {
    manager.is_active(target)
        && manager.entity(target).is_some_and(|e| e.tag() == tag)
        && manager.has_component::<Health>(target)
        && manager
            .get_component::<Projectile>(projectile)
            .is_some_and(|p| p.can_hit(target))
}

fn fire_enter(manager: &mut EntityManager, bus: &EventBus, this: EntityId, other: EntityId) {
    if !manager.is_active(this) {
        return;
    }
    let callback = manager
        .get_component::<Collider>(this)
        .and_then(|c| c.on_collision_enter.clone());
    if let Some(callback) = callback {
        callback(manager, bus, this, other);
    }
}
