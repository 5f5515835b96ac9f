//! Horde ECS -- pooled Entity Component System for arena simulations.
//!
//! Entities are lightweight records (tag, layer, active flag) addressed by
//! generational [`EntityId`](entity::EntityId) handles. Component values live
//! in per-kind sparse sets owned by the [`EntityManager`](manager::EntityManager).
//! Destroying an entity is logical: it goes inactive and is either compacted
//! later or reactivated in place once the pool reaches its cap.
//!
//! # Quick Start
//!
//! ```
//! use horde_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position {}
//!
//! struct Drift { dx: f32 }
//! impl Component for Drift {}
//! impl Update for Drift {
//!     fn update(&mut self, ctx: &mut UpdateContext<'_>) {
//!         let step = self.dx * ctx.dt();
//!         if let Some(pos) = ctx.get_mut::<Position>() {
//!             pos.x += step;
//!         }
//!     }
//! }
//!
//! let mut manager = EntityManager::new(PoolConfig::default());
//! manager.register_update::<Drift>();
//!
//! let e = manager.create_entity().unwrap();
//! manager.set_tag(e, "Enemy").unwrap();
//! manager.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
//! manager.add_component(e, Drift { dx: 10.0 }).unwrap();
//!
//! manager.update(0.5);
//! assert_eq!(manager.get_component::<Position>(e), Some(&Position { x: 5.0, y: 0.0 }));
//! assert_eq!(manager.entities_by_tag("Enemy").collect::<Vec<_>>(), vec![e]);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod manager;
pub mod query;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The handle no longer names an owned entity (compacted or re-issued).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// The pool is at its cap and every owned entity is active.
    #[error("entity pool exhausted: all {capacity} entities are active")]
    PoolExhausted { capacity: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{
        Component, ComponentInfo, ComponentKind, ComponentMask, ComponentRegistry, Render,
        SparseSet, Update,
    };
    pub use crate::entity::{Entity, EntityId};
    pub use crate::manager::{EntityManager, PoolConfig, RenderContext, UpdateContext};
    pub use crate::query::ComponentQuery;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    // -- test component types -----------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    /// Damages every other entity carrying `Health`.
    struct Aura(u32);
    impl Component for Aura {}
    impl Update for Aura {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            let me = ctx.owner();
            let targets: Vec<EntityId> = ctx
                .manager()
                .entities_with::<(Health,)>()
                .into_iter()
                .filter(|&id| id != me)
                .collect();
            for id in targets {
                let dead = match ctx.component_mut::<Health>(id) {
                    Some(hp) => {
                        hp.0 = hp.0.saturating_sub(self.0);
                        hp.0 == 0
                    }
                    None => false,
                };
                if dead {
                    ctx.destroy(id);
                }
            }
        }
    }

    /// Reads its own kind through the context; must always see `None`.
    struct Introspect {
        saw_self: bool,
    }
    impl Component for Introspect {}
    impl Update for Introspect {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            self.saw_self = ctx.get::<Introspect>().is_some();
        }
    }

    fn manager(max: usize) -> EntityManager {
        EntityManager::new(PoolConfig {
            max_entities: max,
            ..PoolConfig::default()
        })
    }

    // -- lifecycle ----------------------------------------------------------

    #[test]
    fn full_lifecycle_through_maintenance() {
        let mut m = EntityManager::new(PoolConfig {
            max_entities: 64,
            cleanup_interval: 0.5,
            cleanup_threshold: 3,
        });
        let ids: Vec<EntityId> = (0..6).map(|_| m.create_entity().unwrap()).collect();
        for &id in &ids {
            m.set_tag(id, "Enemy").unwrap();
            m.add_component(id, Position { x: 0.0, y: 0.0 }).unwrap();
        }
        m.maintain(0.0);
        assert_eq!(m.entities_by_tag("Enemy").count(), 6);

        for &id in &ids[..3] {
            m.destroy_entity(id);
        }
        assert_eq!(m.entities_by_tag("Enemy").count(), 3);
        assert_eq!(m.total_count(), 6);

        m.maintain(0.5);
        assert_eq!(m.total_count(), 3);
        assert_eq!(m.active_count(), 3);
        assert_eq!(m.entities_by_tag("Enemy").collect::<Vec<_>>(), ids[3..]);
        assert!(!m.tag_cache_is_dirty());
    }

    #[test]
    fn pool_of_one_cycles_through_generations() {
        let mut m = manager(1);
        let mut previous = m.create_entity().unwrap();
        for _ in 0..5 {
            m.destroy_entity(previous);
            let next = m.create_entity().unwrap();
            assert_eq!(next.index(), previous.index());
            assert!(next.generation() > previous.generation());
            assert!(!m.is_alive(previous));
            previous = next;
        }
        assert_eq!(m.total_count(), 1);
    }

    #[test]
    fn clear_invalidates_every_handle() {
        let mut m = manager(8);
        let a = m.create_entity().unwrap();
        m.add_component(a, Health(3)).unwrap();
        m.clear();
        assert_eq!(m.total_count(), 0);
        assert!(!m.is_alive(a));
        let b = m.create_entity().unwrap();
        assert_ne!(a, b);
    }

    // -- cross-entity updates -------------------------------------------------

    #[test]
    fn update_hook_reaches_other_entities() {
        let mut m = manager(8);
        m.register_update::<Aura>();
        let source = m.create_entity().unwrap();
        m.add_component(source, Aura(2)).unwrap();
        m.add_component(source, Health(100)).unwrap();
        let victim = m.create_entity().unwrap();
        m.add_component(victim, Health(3)).unwrap();

        m.run_updates(0.016);
        assert_eq!(m.get_component::<Health>(victim), Some(&Health(1)));
        assert_eq!(m.get_component::<Health>(source), Some(&Health(100)));

        m.run_updates(0.016);
        assert!(!m.is_active(victim));
    }

    #[test]
    fn update_hook_cannot_see_its_own_kind() {
        let mut m = manager(8);
        m.register_update::<Introspect>();
        let e = m.create_entity().unwrap();
        m.add_component(e, Introspect { saw_self: true }).unwrap();
        m.run_updates(0.016);
        assert!(!m.get_component::<Introspect>(e).unwrap().saw_self);
    }

    #[test]
    fn iter_mut_skips_inactive_owners() {
        let mut m = manager(8);
        let a = m.create_entity().unwrap();
        let b = m.create_entity().unwrap();
        m.add_component(a, Health(10)).unwrap();
        m.add_component(b, Health(10)).unwrap();
        m.destroy_entity(b);

        for (_, hp) in m.iter_mut::<Health>() {
            hp.0 += 5;
        }
        assert_eq!(m.get_component::<Health>(a), Some(&Health(15)));
        assert_eq!(m.get_component::<Health>(b), Some(&Health(10)));
        assert_eq!(m.iter::<Health>().count(), 1);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = EcsError::PoolExhausted { capacity: 500 };
        assert!(err.to_string().contains("500"));
        let err = EcsError::StaleEntity {
            entity: EntityId::new(3, 1),
        };
        assert!(err.to_string().contains("stale"));
    }
}
