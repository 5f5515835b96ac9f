//! The [`EntityManager`] owns every entity and every component value.
//!
//! It implements the pooled lifecycle:
//!
//! - [`create_entity`](EntityManager::create_entity) allocates below the
//!   configured cap and, at the cap, reactivates an inactive entity in place
//!   (new generation, cleared components). With no inactive entity left it
//!   returns [`EcsError::PoolExhausted`].
//! - [`destroy_entity`](EntityManager::destroy_entity) only flips the
//!   entity to inactive. It stays addressable until compaction.
//! - [`maintain`](EntityManager::maintain) runs compaction on a fixed
//!   interval (only once enough inactive entities have piled up) and then
//!   rebuilds the tag cache if anything changed. Compaction always runs first
//!   so the cache never holds a handle to a freed slot.
//!
//! Systems hold [`EntityId`]s, never references. A handle kept across a
//! destroy may later be rejected as stale once the slot is re-issued.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::component::{
    Component, ComponentColumn, ComponentKind, ComponentMask, ComponentRegistry, Render,
    SparseSet, Update,
};
use crate::entity::{Entity, EntityId, EntitySlots};
use crate::query::ComponentQuery;
use crate::EcsError;

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Pool sizing and compaction policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of owned entities (active + not yet compacted).
    pub max_entities: usize,
    /// Seconds of simulated time between compaction attempts.
    pub cleanup_interval: f32,
    /// Compaction only frees memory once at least this many entities are
    /// inactive.
    pub cleanup_threshold: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_entities: 500,
            cleanup_interval: 0.5,
            cleanup_threshold: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Hook function tables
// ---------------------------------------------------------------------------

/// Runs one kind's update hooks, either over the whole column or for one
/// entity.
type UpdateFn = fn(&mut EntityManager, Option<EntityId>, f32);

struct RendererEntry {
    canvas: TypeId,
    kind: ComponentKind,
    /// A `fn(&EntityManager, Option<EntityId>, &mut C)` for the canvas type
    /// named by `canvas`.
    func: Box<dyn Any>,
}

// ---------------------------------------------------------------------------
// EntityManager
// ---------------------------------------------------------------------------

/// Owner of all entities, component storage, and the tag cache.
pub struct EntityManager {
    config: PoolConfig,
    slots: EntitySlots,
    registry: ComponentRegistry,
    /// Indexed by `ComponentKind`. A column is `None` only while its kind's
    /// update hooks are running.
    columns: Vec<Option<Box<dyn ComponentColumn>>>,
    updaters: Vec<(ComponentKind, UpdateFn)>,
    renderers: Vec<RendererEntry>,
    tag_cache: HashMap<String, Vec<EntityId>>,
    tag_cache_dirty: bool,
    tag_cache_rebuilds: u64,
    cleanup_timer: f32,
}

impl EntityManager {
    /// Create an empty manager with the given pool policy.
    pub fn new(config: PoolConfig) -> Self {
        info!(
            max_entities = config.max_entities,
            "entity manager initialized"
        );
        Self {
            config,
            slots: EntitySlots::new(),
            registry: ComponentRegistry::new(),
            columns: Vec::new(),
            updaters: Vec::new(),
            renderers: Vec::new(),
            tag_cache: HashMap::new(),
            // Start dirty so the first maintenance pass builds the cache.
            tag_cache_dirty: true,
            tag_cache_rebuilds: 0,
            cleanup_timer: 0.0,
        }
    }

    // -- registration -------------------------------------------------------

    /// Register component type `T` and create its storage.
    pub fn register<T: Component>(&mut self) -> ComponentKind {
        let kind = self.registry.register::<T>();
        if kind.index() >= self.columns.len() {
            self.columns.resize_with(kind.index() + 1, || None);
        }
        if self.columns[kind.index()].is_none() {
            self.columns[kind.index()] = Some(Box::new(SparseSet::<T>::new()));
        }
        kind
    }

    /// Register `T` and enable its per-tick [`Update`] hook.
    ///
    /// Update hooks run in registration order of their kinds.
    pub fn register_update<T: Update>(&mut self) -> ComponentKind {
        let kind = self.register::<T>();
        if !self.updaters.iter().any(|(k, _)| *k == kind) {
            self.updaters.push((kind, run_updates_for::<T>));
        }
        kind
    }

    /// Register `T` and enable its [`Render`] hook for canvas type `C`.
    pub fn register_render<T, C>(&mut self) -> ComponentKind
    where
        T: Render<C>,
        C: ?Sized + 'static,
    {
        let kind = self.register::<T>();
        let canvas = TypeId::of::<C>();
        if !self
            .renderers
            .iter()
            .any(|r| r.kind == kind && r.canvas == canvas)
        {
            let func: fn(&EntityManager, Option<EntityId>, &mut C) = run_renders_for::<T, C>;
            self.renderers.push(RendererEntry {
                canvas,
                kind,
                func: Box::new(func),
            });
        }
        kind
    }

    /// The component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- lifecycle ----------------------------------------------------------

    /// Create an entity, reusing an inactive one at the cap.
    ///
    /// Below the cap this always allocates a handle that has never been
    /// issued. At the cap the first inactive entity in storage order is
    /// reactivated in its slot under a new generation, with its components
    /// detached and tag/layer reset. Returns [`EcsError::PoolExhausted`] when
    /// every owned entity is active.
    pub fn create_entity(&mut self) -> Result<EntityId, EcsError> {
        if self.slots.occupied() < self.config.max_entities {
            let id = self.slots.occupy();
            self.tag_cache_dirty = true;
            return Ok(id);
        }

        let reusable = self
            .slots
            .iter()
            .find(|e| !e.is_active())
            .map(|e| (e.id(), e.components()));
        let Some((stale, mask)) = reusable else {
            warn!(
                capacity = self.config.max_entities,
                "entity pool exhausted: cap reached and no inactive entity to reuse"
            );
            return Err(EcsError::PoolExhausted {
                capacity: self.config.max_entities,
            });
        };

        self.detach_all(stale.index(), mask);
        let id = self
            .slots
            .reissue(stale.index())
            .ok_or(EcsError::StaleEntity { entity: stale })?;
        self.tag_cache_dirty = true;
        info!(previous = %stale, entity = %id, "reused pooled entity at cap");
        Ok(id)
    }

    /// Logically destroy an entity. Returns `false` if it was already
    /// inactive or the handle is stale.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        match self.slots.get_mut(id) {
            Some(entity) if entity.is_active() => {
                entity.set_active(false);
                self.tag_cache_dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Physically free inactive entities once at least
    /// `cleanup_threshold` of them exist. Returns the number freed.
    pub fn cleanup_inactive(&mut self) -> usize {
        let inactive: Vec<(EntityId, ComponentMask)> = self
            .slots
            .iter()
            .filter(|e| !e.is_active())
            .map(|e| (e.id(), e.components()))
            .collect();
        if inactive.is_empty() || inactive.len() < self.config.cleanup_threshold {
            return 0;
        }

        let total_before = self.slots.occupied();
        for &(id, mask) in &inactive {
            self.detach_all(id.index(), mask);
            self.slots.vacate(id.index());
        }
        self.tag_cache_dirty = true;
        info!(
            freed = inactive.len(),
            active = self.active_count(),
            total_before,
            total_after = self.slots.occupied(),
            "compacted inactive entities"
        );
        inactive.len()
    }

    /// Per-tick bookkeeping: timed compaction, then tag-cache rebuild.
    pub fn maintain(&mut self, dt: f32) {
        self.cleanup_timer += dt;
        if self.cleanup_timer >= self.config.cleanup_interval {
            self.cleanup_inactive();
            self.cleanup_timer = 0.0;
        }
        if self.tag_cache_dirty {
            self.rebuild_tag_cache();
        }
    }

    /// [`maintain`](Self::maintain), then every registered update hook.
    pub fn update(&mut self, dt: f32) {
        self.maintain(dt);
        self.run_updates(dt);
    }

    /// Run every registered [`Update`] kind over its storage.
    ///
    /// Skips inactive entities and inactive components. An entity destroyed
    /// by an earlier hook in the same pass is skipped for the rest of it.
    pub fn run_updates(&mut self, dt: f32) {
        let updaters = self.updaters.clone();
        for (_, func) in updaters {
            func(self, None, dt);
        }
    }

    /// Run the update hooks of one entity's active components.
    pub fn update_entity(&mut self, id: EntityId, dt: f32) {
        let Some(mask) = self.active_entity(id).map(|e| e.components()) else {
            return;
        };
        let updaters = self.updaters.clone();
        for (kind, func) in updaters {
            if mask.contains(kind) {
                func(self, Some(id), dt);
            }
        }
    }

    /// Run every [`Render`] hook registered for canvas type `C`.
    pub fn render<C: ?Sized + 'static>(&self, canvas: &mut C) {
        self.render_scoped(None, canvas);
    }

    /// Run the render hooks of one entity's active components.
    pub fn render_entity<C: ?Sized + 'static>(&self, id: EntityId, canvas: &mut C) {
        if self.is_active(id) {
            self.render_scoped(Some(id), canvas);
        }
    }

    fn render_scoped<C: ?Sized + 'static>(&self, only: Option<EntityId>, canvas: &mut C) {
        let canvas_type = TypeId::of::<C>();
        for entry in self.renderers.iter().filter(|r| r.canvas == canvas_type) {
            if let Some(id) = only {
                let has = self
                    .slots
                    .get(id)
                    .is_some_and(|e| e.components().contains(entry.kind));
                if !has {
                    continue;
                }
            }
            if let Some(func) = entry
                .func
                .downcast_ref::<fn(&EntityManager, Option<EntityId>, &mut C)>() {
                func(self, only, canvas);
            }
        }
    }

    /// Drop every entity. Handles issued so far all become stale.
    pub fn clear(&mut self) {
        let all: Vec<(EntityId, ComponentMask)> = self
            .slots
            .iter()
            .map(|e| (e.id(), e.components()))
            .collect();
        for (id, mask) in all {
            self.detach_all(id.index(), mask);
            self.slots.vacate(id.index());
        }
        self.tag_cache.clear();
        self.tag_cache_dirty = true;
        info!("entity manager cleared");
    }

    // -- entity metadata ----------------------------------------------------

    /// The entity named by `id`, active or not, until it is compacted.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id)
    }

    fn active_entity(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id).filter(|e| e.is_active())
    }

    /// Whether `id` names a live, active entity.
    pub fn is_active(&self, id: EntityId) -> bool {
        self.active_entity(id).is_some()
    }

    /// Whether `id` still names an owned entity (possibly inactive).
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots.get(id).is_some()
    }

    /// Set the entity's tag. Marks the tag cache dirty.
    pub fn set_tag(&mut self, id: EntityId, tag: impl Into<String>) -> Result<(), EcsError> {
        let entity = self
            .slots
            .get_mut(id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        entity.set_tag(tag.into());
        self.tag_cache_dirty = true;
        Ok(())
    }

    /// Set the entity's layer.
    pub fn set_layer(&mut self, id: EntityId, layer: u32) -> Result<(), EcsError> {
        let entity = self
            .slots
            .get_mut(id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        entity.set_layer(layer);
        Ok(())
    }

    // -- components ---------------------------------------------------------

    /// Attach `value` to `id`, replacing any existing `T`.
    ///
    /// Runs `on_attach` on the new value (and `on_detach` on a replaced
    /// one). `T` is registered on first use.
    pub fn add_component<T: Component>(
        &mut self,
        id: EntityId,
        value: T,
    ) -> Result<&mut T, EcsError> {
        if self.slots.get(id).is_none() {
            return Err(EcsError::StaleEntity { entity: id });
        }
        let kind = self.register::<T>();
        if let Some(entity) = self.slots.get_mut(id) {
            entity.components_mut().insert(kind);
        }
        let set = column_mut::<T>(&mut self.columns, kind)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        Ok(set.insert(id, value))
    }

    /// The `T` attached to `id`, if any.
    pub fn get_component<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.slots.get(id)?;
        self.column::<T>()?.get(id.index())
    }

    /// Mutable access to the `T` attached to `id`, if any.
    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.slots.get(id)?;
        let kind = self.registry.lookup::<T>()?;
        column_mut::<T>(&mut self.columns, kind)?.get_mut(id.index())
    }

    /// Whether `id` has a `T`.
    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        match (self.slots.get(id), self.registry.lookup::<T>()) {
            (Some(entity), Some(kind)) => entity.components().contains(kind),
            _ => false,
        }
    }

    /// Detach the `T` from `id` (running `on_detach`) and hand it back.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let kind = self.registry.lookup::<T>()?;
        let entity = self.slots.get_mut(id)?;
        if !entity.components().contains(kind) {
            return None;
        }
        entity.components_mut().remove(kind);
        column_mut::<T>(&mut self.columns, kind)?.remove(id.index())
    }

    /// Toggle a component's own active flag. Returns `false` if absent.
    pub fn set_component_active<T: Component>(&mut self, id: EntityId, active: bool) -> bool {
        if self.slots.get(id).is_none() {
            return false;
        }
        let Some(kind) = self.registry.lookup::<T>() else {
            return false;
        };
        column_mut::<T>(&mut self.columns, kind).is_some_and(|c| c.set_active(id.index(), active))
    }

    /// The component's own active flag, if present.
    pub fn is_component_active<T: Component>(&self, id: EntityId) -> Option<bool> {
        self.slots.get(id)?;
        self.column::<T>()?.is_active(id.index())
    }

    fn column<T: Component>(&self) -> Option<&SparseSet<T>> {
        let kind = self.registry.lookup::<T>()?;
        self.columns
            .get(kind.index())?
            .as_deref()?
            .as_any()
            .downcast_ref::<SparseSet<T>>()
    }

    fn detach_all(&mut self, slot: u32, mask: ComponentMask) {
        for kind in mask.iter() {
            if let Some(Some(column)) = self.columns.get_mut(kind.index()) {
                column.detach(slot);
            }
        }
    }

    // -- queries ------------------------------------------------------------

    /// Active entities carrying `tag`, via the tag cache.
    ///
    /// The cache is rebuilt during [`maintain`](Self::maintain). Entities
    /// destroyed or retagged away since the last rebuild are filtered out;
    /// entities created or retagged into `tag` appear after the next rebuild.
    pub fn entities_by_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = EntityId> + 'a {
        self.tag_cache
            .get_key_value(tag)
            .into_iter()
            .flat_map(move |(key, ids)| {
                ids.iter().copied().filter(move |&id| {
                    self.active_entity(id)
                        .is_some_and(|e| e.tag() == key.as_str())
                })
            })
    }

    /// First active entity carrying `tag`, via the tag cache.
    pub fn first_by_tag(&self, tag: &str) -> Option<EntityId> {
        self.entities_by_tag(tag).next()
    }

    /// Active entities on `layer`, in storage order.
    pub fn entities_by_layer(&self, layer: u32) -> Vec<EntityId> {
        self.slots
            .iter()
            .filter(|e| e.is_active() && e.layer() == layer)
            .map(|e| e.id())
            .collect()
    }

    /// All active entities, in storage order.
    pub fn active_entities(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.id())
            .collect()
    }

    /// Active entities owning every kind in `Q`, in storage order.
    ///
    /// This is a linear scan over all owned entities on every call. It is
    /// fine off the hot path; per-tick neighbourhood lookups go through the
    /// spatial grid instead.
    ///
    /// ```
    /// use horde_ecs::prelude::*;
    ///
    /// struct Position;
    /// impl Component for Position {}
    /// struct Health;
    /// impl Component for Health {}
    ///
    /// let mut manager = EntityManager::new(PoolConfig::default());
    /// let a = manager.create_entity().unwrap();
    /// manager.add_component(a, Position).unwrap();
    /// manager.add_component(a, Health).unwrap();
    /// let b = manager.create_entity().unwrap();
    /// manager.add_component(b, Position).unwrap();
    ///
    /// assert_eq!(manager.entities_with::<(Position, Health)>(), vec![a]);
    /// assert_eq!(manager.entities_with::<(Position,)>(), vec![a, b]);
    /// ```
    pub fn entities_with<Q: ComponentQuery>(&self) -> Vec<EntityId> {
        let Some(required) = Q::mask(&self.registry) else {
            return Vec::new();
        };
        self.slots
            .iter()
            .filter(|e| e.is_active() && e.components().contains_all(required))
            .map(|e| e.id())
            .collect()
    }

    /// `(owner, &T)` for every `T` whose owner is active, in dense order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.column::<T>()
            .into_iter()
            .flat_map(|set| set.iter())
            .filter(move |(owner, _, _)| self.is_active(*owner))
            .map(|(owner, _, value)| (owner, value))
    }

    /// `(owner, &mut T)` for every `T` whose owner is active, in dense order.
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        let slots = &self.slots;
        let set = self
            .registry
            .lookup::<T>()
            .and_then(|kind| column_mut::<T>(&mut self.columns, kind));
        set.into_iter()
            .flat_map(|set| set.iter_mut())
            .filter(move |(owner, _, _)| slots.get(*owner).is_some_and(|e| e.is_active()))
            .map(|(owner, _, value)| (owner, value))
    }

    // -- counters -----------------------------------------------------------

    /// Number of active entities.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|e| e.is_active()).count()
    }

    /// Number of owned entities, active or awaiting compaction.
    pub fn total_count(&self) -> usize {
        self.slots.occupied()
    }

    /// The configured entity cap.
    pub fn capacity(&self) -> usize {
        self.config.max_entities
    }

    /// The pool policy in effect.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// How many times the tag cache has been rebuilt.
    pub fn tag_cache_rebuilds(&self) -> u64 {
        self.tag_cache_rebuilds
    }

    /// Whether the tag cache is waiting for a rebuild.
    pub fn tag_cache_is_dirty(&self) -> bool {
        self.tag_cache_dirty
    }

    fn rebuild_tag_cache(&mut self) {
        for bucket in self.tag_cache.values_mut() {
            bucket.clear();
        }
        for entity in self.slots.iter() {
            if entity.is_active() && !entity.tag().is_empty() {
                match self.tag_cache.get_mut(entity.tag()) {
                    Some(bucket) => bucket.push(entity.id()),
                    None => {
                        self.tag_cache
                            .insert(entity.tag().to_owned(), vec![entity.id()]);
                    }
                }
            }
        }
        self.tag_cache.retain(|_, bucket| !bucket.is_empty());
        self.tag_cache_dirty = false;
        self.tag_cache_rebuilds += 1;
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("config", &self.config)
            .field("total", &self.slots.occupied())
            .field("active", &self.active_count())
            .field("kinds", &self.registry.len())
            .field("tag_cache_dirty", &self.tag_cache_dirty)
            .finish()
    }
}

fn column_mut<T: Component>(
    columns: &mut [Option<Box<dyn ComponentColumn>>],
    kind: ComponentKind,
) -> Option<&mut SparseSet<T>> {
    columns
        .get_mut(kind.index())?
        .as_deref_mut()?
        .as_any_mut()
        .downcast_mut::<SparseSet<T>>()
}

// ---------------------------------------------------------------------------
// Hook drivers
// ---------------------------------------------------------------------------

fn run_updates_for<T: Update>(manager: &mut EntityManager, only: Option<EntityId>, dt: f32) {
    let Some(kind) = manager.registry.lookup::<T>() else {
        return;
    };
    // Take the column out so hooks can reach every other kind through the
    // manager while this one is borrowed.
    let Some(mut column) = manager.columns.get_mut(kind.index()).and_then(Option::take) else {
        return;
    };
    if let Some(set) = column.as_any_mut().downcast_mut::<SparseSet<T>>() {
        let positions: Vec<usize> = match only {
            Some(id) => set.position_of(id.index()).into_iter().collect(),
            None => (0..set.len()).collect(),
        };
        for pos in positions {
            let Some((owner, active)) = set.header_at(pos) else {
                continue;
            };
            if !active || !manager.is_active(owner) {
                continue;
            }
            let mut ctx = UpdateContext {
                owner,
                dt,
                manager: &mut *manager,
            };
            set.value_at_mut(pos).update(&mut ctx);
        }
    }
    manager.columns[kind.index()] = Some(column);
}

fn run_renders_for<T, C>(manager: &EntityManager, only: Option<EntityId>, canvas: &mut C)
where
    T: Render<C>,
    C: ?Sized + 'static,
{
    let Some(set) = manager.column::<T>() else {
        return;
    };
    let positions: Vec<usize> = match only {
        Some(id) => set.position_of(id.index()).into_iter().collect(),
        None => (0..set.len()).collect(),
    };
    for pos in positions {
        let Some((owner, active)) = set.header_at(pos) else {
            continue;
        };
        if !active || !manager.is_active(owner) {
            continue;
        }
        let ctx = RenderContext { owner, manager };
        set.value_at(pos).render(&ctx, canvas);
    }
}

// ---------------------------------------------------------------------------
// UpdateContext / RenderContext
// ---------------------------------------------------------------------------

/// What an [`Update`] hook can see and touch.
///
/// Sibling components and other entities' components are reachable through
/// the manager. The kind currently being updated is not: looking it up here
/// returns `None`.
pub struct UpdateContext<'a> {
    owner: EntityId,
    dt: f32,
    manager: &'a mut EntityManager,
}

impl<'a> UpdateContext<'a> {
    /// The entity owning the component being updated.
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Seconds since the previous tick.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// A sibling component on the owner.
    pub fn get<U: Component>(&self) -> Option<&U> {
        self.manager.get_component::<U>(self.owner)
    }

    /// Mutable access to a sibling component on the owner.
    pub fn get_mut<U: Component>(&mut self) -> Option<&mut U> {
        self.manager.get_component_mut::<U>(self.owner)
    }

    /// A component on another entity.
    pub fn component<U: Component>(&self, id: EntityId) -> Option<&U> {
        self.manager.get_component::<U>(id)
    }

    /// Mutable access to a component on another entity.
    pub fn component_mut<U: Component>(&mut self, id: EntityId) -> Option<&mut U> {
        self.manager.get_component_mut::<U>(id)
    }

    /// Logically destroy the owner.
    pub fn destroy_owner(&mut self) -> bool {
        self.manager.destroy_entity(self.owner)
    }

    /// Logically destroy another entity.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        self.manager.destroy_entity(id)
    }

    /// Read-only view of the whole manager.
    pub fn manager(&self) -> &EntityManager {
        self.manager
    }
}

/// What a [`Render`] hook can see.
pub struct RenderContext<'a> {
    owner: EntityId,
    manager: &'a EntityManager,
}

impl<'a> RenderContext<'a> {
    /// The entity owning the component being rendered.
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// A sibling component on the owner.
    pub fn get<U: Component>(&self) -> Option<&'a U> {
        self.manager.get_component::<U>(self.owner)
    }

    /// Read-only view of the whole manager.
    pub fn manager(&self) -> &'a EntityManager {
        self.manager
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
