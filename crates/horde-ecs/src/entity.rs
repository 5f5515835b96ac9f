//! Entity handles, entity records, and slot storage.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and a slot *index* in the low 32 bits. The generation is bumped
//! every time a slot is re-issued (pool reactivation or reuse after
//! compaction), so a handle kept across a destroy is detected as stale instead
//! of silently aliasing a different logical entity.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use crate::component::ComponentMask;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity handle.
///
/// Layout: `[generation: u32 | index: u32]`. Handles order by index first so
/// that `a < b` is a stable pair-dedup key for collision passes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index(), self.generation()).cmp(&(other.index(), other.generation()))
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Metadata for one entity: identity, activity, tag, layer, and the set of
/// component kinds it owns.
///
/// Component values live in per-kind storage inside the
/// [`EntityManager`](crate::manager::EntityManager); the entity only records
/// which kinds are present. Mutation goes through the manager so the tag
/// cache can be kept honest.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    active: bool,
    tag: String,
    layer: u32,
    components: ComponentMask,
}

impl Entity {
    fn new(id: EntityId) -> Self {
        Self {
            id,
            active: true,
            tag: String::new(),
            layer: 0,
            components: ComponentMask::EMPTY,
        }
    }

    /// The handle currently naming this entity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the entity is live (not logically destroyed).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Category string such as `"Player"` or `"Enemy"`. Empty when unset.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Free-form layer value used for render ordering and layer queries.
    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// The component kinds attached to this entity.
    pub fn components(&self) -> ComponentMask {
        self.components
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_tag(&mut self, tag: String) {
        self.tag = tag;
    }

    pub(crate) fn set_layer(&mut self, layer: u32) {
        self.layer = layer;
    }

    pub(crate) fn components_mut(&mut self) -> &mut ComponentMask {
        &mut self.components
    }
}

// ---------------------------------------------------------------------------
// EntitySlots
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    /// Generation of the most recent handle issued for this slot.
    generation: u32,
    entity: Option<Entity>,
}

/// Slot storage for entities, in storage order.
///
/// Slots vacated by compaction are kept in a FIFO queue so generations are
/// spread out over time rather than concentrated on a hot index.
#[derive(Debug, Default)]
pub(crate) struct EntitySlots {
    slots: Vec<Slot>,
    vacant: VecDeque<u32>,
    occupied: usize,
}

impl EntitySlots {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Place a fresh entity in a vacant slot or a brand-new one.
    ///
    /// Vacated slots already had their generation bumped, so the returned
    /// handle has never been issued before.
    pub(crate) fn occupy(&mut self) -> EntityId {
        self.occupied += 1;
        if let Some(index) = self.vacant.pop_front() {
            let slot = &mut self.slots[index as usize];
            let id = EntityId::new(index, slot.generation);
            slot.entity = Some(Entity::new(id));
            id
        } else {
            let index = self.slots.len() as u32;
            let id = EntityId::new(index, 0);
            self.slots.push(Slot {
                generation: 0,
                entity: Some(Entity::new(id)),
            });
            id
        }
    }

    /// Re-issue an occupied slot under a new generation, resetting its
    /// metadata. The caller is responsible for detaching components first.
    pub(crate) fn reissue(&mut self, index: u32) -> Option<EntityId> {
        let slot = self.slots.get_mut(index as usize)?;
        slot.entity.as_ref()?;
        slot.generation = slot.generation.wrapping_add(1);
        let id = EntityId::new(index, slot.generation);
        slot.entity = Some(Entity::new(id));
        Some(id)
    }

    /// Physically free a slot, bumping its generation so outstanding handles
    /// become stale.
    pub(crate) fn vacate(&mut self, index: u32) -> Option<Entity> {
        let slot = self.slots.get_mut(index as usize)?;
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push_back(index);
        self.occupied -= 1;
        Some(entity)
    }

    /// The entity named by `id`, if the handle's generation is current.
    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Occupied entities in storage (slot) order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.slots.iter().filter_map(|s| s.entity.as_ref())
    }

    /// Number of occupied slots, active or not.
    pub(crate) fn occupied(&self) -> usize {
        self.occupied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
