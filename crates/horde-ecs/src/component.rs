//! Component traits, kind registration, and per-kind storage.
//!
//! Every component type gets a small-integer [`ComponentKind`] the first time
//! it is registered in a [`ComponentRegistry`]. The kind indexes the manager's
//! per-kind [`SparseSet`] columns and the bits of an entity's
//! [`ComponentMask`].
//!
//! Per-tick behaviour is opt-in. A kind that only carries data implements
//! [`Component`] and nothing else; kinds that act every tick also implement
//! [`Update`] and/or [`Render`] and are registered with the matching
//! `register_*` call on the manager.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::entity::EntityId;
use crate::manager::{RenderContext, UpdateContext};

/// Upper bound on distinct component kinds (bits in a [`ComponentMask`]).
pub const MAX_COMPONENT_KINDS: usize = 64;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A unit of data attached to exactly one entity.
///
/// Both hooks default to doing nothing.
pub trait Component: 'static {
    /// Called once the instance is attached to `owner`.
    fn on_attach(&mut self, _owner: EntityId) {}

    /// Called once right before the instance is removed from `owner`
    /// (explicit removal, overwrite, pool reactivation, or compaction).
    fn on_detach(&mut self, _owner: EntityId) {}
}

/// Per-tick behaviour capability.
pub trait Update: Component {
    /// Advance this component by one tick.
    fn update(&mut self, ctx: &mut UpdateContext<'_>);
}

/// Render capability for a particular canvas type `C`.
///
/// Rendering is read-only with respect to simulation state.
pub trait Render<C: ?Sized>: Component {
    /// Emit draw output for this component onto `canvas`.
    fn render(&self, ctx: &RenderContext<'_>, canvas: &mut C);
}

// ---------------------------------------------------------------------------
// ComponentKind / ComponentMask
// ---------------------------------------------------------------------------

/// Small-integer identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(pub(crate) u32);

impl ComponentKind {
    /// Position of this kind in per-kind storage.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.0)
    }
}

/// Bitset of component kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The empty set.
    pub const EMPTY: ComponentMask = ComponentMask(0);

    /// Add `kind` to the set.
    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= 1 << kind.0;
    }

    /// Remove `kind` from the set.
    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !(1 << kind.0);
    }

    #[inline]
    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & (1 << kind.0) != 0
    }

    /// Whether every kind in `other` is also in `self`.
    #[inline]
    pub fn contains_all(self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of kinds in the set.
    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The kinds in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentKind> {
        (0..MAX_COMPONENT_KINDS as u32)
            .filter(move |&bit| self.0 & (1 << bit) != 0)
            .map(ComponentKind)
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|k| k.0)).finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Kind assigned at registration time.
    pub kind: ComponentKind,
    /// `std::any::type_name::<T>()`, for diagnostics.
    pub name: &'static str,
    /// Rust `TypeId` for runtime type checking.
    pub type_id: TypeId,
}

/// Registry mapping Rust types to [`ComponentKind`]s.
///
/// Registering an already-known type returns the existing kind.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentKind>,
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning its kind.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_COMPONENT_KINDS`] distinct types are
    /// registered.
    pub fn register<T: Component>(&mut self) -> ComponentKind {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return existing;
        }
        assert!(
            self.infos.len() < MAX_COMPONENT_KINDS,
            "cannot register '{}': component kind limit of {} reached",
            std::any::type_name::<T>(),
            MAX_COMPONENT_KINDS
        );
        let kind = ComponentKind(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            kind,
            name: std::any::type_name::<T>(),
            type_id,
        });
        self.by_type.insert(type_id, kind);
        kind
    }

    /// Look up the kind of `T`, if registered.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentKind> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Metadata for a registered kind.
    pub fn info(&self, kind: ComponentKind) -> Option<&ComponentInfo> {
        self.infos.get(kind.index())
    }

    /// Total number of registered kinds.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SparseSet
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Entry<T> {
    owner: EntityId,
    active: bool,
    value: T,
}

/// Dense storage for one component kind, indexed sparsely by entity slot.
///
/// Values are packed in `dense` for iteration; `sparse[slot]` points at the
/// dense position of the slot's value. Removal swaps the last value into the
/// hole, so dense order is not stable across removals.
#[derive(Debug)]
pub struct SparseSet<T> {
    dense: Vec<Entry<T>>,
    sparse: Vec<Option<u32>>,
}

impl<T: Component> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
        }
    }

    fn position(&self, slot: u32) -> Option<usize> {
        self.sparse
            .get(slot as usize)
            .copied()
            .flatten()
            .map(|p| p as usize)
    }

    /// Attach `value` to `owner`, running hooks.
    ///
    /// An existing value for the same slot is replaced; it receives
    /// `on_detach` once and is dropped.
    pub fn insert(&mut self, owner: EntityId, mut value: T) -> &mut T {
        let slot = owner.index() as usize;
        if let Some(pos) = self.position(owner.index()) {
            let entry = &mut self.dense[pos];
            entry.value.on_detach(entry.owner);
            value.on_attach(owner);
            *entry = Entry {
                owner,
                active: true,
                value,
            };
            return &mut self.dense[pos].value;
        }
        value.on_attach(owner);
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        self.sparse[slot] = Some(self.dense.len() as u32);
        self.dense.push(Entry {
            owner,
            active: true,
            value,
        });
        let last = self.dense.len() - 1;
        &mut self.dense[last].value
    }

    /// Detach and return the value stored for `slot`, running `on_detach`.
    pub fn remove(&mut self, slot: u32) -> Option<T> {
        let pos = self.position(slot)?;
        self.sparse[slot as usize] = None;
        let mut entry = self.dense.swap_remove(pos);
        if let Some(moved) = self.dense.get(pos) {
            self.sparse[moved.owner.index() as usize] = Some(pos as u32);
        }
        entry.value.on_detach(entry.owner);
        Some(entry.value)
    }

    pub fn get(&self, slot: u32) -> Option<&T> {
        self.position(slot).map(|p| &self.dense[p].value)
    }

    pub fn get_mut(&mut self, slot: u32) -> Option<&mut T> {
        self.position(slot).map(move |p| &mut self.dense[p].value)
    }

    /// The component's own active flag, if present.
    pub fn is_active(&self, slot: u32) -> Option<bool> {
        self.position(slot).map(|p| self.dense[p].active)
    }

    /// Toggle the component's own active flag. Returns `false` if absent.
    pub fn set_active(&mut self, slot: u32, active: bool) -> bool {
        match self.position(slot) {
            Some(p) => {
                self.dense[p].active = active;
                true
            }
            None => false,
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// `(owner, component_active, value)` in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, bool, &T)> + '_ {
        self.dense.iter().map(|e| (e.owner, e.active, &e.value))
    }

    /// Mutable variant of [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, bool, &mut T)> + '_ {
        self.dense
            .iter_mut()
            .map(|e| (e.owner, e.active, &mut e.value))
    }

    /// Owner and active flag at dense position `pos`.
    pub(crate) fn header_at(&self, pos: usize) -> Option<(EntityId, bool)> {
        self.dense.get(pos).map(|e| (e.owner, e.active))
    }

    pub(crate) fn value_at(&self, pos: usize) -> &T {
        &self.dense[pos].value
    }

    pub(crate) fn value_at_mut(&mut self, pos: usize) -> &mut T {
        &mut self.dense[pos].value
    }

    pub(crate) fn position_of(&self, slot: u32) -> Option<usize> {
        self.position(slot)
    }
}

impl<T: Component> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ComponentColumn -- type-erased view of a SparseSet
// ---------------------------------------------------------------------------

/// Operations the manager needs on a column without knowing its type.
pub(crate) trait ComponentColumn {
    /// Remove the slot's value (running `on_detach`) and drop it.
    fn detach(&mut self, slot: u32);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentColumn for SparseSet<T> {
    fn detach(&mut self, slot: u32) {
        drop(self.remove(slot));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
