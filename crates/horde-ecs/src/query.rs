//! Multi-component queries.
//!
//! A query is a tuple of component types, e.g. `(Transform, Collider)`. It
//! resolves to the [`ComponentMask`] an entity must contain to match. Used by
//! [`EntityManager::entities_with`](crate::manager::EntityManager::entities_with).

use crate::component::{Component, ComponentMask, ComponentRegistry};

// ---------------------------------------------------------------------------
// ComponentQuery trait
// ---------------------------------------------------------------------------

/// A set of component types that must all be present.
pub trait ComponentQuery {
    /// The required mask, or `None` if any listed type was never registered
    /// (in which case no entity can match).
    fn mask(registry: &ComponentRegistry) -> Option<ComponentMask>;
}

// -- impls for tuples of 1..4 -----------------------------------------------

impl<A: Component> ComponentQuery for (A,) {
    fn mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
        let mut mask = ComponentMask::EMPTY;
        mask.insert(registry.lookup::<A>()?);
        Some(mask)
    }
}

impl<A: Component, B: Component> ComponentQuery for (A, B) {
    fn mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
        let mut mask = <(A,)>::mask(registry)?;
        mask.insert(registry.lookup::<B>()?);
        Some(mask)
    }
}

impl<A: Component, B: Component, C: Component> ComponentQuery for (A, B, C) {
    fn mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
        let mut mask = <(A, B)>::mask(registry)?;
        mask.insert(registry.lookup::<C>()?);
        Some(mask)
    }
}

impl<A: Component, B: Component, C: Component, D: Component> ComponentQuery for (A, B, C, D) {
    fn mask(registry: &ComponentRegistry) -> Option<ComponentMask> {
        let mut mask = <(A, B, C)>::mask(registry)?;
        mask.insert(registry.lookup::<D>()?);
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    impl Component for A {}
    struct B;
    impl Component for B {}
    struct Unregistered;
    impl Component for Unregistered {}

    #[test]
    fn mask_covers_every_member() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<A>();
        let b = registry.register::<B>();
        let mask = <(A, B)>::mask(&registry).unwrap();
        assert!(mask.contains(a));
        assert!(mask.contains(b));
        assert_eq!(mask.len(), 2);
    }

    #[test]
    fn unregistered_member_yields_none() {
        let mut registry = ComponentRegistry::new();
        registry.register::<A>();
        assert!(<(A, Unregistered)>::mask(&registry).is_none());
    }
}
