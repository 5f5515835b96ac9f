//! Uniform-grid broad phase.
//!
//! Space is cut into square cells of `cell_size` world units. An entity is
//! recorded in every cell its AABB overlaps, so a query only has to visit the
//! cells covered by the query circle's bounding box. The grid holds no state
//! across ticks: callers clear and refill it each tick.

use std::collections::HashMap;

use glam::Vec2;
use horde_ecs::prelude::*;

use crate::components::{Collider, Transform};

pub type CellCoord = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<EntityId>>,
    memberships: usize,
}

impl SpatialGrid {
    /// Create an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive and finite.
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell_size must be positive and finite, got {cell_size}"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            memberships: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// The cell containing `point`. Floors, so `-0.5` lands in cell `-1`.
    pub fn cell_of(&self, point: Vec2) -> CellCoord {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.memberships = 0;
    }

    /// Record `id` in every cell overlapped by the box `center ± half_extents`.
    pub fn insert(&mut self, id: EntityId, center: Vec2, half_extents: Vec2) {
        let (min_x, min_y) = self.cell_of(center - half_extents);
        let (max_x, max_y) = self.cell_of(center + half_extents);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                self.cells.entry((x, y)).or_default().push(id);
                self.memberships += 1;
            }
        }
    }

    /// Insert an entity using its `Transform` and `Collider`. Returns `false`
    /// if either is missing.
    pub fn insert_entity(&mut self, manager: &EntityManager, id: EntityId) -> bool {
        let (Some(transform), Some(collider)) = (
            manager.get_component::<Transform>(id),
            manager.get_component::<Collider>(id),
        ) else {
            return false;
        };
        self.insert(id, transform.position, collider.half_extents());
        true
    }

    /// Every entity recorded in a cell touched by the bounding box of the
    /// circle at `position` with `radius`, sorted and without duplicates.
    ///
    /// This is a broad phase: results are candidates, not confirmed overlaps.
    pub fn query(&self, position: Vec2, radius: f32) -> Vec<EntityId> {
        let reach = Vec2::splat(radius.max(0.0));
        let (min_x, min_y) = self.cell_of(position - reach);
        let (max_x, max_y) = self.cell_of(position + reach);
        let mut found = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                if let Some(bucket) = self.cells.get(&(x, y)) {
                    found.extend_from_slice(bucket);
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total `(cell, entity)` memberships.
    pub fn len(&self) -> usize {
        self.memberships
    }

    pub fn is_empty(&self) -> bool {
        self.memberships == 0
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> EntityId {
        EntityId::new(i, 0)
    }

    #[test]
    fn negative_coordinates_floor() {
        let grid = SpatialGrid::new(100.0);
        assert_eq!(grid.cell_of(Vec2::new(-0.5, 0.0)), (-1, 0));
        assert_eq!(grid.cell_of(Vec2::new(-100.0, -100.1)), (-1, -2));
        assert_eq!(grid.cell_of(Vec2::new(99.9, 100.0)), (0, 1));
    }

    #[test]
    fn entity_spans_every_overlapped_cell() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(id(1), Vec2::new(100.0, 50.0), Vec2::splat(10.0));
        // x from 90 to 110 crosses the 100 boundary; y stays in row 0.
        assert_eq!(grid.cell_count(), 2);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn query_deduplicates_multi_cell_entities() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(id(1), Vec2::ZERO, Vec2::splat(60.0));
        let hits = grid.query(Vec2::ZERO, 80.0);
        assert_eq!(hits, vec![id(1)]);
    }

    #[test]
    fn query_finds_neighbours_across_cells_and_skips_far_ones() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(id(1), Vec2::new(95.0, 0.0), Vec2::splat(5.0));
        grid.insert(id(2), Vec2::new(105.0, 0.0), Vec2::splat(5.0));
        grid.insert(id(3), Vec2::new(-450.0, 0.0), Vec2::splat(5.0));
        let hits = grid.query(Vec2::new(100.0, 0.0), 20.0);
        assert_eq!(hits, vec![id(1), id(2)]);
    }

    #[test]
    fn clear_empties_grid() {
        let mut grid = SpatialGrid::default();
        grid.insert(id(1), Vec2::ZERO, Vec2::splat(5.0));
        grid.clear();
        assert!(grid.is_empty());
        assert!(grid.query(Vec2::ZERO, 100.0).is_empty());
    }

    #[test]
    fn insert_entity_requires_transform_and_collider() {
        let mut manager = EntityManager::default();
        let with = manager.create_entity().unwrap();
        manager.add_component(with, Transform::default()).unwrap();
        manager.add_component(with, Collider::circle(5.0)).unwrap();
        let without = manager.create_entity().unwrap();
        manager.add_component(without, Transform::default()).unwrap();

        let mut grid = SpatialGrid::default();
        assert!(grid.insert_entity(&manager, with));
        assert!(!grid.insert_entity(&manager, without));
        assert_eq!(grid.query(Vec2::ZERO, 1.0), vec![with]);
    }

    #[test]
    #[should_panic(expected = "cell_size must be positive")]
    fn zero_cell_size_panics() {
        SpatialGrid::new(0.0);
    }
}
