//! Collision shapes and narrow-phase tests.

use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use horde_ecs::prelude::*;

use crate::events::EventBus;

/// Callback fired for each tick a collider overlaps another:
/// `(manager, bus, self, other)`.
pub type CollisionCallback = Rc<dyn Fn(&mut EntityManager, &EventBus, EntityId, EntityId)>;

/// Closed set of collision shapes. Adding a variant forces every pair test
/// below to handle it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Circle { radius: f32 },
    /// Axis-aligned box centred on the transform position.
    Rect { half_extents: Vec2 },
}

/// Collision volume with layer filtering.
///
/// A pair is tested only if `(a.layer & b.mask) != 0 || (b.layer & a.mask) != 0`.
#[derive(Clone)]
pub struct Collider {
    pub shape: ColliderShape,
    pub layer: u32,
    pub mask: u32,
    /// Detect only; no separation response.
    pub is_trigger: bool,
    pub on_collision_enter: Option<CollisionCallback>,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            layer: 1,
            mask: u32::MAX,
            is_trigger: false,
            on_collision_enter: None,
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(ColliderShape::Circle { radius })
    }

    /// Axis-aligned box of full `width` x `height`.
    pub fn rect(width: f32, height: f32) -> Self {
        Self::new(ColliderShape::Rect {
            half_extents: Vec2::new(width, height) * 0.5,
        })
    }

    pub fn with_layer(mut self, layer: u32, mask: u32) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn on_enter<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut EntityManager, &EventBus, EntityId, EntityId) + 'static,
    {
        self.on_collision_enter = Some(Rc::new(callback));
        self
    }

    /// Radius of the smallest circle around the position that contains the
    /// shape.
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            ColliderShape::Circle { radius } => radius,
            ColliderShape::Rect { half_extents } => half_extents.length(),
        }
    }

    /// Half-size of the shape's axis-aligned bounding box.
    pub fn half_extents(&self) -> Vec2 {
        match self.shape {
            ColliderShape::Circle { radius } => Vec2::splat(radius),
            ColliderShape::Rect { half_extents } => half_extents,
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.shape, ColliderShape::Circle { .. })
    }

    /// Whether the layer/mask pair allows these two colliders to interact.
    pub fn layers_interact(&self, other: &Collider) -> bool {
        (self.layer & other.mask) != 0 || (other.layer & self.mask) != 0
    }

    /// Narrow-phase overlap test. Touching edges do not count.
    pub fn intersects(&self, position: Vec2, other: &Collider, other_position: Vec2) -> bool {
        if !self.layers_interact(other) {
            return false;
        }
        match (self.shape, other.shape) {
            (ColliderShape::Circle { radius: ra }, ColliderShape::Circle { radius: rb }) => {
                position.distance(other_position) < ra + rb
            }
            (ColliderShape::Rect { half_extents: ha }, ColliderShape::Rect { half_extents: hb }) => {
                let delta = (position - other_position).abs();
                let reach = ha + hb;
                delta.x < reach.x && delta.y < reach.y
            }
            (ColliderShape::Circle { radius }, ColliderShape::Rect { half_extents }) => {
                circle_rect(position, radius, other_position, half_extents)
            }
            (ColliderShape::Rect { half_extents }, ColliderShape::Circle { radius }) => {
                circle_rect(other_position, radius, position, half_extents)
            }
        }
    }
}

fn circle_rect(center: Vec2, radius: f32, rect_center: Vec2, half_extents: Vec2) -> bool {
    let closest = center.clamp(rect_center - half_extents, rect_center + half_extents);
    center.distance_squared(closest) < radius * radius
}

impl fmt::Debug for Collider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collider")
            .field("shape", &self.shape)
            .field("layer", &self.layer)
            .field("mask", &format_args!("{:#x}", self.mask))
            .field("is_trigger", &self.is_trigger)
            .field("on_collision_enter", &self.on_collision_enter.is_some())
            .finish()
    }
}

impl Component for Collider {}
