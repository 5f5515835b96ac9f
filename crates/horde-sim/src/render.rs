//! Read-only rendering snapshots.
//!
//! The simulation never draws. It fills a [`DrawList`] through the
//! [`Render`](horde_ecs::component::Render) hooks of sprite components, or
//! produces a collider debug snapshot with [`draw_list`], and a front end
//! turns either into pixels.

use glam::Vec2;
use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Collider, ColliderShape, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 80, 80);
    pub const GREEN: Color = Color::rgb(80, 220, 80);
    pub const YELLOW: Color = Color::rgb(255, 220, 60);
    pub const GRAY: Color = Color::rgb(140, 140, 140);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// One textured quad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub entity: EntityId,
    pub texture: String,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub layer: i32,
    pub color: Color,
}

/// Canvas for [`Render`](horde_ecs::component::Render) hooks.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Stable sort by layer, so equal layers keep submission order.
    pub fn sort_by_layer(&mut self) {
        self.commands.sort_by_key(|c| c.layer);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Collider outline for debug rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugShape {
    pub entity: EntityId,
    pub position: Vec2,
    pub shape: ColliderShape,
    pub color: Color,
}

/// Snapshot of every active entity with a transform and a collider, in
/// storage order, coloured by tag.
pub fn draw_list(manager: &EntityManager) -> Vec<DebugShape> {
    manager
        .entities_with::<(Transform, Collider)>()
        .into_iter()
        .filter_map(|id| {
            let transform = manager.get_component::<Transform>(id)?;
            let collider = manager.get_component::<Collider>(id)?;
            let color = match manager.entity(id).map(|e| e.tag()) {
                Some("Player") => Color::GREEN,
                Some("Enemy") => Color::RED,
                Some("XPGem") => Color::YELLOW,
                _ => Color::GRAY,
            };
            Some(DebugShape {
                entity: id,
                position: transform.position,
                shape: collider.shape,
                color,
            })
        })
        .collect()
}
