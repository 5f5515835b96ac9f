//! Position and movement.

use glam::Vec2;
use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// World-space placement. Rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.rotation += degrees;
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vec2::splat(scale);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Component for Transform {}

/// Point-mass kinematics.
///
/// Forces accumulate into `acceleration` during a tick and are consumed by
/// the next update. `drag` multiplies velocity once per update. A
/// non-positive `max_speed` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f32,
    pub drag: f32,
    pub max_speed: f32,
}

impl Physics {
    pub fn new(mass: f32, drag: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass,
            drag,
            max_speed: -1.0,
        }
    }

    /// A body that keeps its velocity forever.
    pub fn ballistic(velocity: Vec2) -> Self {
        Self {
            velocity,
            drag: 1.0,
            ..Self::default()
        }
    }

    /// Accumulate `force / mass` into this tick's acceleration.
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force / self.mass;
    }

    /// Change velocity immediately by `impulse / mass`.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse / self.mass;
    }

    /// One integration step; returns the displacement to apply.
    pub fn integrate(&mut self, dt: f32) -> Vec2 {
        self.velocity += self.acceleration * dt;
        self.velocity *= self.drag;
        if self.max_speed > 0.0 {
            self.velocity = self.velocity.clamp_length_max(self.max_speed);
        }
        self.acceleration = Vec2::ZERO;
        self.velocity * dt
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(1.0, 0.98)
    }
}

impl Component for Physics {}

impl Update for Physics {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let step = self.integrate(ctx.dt());
        if let Some(transform) = ctx.get_mut::<Transform>() {
            transform.translate(step);
        }
    }
}
