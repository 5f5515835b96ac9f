//! Visual-only components: particles and sprites.

use glam::Vec2;
use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use super::motion::Transform;
use crate::render::{Color, DrawCommand, DrawList};

// ---------------------------------------------------------------------------
// Particle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    DamageNumber,
    Explosion,
    Pickup,
    Trail,
    Spark,
}

/// A short-lived effect that moves itself and destroys its owner on expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    pub lifetime: f32,
    max_lifetime: f32,
    pub velocity: Vec2,
    /// Added to `velocity.y` per second.
    pub gravity: f32,
    /// Velocity multiplier applied once per update.
    pub damping: f32,
    pub scale: f32,
    pub scale_speed: f32,
    /// Label for damage numbers.
    pub text: String,
    pub color: Color,
    pub fade_out: bool,
}

impl Particle {
    pub fn new(kind: ParticleKind, lifetime: f32, velocity: Vec2) -> Self {
        Self {
            kind,
            lifetime,
            max_lifetime: lifetime,
            velocity,
            gravity: 0.0,
            damping: 0.95,
            scale: 1.0,
            scale_speed: 0.0,
            text: String::new(),
            color: Color::WHITE,
            fade_out: true,
        }
    }

    /// Opacity in `0..=255`, fading linearly over the lifetime when
    /// `fade_out` is set.
    pub fn alpha(&self) -> f32 {
        if !self.fade_out {
            return 255.0;
        }
        if self.max_lifetime <= 0.0 {
            return 0.0;
        }
        (self.lifetime / self.max_lifetime).clamp(0.0, 1.0) * 255.0
    }

    pub fn lifetime_fraction(&self) -> f32 {
        if self.max_lifetime > 0.0 {
            self.lifetime / self.max_lifetime
        } else {
            0.0
        }
    }
}

impl Component for Particle {}

impl Update for Particle {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt();
        self.lifetime -= dt;
        if let Some(transform) = ctx.get_mut::<Transform>() {
            transform.translate(self.velocity * dt);
            self.velocity.y += self.gravity * dt;
            self.velocity *= self.damping;
        }
        self.scale += self.scale_speed * dt;
        if self.lifetime <= 0.0 {
            ctx.destroy_owner();
        }
    }
}

// ---------------------------------------------------------------------------
// Sprite
// ---------------------------------------------------------------------------

/// Textured quad drawn at the owner's transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: String,
    pub render_layer: i32,
    pub color: Color,
}

impl Sprite {
    pub fn new(texture: impl Into<String>, render_layer: i32) -> Self {
        Self {
            texture: texture.into(),
            render_layer,
            color: Color::WHITE,
        }
    }
}

impl Component for Sprite {}

impl Render<DrawList> for Sprite {
    fn render(&self, ctx: &RenderContext<'_>, canvas: &mut DrawList) {
        let transform = ctx.get::<Transform>().copied().unwrap_or_default();
        canvas.push(DrawCommand {
            entity: ctx.owner(),
            texture: self.texture.clone(),
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
            layer: self.render_layer,
            color: self.color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_moves_damps_and_expires() {
        let mut manager = EntityManager::default();
        manager.register_update::<Particle>();
        let e = manager.create_entity().unwrap();
        manager.add_component(e, Transform::default()).unwrap();
        let mut particle = Particle::new(ParticleKind::Spark, 0.3, Vec2::new(100.0, 0.0));
        particle.damping = 0.5;
        particle.scale_speed = 1.0;
        manager.add_component(e, particle).unwrap();

        manager.run_updates(0.1);
        assert!((manager.get_component::<Transform>(e).unwrap().position.x - 10.0).abs() < 1e-4);
        let p = manager.get_component::<Particle>(e).unwrap();
        assert_eq!(p.velocity.x, 50.0);
        assert!((p.scale - 1.1).abs() < 1e-4);
        assert!((p.alpha() - 170.0).abs() < 1e-2);

        manager.run_updates(0.25);
        assert!(!manager.is_active(e));
    }

    #[test]
    fn gravity_bends_velocity() {
        let mut p = Particle::new(ParticleKind::DamageNumber, 1.0, Vec2::ZERO);
        p.gravity = 100.0;
        p.damping = 1.0;
        let mut manager = EntityManager::default();
        manager.register_update::<Particle>();
        let e = manager.create_entity().unwrap();
        manager.add_component(e, Transform::default()).unwrap();
        manager.add_component(e, p).unwrap();
        manager.run_updates(0.5);
        assert_eq!(manager.get_component::<Particle>(e).unwrap().velocity.y, 50.0);
    }

    #[test]
    fn non_fading_particle_stays_opaque() {
        let mut p = Particle::new(ParticleKind::Trail, 1.0, Vec2::ZERO);
        p.fade_out = false;
        p.lifetime = 0.1;
        assert_eq!(p.alpha(), 255.0);
    }

    #[test]
    fn sprite_renders_at_transform() {
        let mut manager = EntityManager::default();
        manager.register_render::<Sprite, DrawList>();
        let e = manager.create_entity().unwrap();
        manager
            .add_component(e, Transform::at(Vec2::new(5.0, 6.0)))
            .unwrap();
        manager.add_component(e, Sprite::new("enemy.png", 2)).unwrap();

        let mut list = DrawList::default();
        manager.render(&mut list);
        assert_eq!(list.len(), 1);
        let cmd = &list.commands()[0];
        assert_eq!(cmd.entity, e);
        assert_eq!(cmd.position, Vec2::new(5.0, 6.0));
        assert_eq!(cmd.layer, 2);
    }
}
