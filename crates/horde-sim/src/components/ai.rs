//! Steering for enemies.

use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use super::motion::{Physics, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiBehavior {
    /// Push toward the target, stopping inside `attack_range`.
    Chase,
    /// Push directly away from the target.
    Flee,
    Idle,
}

/// Steers the owner's [`Physics`] relative to `target`.
///
/// Does nothing without a live target, or when the target is farther than
/// `detection_range`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ai {
    pub behavior: AiBehavior,
    /// Force magnitude applied per update.
    pub speed: f32,
    pub attack_range: f32,
    pub detection_range: f32,
    pub target: Option<EntityId>,
}

impl Ai {
    pub fn new(behavior: AiBehavior, speed: f32) -> Self {
        Self {
            behavior,
            speed,
            attack_range: 50.0,
            detection_range: 1500.0,
            target: None,
        }
    }

    pub fn chasing(target: EntityId, speed: f32) -> Self {
        Self {
            target: Some(target),
            ..Self::new(AiBehavior::Chase, speed)
        }
    }
}

impl Component for Ai {}

impl Update for Ai {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.behavior == AiBehavior::Idle {
            return;
        }
        let Some(target) = self.target.filter(|&t| ctx.manager().is_active(t)) else {
            return;
        };
        let Some(target_pos) = ctx.component::<Transform>(target).map(|t| t.position) else {
            return;
        };
        let Some(position) = ctx.get::<Transform>().map(|t| t.position) else {
            return;
        };
        let distance = position.distance(target_pos);
        if distance > self.detection_range {
            return;
        }
        let Some(physics) = ctx.get_mut::<Physics>() else {
            return;
        };
        match self.behavior {
            AiBehavior::Chase => {
                if distance < self.attack_range {
                    physics.velocity = glam::Vec2::ZERO;
                } else {
                    physics.apply_force((target_pos - position).normalize_or_zero() * self.speed);
                }
            }
            AiBehavior::Flee => {
                physics.apply_force((position - target_pos).normalize_or_zero() * self.speed);
            }
            AiBehavior::Idle => {}
        }
    }
}
