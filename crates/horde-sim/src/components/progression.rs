//! Experience levels and XP gems.

use glam::Vec2;
use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use super::buff::{Buff, BuffKind};
use super::motion::Transform;

/// XP required to advance from `level` to `level + 1`.
pub fn xp_for_level(level: u32) -> f32 {
    10.0 * 1.2f32.powi(level as i32)
}

/// One level gained by [`Experience::add_xp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub previous_level: u32,
    pub new_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub level: u32,
    /// Progress toward the next level.
    pub xp: f32,
    pub xp_to_next: f32,
}

impl Experience {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            xp: 0.0,
            xp_to_next: xp_for_level(level),
        }
    }

    /// Add XP, rolling over as many levels as it covers.
    pub fn add_xp(&mut self, amount: f32) -> Vec<LevelUp> {
        self.xp += amount.max(0.0);
        let mut gained = Vec::new();
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            gained.push(LevelUp {
                previous_level: self.level,
                new_level: self.level + 1,
            });
            self.level += 1;
            self.xp_to_next = xp_for_level(self.level);
        }
        gained
    }

    /// Progress toward the next level in `[0, 1)`.
    pub fn progress(&self) -> f32 {
        self.xp / self.xp_to_next
    }
}

impl Default for Experience {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Component for Experience {}

// ---------------------------------------------------------------------------
// XpPickup
// ---------------------------------------------------------------------------

/// Base pull speed toward the target, doubled inside [`XpPickup::CLOSE_RANGE`].
const PULL_SPEED: f32 = 300.0;

/// An XP gem. It drifts toward `target` once inside the (buffable) magnet
/// range and waits there to be collected.
#[derive(Debug, Clone, PartialEq)]
pub struct XpPickup {
    pub value: f32,
    pub target: Option<EntityId>,
    pub magnet_range: f32,
    pub pickup_range: f32,
    pub lifetime: f32,
    pulled: bool,
}

impl XpPickup {
    pub const CLOSE_RANGE: f32 = 100.0;

    pub fn new(value: f32, target: Option<EntityId>) -> Self {
        Self {
            value,
            target,
            magnet_range: 300.0,
            pickup_range: 20.0,
            lifetime: 60.0,
            pulled: false,
        }
    }

    pub fn with_ranges(mut self, magnet_range: f32, pickup_range: f32) -> Self {
        self.magnet_range = magnet_range;
        self.pickup_range = pickup_range;
        self
    }

    /// Merge another gem's value into this one.
    pub fn add_value(&mut self, value: f32) {
        self.value += value;
    }

    /// Whether the gem has started moving toward its target.
    pub fn is_pulled(&self) -> bool {
        self.pulled
    }

    /// Position change for one tick given the gem and target positions.
    fn pull_step(&mut self, from: Vec2, to: Vec2, magnet_range: f32, dt: f32) -> Vec2 {
        let distance = from.distance(to);
        if distance <= self.pickup_range || distance > magnet_range {
            return Vec2::ZERO;
        }
        self.pulled = true;
        let speed = if distance < Self::CLOSE_RANGE {
            PULL_SPEED * 2.0
        } else {
            PULL_SPEED
        };
        // Never overshoot the target.
        (to - from).normalize_or_zero() * (speed * dt).min(distance)
    }
}

impl Component for XpPickup {}

impl Update for XpPickup {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.lifetime -= ctx.dt();
        if self.lifetime <= 0.0 {
            ctx.destroy_owner();
            return;
        }
        let Some(target) = self.target else {
            return;
        };
        let Some(target_pos) = ctx.component::<Transform>(target).map(|t| t.position) else {
            return;
        };
        let multiplier = ctx
            .component::<Buff>(target)
            .map_or(1.0, |b| b.multiplier(BuffKind::MagnetRange));
        let dt = ctx.dt();
        let magnet_range = self.magnet_range * multiplier;
        if let Some(transform) = ctx.get_mut::<Transform>() {
            let step = self.pull_step(transform.position, target_pos, magnet_range, dt);
            transform.translate(step);
        }
    }
}
