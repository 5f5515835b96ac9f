//! Timed and permanent stat modifiers.
//!
//! The [`Buff`] container never talks to the event bus itself; the helpers
//! [`apply_buff`](crate::systems::apply_buff) and
//! [`tick_buffs`](crate::systems::tick_buffs) wrap it and queue
//! `BuffApplied` / `BuffExpired`.

use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuffKind {
    DamageBoost,
    SpeedBoost,
    Invulnerability,
    FireRateBoost,
    HealthRegen,
    MagnetRange,
    XpMultiplier,
}

/// One named effect. A negative `duration` makes it permanent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffEffect {
    pub name: String,
    pub kind: BuffKind,
    pub value: f32,
    pub duration: f32,
    pub remaining: f32,
}

impl BuffEffect {
    pub fn new(name: impl Into<String>, kind: BuffKind, value: f32, duration: f32) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            duration,
            remaining: duration,
        }
    }

    pub fn permanent(name: impl Into<String>, kind: BuffKind, value: f32) -> Self {
        Self::new(name, kind, value, -1.0)
    }

    pub fn is_permanent(&self) -> bool {
        self.duration < 0.0
    }

    pub fn has_expired(&self) -> bool {
        !self.is_permanent() && self.remaining <= 0.0
    }
}

/// The set of effects active on an entity, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    effects: Vec<BuffEffect>,
}

impl Buff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `effect`, or refresh the remaining time of an effect with the
    /// same name. Returns `true` only when the effect is new.
    pub fn add(&mut self, effect: BuffEffect) -> bool {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.name == effect.name) {
            existing.remaining = effect.duration;
            return false;
        }
        self.effects.push(effect);
        true
    }

    /// Remove the effect called `name`, returning it.
    pub fn remove(&mut self, name: &str) -> Option<BuffEffect> {
        let pos = self.effects.iter().position(|e| e.name == name)?;
        Some(self.effects.remove(pos))
    }

    pub fn has(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name == name)
    }

    /// Sum of the values of every effect of `kind`.
    pub fn value(&self, kind: BuffKind) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.value)
            .sum()
    }

    /// `1 + value(kind)`.
    pub fn multiplier(&self, kind: BuffKind) -> f32 {
        1.0 + self.value(kind)
    }

    /// Count down timed effects and remove the expired ones, in order.
    pub fn tick(&mut self, dt: f32) -> Vec<BuffEffect> {
        for effect in &mut self.effects {
            if !effect.is_permanent() {
                effect.remaining -= dt;
            }
        }
        let (expired, kept): (Vec<_>, Vec<_>) =
            self.effects.drain(..).partition(BuffEffect::has_expired);
        self.effects = kept;
        expired
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn effects(&self) -> &[BuffEffect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Component for Buff {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_refreshes_instead_of_stacking() {
        let mut buff = Buff::new();
        assert!(buff.add(BuffEffect::new("haste", BuffKind::SpeedBoost, 0.5, 3.0)));
        buff.tick(2.0);
        assert!(!buff.add(BuffEffect::new("haste", BuffKind::SpeedBoost, 0.5, 3.0)));
        assert_eq!(buff.len(), 1);
        assert_eq!(buff.effects()[0].remaining, 3.0);
    }

    #[test]
    fn values_sum_per_kind() {
        let mut buff = Buff::new();
        buff.add(BuffEffect::permanent("might", BuffKind::DamageBoost, 0.25));
        buff.add(BuffEffect::new("rage", BuffKind::DamageBoost, 0.5, 5.0));
        buff.add(BuffEffect::new("magnet", BuffKind::MagnetRange, 1.0, 5.0));
        assert_eq!(buff.value(BuffKind::DamageBoost), 0.75);
        assert_eq!(buff.multiplier(BuffKind::DamageBoost), 1.75);
        assert_eq!(buff.multiplier(BuffKind::XpMultiplier), 1.0);
    }

    #[test]
    fn tick_expires_timed_effects_only() {
        let mut buff = Buff::new();
        buff.add(BuffEffect::permanent("might", BuffKind::DamageBoost, 0.25));
        buff.add(BuffEffect::new("haste", BuffKind::SpeedBoost, 0.5, 1.0));
        assert!(buff.tick(0.5).is_empty());
        let expired = buff.tick(0.5);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, "haste");
        assert!(buff.has("might"));
        assert!(!buff.has("haste"));
        assert!(buff.tick(1000.0).is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut buff = Buff::new();
        buff.add(BuffEffect::new("shield", BuffKind::Invulnerability, 1.0, 2.0));
        assert!(buff.remove("missing").is_none());
        assert_eq!(buff.remove("shield").map(|e| e.kind), Some(BuffKind::Invulnerability));
        buff.add(BuffEffect::new("shield", BuffKind::Invulnerability, 1.0, 2.0));
        buff.clear();
        assert!(buff.is_empty());
    }
}
