//! Health, projectiles, weapons.

use horde_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Result of one [`Health::take_damage`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed (0 when the hit was ignored).
    pub applied: f32,
    /// This hit brought health to zero.
    pub killed: bool,
}

impl DamageOutcome {
    const IGNORED: DamageOutcome = DamageOutcome {
        applied: 0.0,
        killed: false,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub invulnerable: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            invulnerable: false,
        }
    }

    /// Subtract `amount`, clamping at zero. Ignored while invulnerable or
    /// already dead.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.invulnerable || self.is_dead() {
            return DamageOutcome::IGNORED;
        }
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        DamageOutcome {
            applied: before - self.current,
            killed: self.is_dead(),
        }
    }

    /// Add `amount`, clamping at max. Returns the amount restored; the dead
    /// cannot be healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Change max health, keeping the current/max ratio.
    pub fn set_max(&mut self, max: f32) {
        let ratio = self.fraction();
        self.max = max;
        self.current = max * ratio;
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Current health as a fraction of max, 0 when max is 0.
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

impl Component for Health {}

/// XP awarded when this entity is killed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounty {
    pub experience: f32,
}

impl Component for Bounty {}

// ---------------------------------------------------------------------------
// Projectile
// ---------------------------------------------------------------------------

/// A damaging body that hits each target at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub damage: f32,
    /// Remaining hits before the projectile is spent.
    pub piercing: u32,
    pub lifetime: f32,
    max_lifetime: f32,
    /// Tag of the shooter, e.g. `"Player"`. Selects the opposing tag.
    pub owner_tag: String,
    hits: Vec<EntityId>,
}

impl Projectile {
    pub fn new(damage: f32, piercing: u32, lifetime: f32, owner_tag: impl Into<String>) -> Self {
        Self {
            damage,
            piercing,
            lifetime,
            max_lifetime: lifetime,
            owner_tag: owner_tag.into(),
            hits: Vec::new(),
        }
    }

    /// Whether `target` has not been hit yet.
    pub fn can_hit(&self, target: EntityId) -> bool {
        !self.hits.contains(&target)
    }

    /// Record a hit on `target`, spending one pierce. Returns `true` while
    /// the projectile can still hit something.
    pub fn record_hit(&mut self, target: EntityId) -> bool {
        self.hits.push(target);
        self.piercing = self.piercing.saturating_sub(1);
        self.piercing > 0
    }

    /// The tag this projectile damages.
    pub fn target_tag(&self) -> &'static str {
        if self.owner_tag == "Player" {
            "Enemy"
        } else {
            "Player"
        }
    }

    pub fn lifetime_fraction(&self) -> f32 {
        if self.max_lifetime > 0.0 {
            self.lifetime / self.max_lifetime
        } else {
            0.0
        }
    }
}

impl Component for Projectile {}

impl Update for Projectile {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.lifetime -= ctx.dt();
        if self.lifetime <= 0.0 {
            ctx.destroy_owner();
        }
    }
}

// ---------------------------------------------------------------------------
// Weapon
// ---------------------------------------------------------------------------

/// Static description of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub name: String,
    pub damage: f32,
    /// Shots per second.
    pub fire_rate: f32,
    pub projectile_speed: f32,
    pub piercing: u32,
    pub projectile_count: u32,
    /// Total fan angle in degrees across `projectile_count` projectiles.
    pub spread: f32,
    /// Travel distance before a projectile expires.
    pub range: f32,
}

impl Default for WeaponData {
    fn default() -> Self {
        Self {
            name: "Magic Bolt".to_owned(),
            damage: 10.0,
            fire_rate: 2.0,
            projectile_speed: 400.0,
            piercing: 1,
            projectile_count: 1,
            spread: 0.0,
            range: 600.0,
        }
    }
}

/// An auto-firing weapon with a cooldown of `1 / fire_rate` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub data: WeaponData,
    pub auto_fire: bool,
    fire_timer: f32,
    can_fire: bool,
}

impl Weapon {
    pub fn new(data: WeaponData) -> Self {
        Self {
            data,
            auto_fire: true,
            fire_timer: 0.0,
            can_fire: true,
        }
    }

    /// Consume the ready shot, if any.
    pub fn try_fire(&mut self) -> bool {
        if self.can_fire {
            self.can_fire = false;
            self.fire_timer = 0.0;
            true
        } else {
            false
        }
    }

    pub fn is_ready(&self) -> bool {
        self.can_fire
    }

    pub fn reset_cooldown(&mut self) {
        self.can_fire = true;
        self.fire_timer = 0.0;
    }

    /// Advance the cooldown by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.can_fire {
            return;
        }
        self.fire_timer += dt;
        if self.data.fire_rate > 0.0 && self.fire_timer >= 1.0 / self.data.fire_rate {
            self.can_fire = true;
            self.fire_timer = 0.0;
        }
    }

    /// Lifetime a projectile needs to travel `range` at `projectile_speed`.
    pub fn projectile_lifetime(&self) -> f32 {
        if self.data.projectile_speed > 0.0 {
            self.data.range / self.data.projectile_speed
        } else {
            0.0
        }
    }

    pub fn upgrade_damage(&mut self, amount: f32) {
        self.data.damage += amount;
    }

    pub fn upgrade_fire_rate(&mut self, amount: f32) {
        self.data.fire_rate += amount;
    }

    pub fn upgrade_projectile_count(&mut self, amount: u32) {
        self.data.projectile_count += amount;
    }

    pub fn upgrade_piercing(&mut self, amount: u32) {
        self.data.piercing += amount;
    }
}

impl Component for Weapon {}

impl Update for Weapon {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.tick(ctx.dt());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- health -------------------------------------------------------------

    #[test]
    fn damage_clamps_and_reports_kill() {
        let mut hp = Health::new(10.0);
        let hit = hp.take_damage(4.0);
        assert_eq!(hit, DamageOutcome { applied: 4.0, killed: false });
        let hit = hp.take_damage(100.0);
        assert_eq!(hit.applied, 6.0);
        assert!(hit.killed);
        assert_eq!(hp.current, 0.0);
        // Already dead: nothing happens.
        assert_eq!(hp.take_damage(1.0), DamageOutcome::IGNORED);
    }

    #[test]
    fn invulnerable_ignores_damage() {
        let mut hp = Health::new(10.0);
        hp.invulnerable = true;
        assert_eq!(hp.take_damage(5.0).applied, 0.0);
        assert_eq!(hp.current, 10.0);
    }

    #[test]
    fn heal_clamps_and_skips_dead() {
        let mut hp = Health::new(10.0);
        hp.take_damage(3.0);
        assert_eq!(hp.heal(10.0), 3.0);
        assert_eq!(hp.current, 10.0);
        hp.take_damage(10.0);
        assert_eq!(hp.heal(5.0), 0.0);
        assert!(hp.is_dead());
    }

    #[test]
    fn set_max_keeps_ratio() {
        let mut hp = Health::new(100.0);
        hp.take_damage(50.0);
        hp.set_max(200.0);
        assert_eq!(hp.current, 100.0);
        assert_eq!(hp.fraction(), 0.5);
    }

    // -- projectile ---------------------------------------------------------

    #[test]
    fn single_pierce_projectile_is_spent_after_one_hit() {
        let target = EntityId::new(4, 0);
        let mut p = Projectile::new(10.0, 1, 2.0, "Player");
        assert!(p.can_hit(target));
        assert!(!p.record_hit(target));
        assert!(!p.can_hit(target));
        assert_eq!(p.target_tag(), "Enemy");
    }

    #[test]
    fn piercing_projectile_hits_distinct_targets() {
        let mut p = Projectile::new(10.0, 3, 2.0, "Enemy");
        assert!(p.record_hit(EntityId::new(1, 0)));
        assert!(p.record_hit(EntityId::new(2, 0)));
        assert!(p.can_hit(EntityId::new(3, 0)));
        assert!(!p.can_hit(EntityId::new(1, 0)));
        assert_eq!(p.target_tag(), "Player");
    }

    #[test]
    fn projectile_expires_through_update() {
        let mut manager = EntityManager::default();
        manager.register_update::<Projectile>();
        let e = manager.create_entity().unwrap();
        manager
            .add_component(e, Projectile::new(1.0, 1, 0.25, "Player"))
            .unwrap();
        manager.run_updates(0.2);
        assert!(manager.is_active(e));
        manager.run_updates(0.2);
        assert!(!manager.is_active(e));
    }

    // -- weapon -------------------------------------------------------------

    #[test]
    fn weapon_cooldown_follows_fire_rate() {
        let mut w = Weapon::new(WeaponData {
            fire_rate: 4.0,
            ..WeaponData::default()
        });
        assert!(w.try_fire());
        assert!(!w.try_fire());
        w.tick(0.2);
        assert!(!w.is_ready());
        w.tick(0.1);
        assert!(w.try_fire());
        w.reset_cooldown();
        assert!(w.is_ready());
    }

    #[test]
    fn weapon_upgrades() {
        let mut w = Weapon::new(WeaponData::default());
        w.upgrade_damage(5.0);
        w.upgrade_fire_rate(1.0);
        w.upgrade_projectile_count(2);
        w.upgrade_piercing(1);
        assert_eq!(w.data.damage, 15.0);
        assert_eq!(w.data.fire_rate, 3.0);
        assert_eq!(w.data.projectile_count, 3);
        assert_eq!(w.data.piercing, 2);
        assert_eq!(w.projectile_lifetime(), 1.5);
    }
}
