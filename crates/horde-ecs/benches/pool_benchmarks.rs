//! Entity pool churn and component query throughput.
//!
//! Run with: `cargo bench --bench pool_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use horde_ecs::prelude::*;

// ---------------------------------------------------------------------------
// Benchmark component types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}
impl Component for Velocity {}
impl Update for Velocity {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let (dx, dy, dt) = (self.dx, self.dy, ctx.dt());
        if let Some(p) = ctx.get_mut::<Position>() {
            p.x += dx * dt;
            p.y += dy * dt;
        }
    }
}

fn populated(count: usize) -> EntityManager {
    let mut manager = EntityManager::new(PoolConfig {
        max_entities: count,
        ..PoolConfig::default()
    });
    manager.register::<Position>();
    manager.register_update::<Velocity>();
    for i in 0..count {
        let id = manager.create_entity().unwrap();
        manager.set_tag(id, if i % 2 == 0 { "Enemy" } else { "Gem" }).unwrap();
        manager.add_component(id, Position { x: i as f32, y: 0.0 }).unwrap();
        if i % 3 == 0 {
            manager.add_component(id, Velocity { dx: 1.0, dy: 1.0 }).unwrap();
        }
    }
    manager.maintain(0.0);
    manager
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_churn_at_cap(c: &mut Criterion) {
    c.bench_function("churn_at_cap_500", |b| {
        let mut manager = populated(500);
        let mut live = manager.active_entities();
        let mut cursor = 0;
        b.iter(|| {
            // Destroy one, reuse its slot at the cap.
            let victim = live[cursor % live.len()];
            manager.destroy_entity(victim);
            let fresh = manager.create_entity().unwrap();
            manager.add_component(fresh, Position { x: 0.0, y: 0.0 }).unwrap();
            live[cursor % live.len()] = fresh;
            cursor += 1;
            black_box(fresh);
        });
    });
}

fn bench_queries(c: &mut Criterion) {
    let manager = populated(500);
    c.bench_function("entities_with_500", |b| {
        b.iter(|| black_box(manager.entities_with::<(Position, Velocity)>().len()));
    });
    c.bench_function("entities_by_tag_500", |b| {
        b.iter(|| black_box(manager.entities_by_tag("Enemy").count()));
    });
}

fn bench_update_hooks(c: &mut Criterion) {
    let mut manager = populated(500);
    c.bench_function("run_updates_500", |b| {
        b.iter(|| manager.run_updates(1.0 / 60.0));
    });
}

criterion_group!(benches, bench_churn_at_cap, bench_queries, bench_update_hooks);
criterion_main!(benches);
