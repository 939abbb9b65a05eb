// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for full frame ticks
//!
//! Each iteration steps physics by one frame and runs one driver tick, so
//! pose application and collision polling are both measured.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use scene_sync::config::EngineConfig;
use scene_sync::driver::{FrameDriver, FrameTime};
use scene_sync::ecs::components::{PhysicsBody, PhysicsCollider};
use scene_sync::ecs::{Component, Entity};
use scene_sync::physics::BodyDesc;

const FRAME_MS: f64 = 1000.0 / 60.0;

fn setup_driver(n_entities: usize, collider_every: usize) -> FrameDriver {
    let mut config = EngineConfig::default();
    // Keep bodies awake for the whole run
    config.physics.sleep_after_steps = 0;

    let mut driver = FrameDriver::headless(&config).unwrap();
    driver.create_collision_space("ground", |_, _| {}).unwrap();
    driver.load().unwrap();
    driver.start().unwrap();

    let entities = (0..n_entities).map(|i| {
        let x = (i % 100) as f64 * 10.0;
        let y = (i / 100) as f64 * 10.0;
        let mut entity = Entity::new("body")
            .with_position(x, y)
            .with_component(Component::PhysicsBody(PhysicsBody::new(BodyDesc::circle(
                x, y, 4.0,
            ))));
        if i % collider_every == 0 {
            entity.attach(Component::PhysicsCollider(PhysicsCollider::new("ground")));
        }
        entity
    });
    driver.world_mut().add_entities(entities).unwrap();
    driver
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_tick");

    for n_entities in [100, 1000, 5000].iter() {
        let mut driver = setup_driver(*n_entities, 10);
        let mut total = 0.0;

        group.bench_with_input(
            BenchmarkId::new("step_and_tick", n_entities),
            n_entities,
            |b, _| {
                b.iter(|| {
                    total += FRAME_MS;
                    driver.world_mut().physics_mut().advance(FRAME_MS).unwrap();
                    driver.tick(FrameTime::new(FRAME_MS, total)).unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_tick_without_collisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_tick_sync_only");

    for n_entities in [100, 1000, 5000].iter() {
        let mut driver = setup_driver(*n_entities, usize::MAX);
        let mut total = 0.0;

        group.bench_with_input(
            BenchmarkId::new("tick", n_entities),
            n_entities,
            |b, _| {
                b.iter(|| {
                    total += FRAME_MS;
                    driver.tick(FrameTime::new(FRAME_MS, total)).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tick, bench_tick_without_collisions);
criterion_main!(benches);
