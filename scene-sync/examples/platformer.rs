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
//! Headless platformer example
//!
//! Builds a floor from a geometry prefab, drops balls whose texture loads on
//! a background thread, and reports landings from the "ground" collision
//! space. Run with `RUST_LOG=debug` to see the synchronization layer's logs,
//! and point `SCENE_SYNC_CONFIG` at a TOML file to override the defaults.

use scene_sync::config::EngineConfig;
use scene_sync::driver::{FrameDriver, FrameTime};
use scene_sync::ecs::EntityId;
use scene_sync::plugins::{GameplayPlugin, PluginContext};
use scene_sync::prefab::{AsyncSpritePrefab, GeometryPrefab, Prefab, PrefabParams};
use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const FRAME_MS: f64 = 1000.0 / 60.0;
const FRAMES: u32 = 180;

// Prints a line whenever the number of entities changes
struct SceneReporter {
    last_count: usize,
}

impl GameplayPlugin for SceneReporter {
    fn name(&self) -> &str {
        "scene_reporter"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn update(&mut self, ctx: &mut PluginContext) -> Result<(), String> {
        let count = ctx.world().entity_count();
        if count != self.last_count {
            println!(
                "  [{:>6.1} ms] scene holds {} entities",
                ctx.time().total,
                count
            );
            self.last_count = count;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Scene Sync - Headless Platformer");
    println!("================================\n");

    let config = EngineConfig::from_env()?;
    let mut driver = FrameDriver::headless(&config)?;
    driver.register_plugin(Box::new(SceneReporter { last_count: 0 }))?;

    let landed: Arc<Mutex<HashSet<EntityId>>> = Arc::new(Mutex::new(HashSet::new()));
    let sink = Arc::clone(&landed);
    driver.create_collision_space("ground", move |world, pairs| {
        let mut landed = sink.lock().unwrap_or_else(|e| e.into_inner());
        for pair in pairs {
            for id in [pair.entity_a, pair.entity_b].into_iter().flatten() {
                let Some(entity) = world.entity(id) else {
                    continue;
                };
                if entity.prefab() == "ball" && landed.insert(id) {
                    println!("  {} landed at x = {:.0}", entity, entity.geometry().pos_x);
                }
            }
        }
    })?;

    driver.load()?;
    driver.start()?;

    let viewport = driver.world().viewport_size();
    let mut floors = GeometryPrefab::new("floor", viewport.width, 120.0).with_background(0x2d2d2d);
    driver.spawn(floors.generate(
        PrefabParams::at(viewport.width / 2.0, viewport.height - 60.0).in_space("ground"),
    ));

    let (loaded, loader) = crossbeam_channel::bounded(1);
    let mut balls = AsyncSpritePrefab::new("ball", "assets/ball.png", 24.0)
        .with_loader(loader)
        .with_on_load(|texture| println!("  texture '{}' loaded", texture));
    for i in 0..4 {
        let x = 200.0 + i as f64 * 200.0;
        driver.spawn(balls.generate(PrefabParams::at(x, 100.0 + i as f64 * 50.0).in_space("ground")));
    }

    let texture_thread = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        // The receiving prefab may already be gone at shutdown
        let _ = loaded.send("ball".to_string());
    });

    let mut total = 0.0;
    for _ in 0..FRAMES {
        total += FRAME_MS;
        balls.poll();
        driver.world_mut().physics_mut().advance(FRAME_MS)?;
        driver.tick(FrameTime::new(FRAME_MS, total))?;
        thread::sleep(Duration::from_millis(1));
    }

    let _ = texture_thread.join();
    driver.stop()?;

    println!("\nFinal scene:");
    for view in driver.world().debug_entities() {
        println!("  {} {:<6} at {} {:?}", view.id, view.label, view.geometry, view.components);
    }
    let landed = landed.lock().unwrap_or_else(|e| e.into_inner()).len();
    println!("\n{} of 4 balls landed", landed);

    Ok(())
}
