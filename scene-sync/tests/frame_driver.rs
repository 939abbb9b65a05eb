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
//! Frame driver behaviour across ticks
//!
//! Pose application, static and sleeping skips, the lock-Y flag, removal
//! cascades and the stopped state.

use scene_sync::config::EngineConfig;
use scene_sync::driver::{DriverState, FrameDriver, FrameTime, TickOutcome};
use scene_sync::ecs::components::{PhysicsBody, PhysicsCollider, Vector2, Visual};
use scene_sync::ecs::{Component, Entity, EntityId};
use scene_sync::physics::{BodyDesc, KinematicWorld};
use scene_sync::plugins::FnPlugin;
use scene_sync::render::HeadlessSurface;
use std::sync::{Arc, Mutex};

fn running() -> FrameDriver {
    let mut driver = FrameDriver::headless(&EngineConfig::default()).unwrap();
    driver.load().unwrap();
    driver.start().unwrap();
    driver
}

fn body(desc: BodyDesc) -> Component {
    Component::PhysicsBody(PhysicsBody::new(desc))
}

fn kinematic(driver: &mut FrameDriver) -> &mut KinematicWorld {
    driver
        .world_mut()
        .physics_mut()
        .simulation_mut()
        .unwrap()
        .as_any_mut()
        .downcast_mut::<KinematicWorld>()
        .unwrap()
}

fn step_and_tick(driver: &mut FrameDriver, total: f64) -> TickOutcome {
    driver.world_mut().physics_mut().advance(50.0).unwrap();
    driver.tick(FrameTime::new(50.0, total)).unwrap()
}

#[test]
fn test_dynamic_entities_follow_their_bodies() {
    let mut driver = running();
    let ball = Entity::new("ball")
        .with_position(100.0, 100.0)
        .with_component(body(BodyDesc::circle(100.0, 100.0, 10.0)))
        .with_component(Component::Visual(Visual::graphic(
            scene_sync::ecs::components::GraphicShape::Circle(10.0),
            0xffffff,
        )));
    let id = ball.id();
    let handle = ball.components().visual().unwrap().handle();
    driver.world_mut().add_entity(ball).unwrap();

    let outcome = step_and_tick(&mut driver, 50.0);
    assert!(matches!(outcome, TickOutcome::Ran(report) if report.applied == 1));

    let entity = driver.world().entity(id).unwrap();
    assert!(entity.geometry().pos_y > 100.0);
    assert_eq!(entity.geometry().pos_x, 100.0);

    let surface = driver.world().surface_as::<HeadlessSurface>().unwrap();
    let transform = surface.transform_of(handle).unwrap();
    assert_eq!(transform.y, entity.geometry().pos_y);
}

#[test]
fn test_static_entities_never_move() {
    let mut driver = running();
    let floor = Entity::new("floor")
        .with_position(0.0, 500.0)
        .with_component(body(
            BodyDesc::rectangle(0.0, 500.0, 800.0, 20.0).with_static(true),
        ));
    let id = floor.id();
    driver.world_mut().add_entity(floor).unwrap();

    let body_id = driver.world().physics().body_of(id).unwrap();
    kinematic(&mut driver).set_position(body_id, Vector2::new(40.0, 40.0));

    let outcome = step_and_tick(&mut driver, 50.0);
    assert!(matches!(outcome, TickOutcome::Ran(report) if report.applied == 0));
    assert_eq!(driver.world().entity(id).unwrap().geometry().pos_y, 500.0);
}

#[test]
fn test_sleeping_entities_keep_scripted_pose() {
    let mut driver = running();
    let crate_entity = Entity::new("crate")
        .with_position(10.0, 10.0)
        .with_component(body(BodyDesc::rectangle(10.0, 10.0, 5.0, 5.0)));
    let id = crate_entity.id();
    driver.world_mut().add_entity(crate_entity).unwrap();

    let body_id = driver.world().physics().body_of(id).unwrap();
    kinematic(&mut driver).set_sleeping(body_id, true);
    driver.world_mut().entity_mut(id).unwrap().set_position(70.0, 80.0);

    step_and_tick(&mut driver, 50.0);
    let geometry = driver.world().entity(id).unwrap().geometry();
    assert_eq!((geometry.pos_x, geometry.pos_y), (70.0, 80.0));

    kinematic(&mut driver).set_sleeping(body_id, false);
    step_and_tick(&mut driver, 100.0);
    assert_ne!(driver.world().entity(id).unwrap().geometry().pos_y, 80.0);
}

#[test]
fn test_lock_y_only_moves_horizontally() {
    let mut driver = running();
    let runner = Entity::new("runner")
        .with_position(0.0, 300.0)
        .with_component(body(BodyDesc::circle(0.0, 300.0, 8.0)));
    let id = runner.id();
    driver.world_mut().add_entity(runner).unwrap();
    assert!(driver.world_mut().set_lock_y(id, true));

    let body_id = driver.world().physics().body_of(id).unwrap();
    kinematic(&mut driver).set_velocity(body_id, Vector2::new(200.0, 0.0));

    step_and_tick(&mut driver, 50.0);
    let geometry = driver.world().entity(id).unwrap().geometry();
    assert!(geometry.pos_x > 0.0);
    assert_eq!(geometry.pos_y, 300.0);
}

#[test]
fn test_removed_entities_leave_every_structure() {
    let reported: Arc<Mutex<Vec<Option<EntityId>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);

    let mut driver = FrameDriver::headless(&EngineConfig::default()).unwrap();
    driver
        .create_collision_space("ground", move |_, pairs| {
            let mut sink = sink.lock().unwrap();
            for pair in pairs {
                sink.push(pair.entity_a);
                sink.push(pair.entity_b);
            }
        })
        .unwrap();
    driver.load().unwrap();
    driver.start().unwrap();

    let a = Entity::new("a")
        .with_component(body(BodyDesc::circle(0.0, 0.0, 10.0).with_static(true)))
        .with_component(Component::PhysicsCollider(PhysicsCollider::new("ground")));
    let b = Entity::new("b")
        .with_component(body(BodyDesc::circle(5.0, 0.0, 10.0).with_static(true)))
        .with_component(Component::PhysicsCollider(PhysicsCollider::new("ground")));
    let (a_id, b_id) = (a.id(), b.id());
    driver.world_mut().add_entity(a).unwrap();
    driver.world_mut().add_entity(b).unwrap();

    driver.tick(FrameTime::new(60.0, 60.0)).unwrap();
    assert_eq!(reported.lock().unwrap().len(), 2);

    assert!(driver.world_mut().remove_entity(a_id).unwrap());
    assert!(!driver.world_mut().remove_entity(a_id).unwrap());
    assert_eq!(driver.world().physics().body_of(a_id), None);
    assert_eq!(driver.world().physics().find_space("ground").unwrap().len(), 1);

    reported.lock().unwrap().clear();
    driver.tick(FrameTime::new(60.0, 120.0)).unwrap();
    assert!(reported.lock().unwrap().is_empty());
    assert!(driver.world().entity(b_id).is_some());
}

#[test]
fn test_plugins_see_the_world_each_tick() {
    let counts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&counts);

    let mut driver = FrameDriver::headless(&EngineConfig::default()).unwrap();
    driver
        .register_plugin(Box::new(FnPlugin::new("spawner", move |ctx| {
            let world = ctx.world_mut();
            world
                .add_entity(Entity::new("spark"))
                .map_err(|e| e.to_string())?;
            sink.lock().unwrap().push(world.find_by_label("spark").len());
            Ok(())
        })))
        .unwrap();
    driver.load().unwrap();
    driver.start().unwrap();

    for tick in 1..=3 {
        driver.tick(FrameTime::new(16.0, tick as f64 * 16.0)).unwrap();
    }
    assert_eq!(*counts.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_failing_plugin_surfaces_error() {
    let mut driver = FrameDriver::headless(&EngineConfig::default()).unwrap();
    driver
        .register_plugin(Box::new(FnPlugin::new("broken", |_| {
            Err("out of cheese".to_string())
        })))
        .unwrap();
    driver.load().unwrap();
    driver.start().unwrap();

    let err = driver.tick(FrameTime::new(16.0, 16.0)).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_no_snapshots_after_stop() {
    let mut driver = running();
    let ball = Entity::new("ball")
        .with_position(0.0, 0.0)
        .with_component(body(BodyDesc::circle(0.0, 0.0, 4.0)));
    let id = ball.id();
    driver.world_mut().add_entity(ball).unwrap();

    step_and_tick(&mut driver, 50.0);
    let before = driver.world().entity(id).unwrap().geometry().pos_y;

    driver.stop().unwrap();
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(step_and_tick(&mut driver, 100.0), TickOutcome::Idle);
    assert_eq!(driver.world().entity(id).unwrap().geometry().pos_y, before);
}

#[test]
fn test_debug_signal_receives_total_time() {
    let mut driver = running();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    driver.set_debug_signal(move |total| sink.lock().unwrap().push(total));

    driver.tick(FrameTime::new(16.0, 16.0)).unwrap();
    driver.tick(FrameTime::new(17.0, 33.0)).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![16.0, 33.0]);
}
