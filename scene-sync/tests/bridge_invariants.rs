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
//! Physics bridge invariants
//!
//! The entity/body maps stay a bijection, collision spaces only hold tracked
//! bodies, and snapshots cover exactly the tracked entities.

use scene_sync::config::PhysicsConfig;
use scene_sync::ecs::components::{PhysicsBody, PhysicsCollider, Vector2};
use scene_sync::ecs::{Component, Entity};
use scene_sync::physics::{BodyDesc, KinematicWorld, PhysicsBridge};
use scene_sync::SyncError;

fn bridge() -> PhysicsBridge {
    let mut bridge = PhysicsBridge::kinematic(PhysicsConfig::default());
    bridge.init(800.0, 600.0, false).unwrap();
    bridge
}

fn ball(x: f64, y: f64) -> Entity {
    Entity::new("ball").with_component(Component::PhysicsBody(PhysicsBody::new(
        BodyDesc::circle(x, y, 5.0),
    )))
}

fn assert_bijection(bridge: &PhysicsBridge) {
    for link in bridge.body_map().links() {
        assert_eq!(bridge.body_of(link.entity), Some(link.body));
        assert_eq!(bridge.entity_of(link.body), Some(link.entity));
    }
    assert_eq!(bridge.body_map().links().len(), bridge.tracked_count());
}

#[test]
fn test_bijection_through_add_and_remove() {
    let mut bridge = bridge();
    let mut entities: Vec<Entity> = (0..10).map(|i| ball(i as f64 * 20.0, 0.0)).collect();

    assert_eq!(bridge.add_bodies(&mut entities).unwrap(), 10);
    assert_bijection(&bridge);

    let removed: Vec<_> = entities.iter().step_by(2).map(Entity::id).collect();
    assert_eq!(bridge.remove_bodies_by_id(removed.clone()).unwrap(), 5);
    assert_bijection(&bridge);
    assert_eq!(bridge.tracked_count(), 5);

    for id in removed {
        assert_eq!(bridge.body_of(id), None);
    }
}

#[test]
fn test_body_ids_written_back() {
    let mut bridge = bridge();
    let mut entities = vec![
        ball(0.0, 0.0).with_component(Component::PhysicsCollider(PhysicsCollider::new("ground"))),
    ];
    bridge.add_bodies(&mut entities).unwrap();

    let body = bridge.body_of(entities[0].id()).unwrap();
    assert_eq!(entities[0].components().physics_body().unwrap().body(), Some(body));
    assert_eq!(entities[0].components().collider().unwrap().body(), Some(body));

    let world = bridge
        .simulation()
        .unwrap()
        .as_any()
        .downcast_ref::<KinematicWorld>()
        .unwrap();
    assert!(world.in_world(body));
}

#[test]
fn test_re_adding_is_a_no_op() {
    let mut bridge = bridge();
    let mut entities = vec![ball(0.0, 0.0)];

    bridge.add_bodies(&mut entities).unwrap();
    let body = bridge.body_of(entities[0].id());
    assert_eq!(bridge.add_bodies(&mut entities).unwrap(), 0);
    assert_eq!(bridge.body_of(entities[0].id()), body);
    assert_eq!(bridge.tracked_count(), 1);
}

#[test]
fn test_add_after_remove_creates_fresh_body() {
    let mut bridge = bridge();
    bridge.create_space("ground").unwrap();
    let mut entities = vec![
        ball(0.0, 0.0).with_component(Component::PhysicsCollider(PhysicsCollider::new("ground"))),
    ];
    let id = entities[0].id();

    bridge.add_bodies(&mut entities).unwrap();
    let first = bridge.body_of(id).unwrap();
    assert_eq!(bridge.remove_bodies(&entities).unwrap(), 1);

    assert_eq!(bridge.add_bodies(&mut entities).unwrap(), 1);
    let second = bridge.body_of(id).unwrap();
    assert_ne!(first, second);
    assert_bijection(&bridge);

    assert_eq!(entities[0].components().physics_body().unwrap().body(), Some(second));
    assert_eq!(entities[0].components().collider().unwrap().body(), Some(second));
    assert!(bridge.attach_to_space("ground", id));

    let world = bridge
        .simulation()
        .unwrap()
        .as_any()
        .downcast_ref::<KinematicWorld>()
        .unwrap();
    assert!(world.in_world(second));

    let snapshot = bridge.snapshot().unwrap();
    assert_eq!(snapshot.len(), bridge.tracked_count());
    assert!(snapshot.contains_key(&id));
}

#[test]
fn test_readded_entity_keeps_moving() {
    let mut bridge = bridge();
    let mut entities = vec![ball(0.0, 0.0)];
    let id = entities[0].id();

    bridge.add_bodies(&mut entities).unwrap();
    bridge.remove_bodies(&entities).unwrap();
    bridge.add_bodies(&mut entities).unwrap();

    let before = bridge.snapshot().unwrap()[&id];
    bridge.advance(100.0).unwrap();
    let after = bridge.snapshot().unwrap()[&id];
    assert!(after.position.y > before.position.y);
}

#[test]
fn test_removing_unknown_entities_is_a_no_op() {
    let mut bridge = bridge();
    let stranger = ball(0.0, 0.0);
    assert_eq!(bridge.remove_bodies(&[stranger]).unwrap(), 0);
}

#[test]
fn test_removal_purges_every_space() {
    let mut bridge = bridge();
    bridge.create_space("ground").unwrap();
    bridge.create_space("hazards").unwrap();

    let mut entities = vec![ball(0.0, 0.0), ball(100.0, 0.0)];
    bridge.add_bodies(&mut entities).unwrap();
    let (first, second) = (entities[0].id(), entities[1].id());

    assert!(bridge.attach_to_space("ground", first));
    assert!(bridge.attach_to_space("hazards", first));
    assert!(bridge.attach_to_space("ground", second));

    bridge.remove_bodies(&entities[..1]).unwrap();

    for name in bridge.space_names() {
        let space = bridge.find_space(&name).unwrap();
        for body in space.bodies() {
            assert!(bridge.entity_of(*body).is_some(), "stale body in '{}'", name);
        }
    }
    assert_eq!(bridge.find_space("ground").unwrap().len(), 1);
    assert!(bridge.find_space("hazards").unwrap().is_empty());
}

#[test]
fn test_detach_absent_member_is_a_no_op() {
    let mut bridge = bridge();
    bridge.create_space("ground").unwrap();

    let mut entities = vec![ball(0.0, 0.0), ball(10.0, 0.0)];
    bridge.add_bodies(&mut entities).unwrap();
    bridge.attach_to_space("ground", entities[0].id());

    assert!(!bridge.detach_from_space("ground", entities[1].id()));
    assert!(!bridge.detach_from_space("missing", entities[0].id()));
    assert_eq!(bridge.find_space("ground").unwrap().len(), 1);

    assert!(bridge.detach_from_space("ground", entities[0].id()));
    assert!(bridge.find_space("ground").unwrap().is_empty());
}

#[test]
fn test_duplicate_space_rejected() {
    let mut bridge = bridge();
    bridge.create_space("ground").unwrap();
    assert!(matches!(
        bridge.create_space("ground"),
        Err(SyncError::DuplicateSpace(name)) if name == "ground"
    ));
}

#[test]
fn test_snapshot_covers_tracked_entities() {
    let mut bridge = bridge();
    let mut entities: Vec<Entity> = (0..700).map(|i| ball(i as f64, 2.0 * i as f64)).collect();
    bridge.add_bodies(&mut entities).unwrap();

    let snapshot = bridge.snapshot().unwrap();
    assert_eq!(snapshot.len(), 700);
    for (i, entity) in entities.iter().enumerate() {
        let pose = snapshot[&entity.id()];
        assert_eq!(pose.position, Vector2::new(i as f64, 2.0 * i as f64));
    }
}

#[test]
fn test_snapshot_is_fresh_each_time() {
    let mut bridge = bridge();
    let mut entities = vec![ball(0.0, 0.0)];
    bridge.add_bodies(&mut entities).unwrap();

    let before = bridge.snapshot().unwrap()[&entities[0].id()];
    bridge.advance(100.0).unwrap();
    let after = bridge.snapshot().unwrap()[&entities[0].id()];

    assert!(after.position.y > before.position.y);
}

#[test]
fn test_operations_before_init_fail() {
    let mut bridge = PhysicsBridge::kinematic(PhysicsConfig::default());
    let mut entities = vec![ball(0.0, 0.0)];

    assert!(matches!(
        bridge.add_bodies(&mut entities),
        Err(SyncError::NotInitialized { .. })
    ));
    assert!(matches!(
        bridge.snapshot(),
        Err(SyncError::NotInitialized { .. })
    ));
    assert!(matches!(
        bridge.advance(16.0),
        Err(SyncError::NotInitialized { .. })
    ));
    assert_eq!(bridge.tracked_count(), 0);
}

#[test]
fn test_second_init_fails() {
    let mut bridge = bridge();
    assert!(matches!(
        bridge.init(800.0, 600.0, false),
        Err(SyncError::AlreadyInitialized)
    ));
}
