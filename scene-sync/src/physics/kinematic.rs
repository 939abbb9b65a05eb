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
//! Minimal bundled simulation backend
//!
//! `KinematicWorld` integrates velocities under gravity and answers overlap
//! queries. It performs no contact resolution: overlapping bodies pass
//! through each other and are only reported. That is enough for headless
//! hosts, tests and tools; games wanting real response plug in their own
//! [`Simulation`].
//!
//! # Algorithm
//!
//! Semi-implicit Euler per step, with `dt` in seconds:
//!
//! ```text
//! v(t + dt) = v(t) + g * gravity_scale * dt
//! x(t + dt) = x(t) + v(t + dt) * dt
//! ```
//!
//! Shapes are treated as axis-aligned for overlap tests; rotation is
//! tracked for presentation only.

use crate::ecs::components::Vector2;
use crate::physics::{
    BodyDesc, BodyId, BodyPose, CollisionRecord, DebugShape, Shape, Simulation, WorldSettings,
};
use std::any::Any;
use std::collections::HashMap;

const EPSILON: f64 = 1e-12;

/// Body state inside a [`KinematicWorld`]
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBody {
    /// Collision shape
    pub shape: Shape,
    /// Centre position
    pub position: Vector2,
    /// Angle in radians
    pub angle: f64,
    /// Linear velocity in units per second
    pub velocity: Vector2,
    /// Angular velocity in radians per second
    pub angular_velocity: f64,
    /// Static bodies are never integrated
    pub is_static: bool,
    /// Multiplier applied to world gravity
    pub gravity_scale: f64,
    /// Sleeping bodies are skipped until woken
    pub sleeping: bool,
    quiet_steps: u32,
    in_world: bool,
}

impl KinematicBody {
    fn from_desc(desc: &BodyDesc) -> Self {
        KinematicBody {
            shape: desc.shape,
            position: desc.position,
            angle: desc.angle,
            velocity: Vector2::zero(),
            angular_velocity: 0.0,
            is_static: desc.is_static,
            gravity_scale: desc.gravity_scale,
            sleeping: false,
            quiet_steps: 0,
            in_world: false,
        }
    }

    fn is_resting(&self) -> bool {
        self.is_static || self.sleeping
    }

    fn wake(&mut self) {
        self.sleeping = false;
        self.quiet_steps = 0;
    }
}

/// In-memory rigid-body world without contact response
pub struct KinematicWorld {
    settings: WorldSettings,
    bodies: HashMap<BodyId, KinematicBody>,
    members: Vec<BodyId>,
    next_id: u64,
}

impl KinematicWorld {
    /// Create an empty world
    pub fn new(settings: WorldSettings) -> Self {
        KinematicWorld {
            settings,
            bodies: HashMap::new(),
            members: Vec::new(),
            next_id: 1,
        }
    }

    /// World settings
    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Look up a body, whether or not it is in the world
    pub fn body(&self, id: BodyId) -> Option<&KinematicBody> {
        self.bodies.get(&id)
    }

    /// Number of bodies currently in the world
    pub fn world_len(&self) -> usize {
        self.members.len()
    }

    /// Check whether a body is in the world
    pub fn in_world(&self, id: BodyId) -> bool {
        self.bodies.get(&id).map(|b| b.in_world).unwrap_or(false)
    }

    /// Set linear velocity, waking the body
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vector2) -> bool {
        self.with_body(id, |body| {
            body.velocity = velocity;
            body.wake();
        })
    }

    /// Set angular velocity, waking the body
    pub fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f64) -> bool {
        self.with_body(id, |body| {
            body.angular_velocity = angular_velocity;
            body.wake();
        })
    }

    /// Teleport a body
    pub fn set_position(&mut self, id: BodyId, position: Vector2) -> bool {
        self.with_body(id, |body| body.position = position)
    }

    /// Force a body asleep or awake
    pub fn set_sleeping(&mut self, id: BodyId, sleeping: bool) -> bool {
        self.with_body(id, |body| {
            if sleeping {
                body.sleeping = true;
                body.velocity = Vector2::zero();
                body.angular_velocity = 0.0;
            } else {
                body.wake();
            }
        })
    }

    /// Toggle the static flag
    pub fn set_static(&mut self, id: BodyId, is_static: bool) -> bool {
        self.with_body(id, |body| body.is_static = is_static)
    }

    fn with_body(&mut self, id: BodyId, f: impl FnOnce(&mut KinematicBody)) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                f(body);
                true
            }
            None => false,
        }
    }

    fn integrate(&mut self, dt: f64) {
        let gravity = self.settings.gravity;
        let threshold = self.settings.sleep_threshold;
        let sleep_after = self.settings.sleep_after_steps;

        for id in &self.members {
            let body = match self.bodies.get_mut(id) {
                Some(b) => b,
                None => continue,
            };
            if body.is_resting() {
                continue;
            }

            body.velocity = body.velocity + gravity * (body.gravity_scale * dt);
            body.position = body.position + body.velocity * dt;
            body.angle += body.angular_velocity * dt;

            if sleep_after == 0 {
                continue;
            }
            let motion = body.velocity.length_squared()
                + body.angular_velocity * body.angular_velocity;
            if motion < threshold {
                body.quiet_steps += 1;
                if body.quiet_steps >= sleep_after {
                    body.sleeping = true;
                    body.velocity = Vector2::zero();
                    body.angular_velocity = 0.0;
                }
            } else {
                body.quiet_steps = 0;
            }
        }
    }
}

impl Simulation for KinematicWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId {
        let id = BodyId::new(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, KinematicBody::from_desc(desc));
        id
    }

    fn add_to_world(&mut self, bodies: &[BodyId]) {
        for &id in bodies {
            if let Some(body) = self.bodies.get_mut(&id) {
                if !body.in_world {
                    body.in_world = true;
                    self.members.push(id);
                }
            }
        }
    }

    fn remove_from_world(&mut self, bodies: &[BodyId]) {
        for id in bodies {
            if self.bodies.remove(id).is_some() {
                self.members.retain(|member| member != id);
            }
        }
    }

    fn step(&mut self, dt_ms: f64) {
        if dt_ms > 0.0 && dt_ms.is_finite() {
            self.integrate(dt_ms / 1000.0);
        }
    }

    fn body_pose(&self, body: BodyId) -> Option<BodyPose> {
        self.bodies.get(&body).map(|b| BodyPose {
            position: b.position,
            rotation: b.angle,
        })
    }

    fn is_static(&self, body: BodyId) -> bool {
        self.bodies.get(&body).map(|b| b.is_static).unwrap_or(false)
    }

    fn is_sleeping(&self, body: BodyId) -> bool {
        self.bodies.get(&body).map(|b| b.sleeping).unwrap_or(false)
    }

    fn pairwise_collisions(&self, bodies: &[BodyId]) -> Vec<CollisionRecord> {
        let mut records = Vec::new();

        for (i, &id_a) in bodies.iter().enumerate() {
            let a = match self.bodies.get(&id_a) {
                Some(b) if b.in_world => b,
                _ => continue,
            };
            for &id_b in &bodies[i + 1..] {
                let b = match self.bodies.get(&id_b) {
                    Some(b) if b.in_world => b,
                    _ => continue,
                };
                // Two resting bodies cannot start touching
                if a.is_resting() && b.is_resting() {
                    continue;
                }
                if let Some((depth, normal)) = overlap(a, b) {
                    records.push(CollisionRecord {
                        body_a: id_a,
                        body_b: id_b,
                        depth,
                        normal,
                    });
                }
            }
        }

        records
    }

    fn debug_shapes(&self) -> Vec<DebugShape> {
        self.members
            .iter()
            .filter_map(|&id| {
                self.bodies.get(&id).map(|b| DebugShape {
                    body: id,
                    shape: b.shape,
                    position: b.position,
                    angle: b.angle,
                    is_static: b.is_static,
                    is_sleeping: b.sleeping,
                })
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Penetration depth and a→b normal, if the bodies overlap
fn overlap(a: &KinematicBody, b: &KinematicBody) -> Option<(f64, Vector2)> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let delta = b.position - a.position;
            let dist_sq = delta.length_squared();
            let reach = ra + rb;
            if dist_sq >= reach * reach {
                return None;
            }
            let dist = dist_sq.sqrt();
            let normal = if dist > EPSILON {
                delta * (1.0 / dist)
            } else {
                Vector2::new(1.0, 0.0)
            };
            Some((reach - dist, normal))
        }
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
            let (ha, hb) = (a.shape.half_extents(), b.shape.half_extents());
            let delta = b.position - a.position;
            let px = ha.x + hb.x - delta.x.abs();
            let py = ha.y + hb.y - delta.y.abs();
            if px <= 0.0 || py <= 0.0 {
                return None;
            }
            if px < py {
                Some((px, Vector2::new(sign(delta.x), 0.0)))
            } else {
                Some((py, Vector2::new(0.0, sign(delta.y))))
            }
        }
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
            circle_rect(a.position, radius, b.position, b.shape.half_extents())
        }
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => {
            circle_rect(b.position, radius, a.position, a.shape.half_extents())
                .map(|(depth, normal)| (depth, -normal))
        }
    }
}

/// Circle/box test; the normal points from the circle towards the box
fn circle_rect(center: Vector2, radius: f64, rect: Vector2, half: Vector2) -> Option<(f64, Vector2)> {
    let closest = Vector2::new(
        center.x.clamp(rect.x - half.x, rect.x + half.x),
        center.y.clamp(rect.y - half.y, rect.y + half.y),
    );
    let delta = closest - center;
    let dist_sq = delta.length_squared();

    if dist_sq > EPSILON {
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        return Some((radius - dist, delta * (1.0 / dist)));
    }

    // Centre inside the box: push out along the shallower axis
    let offset = center - rect;
    let px = half.x - offset.x.abs() + radius;
    let py = half.y - offset.y.abs() + radius;
    if px < py {
        Some((px, Vector2::new(-sign(offset.x), 0.0)))
    } else {
        Some((py, Vector2::new(0.0, -sign(offset.y))))
    }
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}
