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
//! Physics bridge and the simulation it drives
//!
//! The rigid-body simulation is an external collaborator reached through the
//! [`Simulation`] trait. This module owns everything between that trait and
//! the entity world:
//!
//! - [`PhysicsBridge`]: world lifecycle, entity/body bookkeeping, snapshots
//! - [`BodyMap`]: the entity-id/body-id bijection
//! - [`CollisionDispatcher`]: named collision spaces and pairwise queries
//! - [`StepRunner`]: fixed-timestep stepping
//! - [`DebugRenderer`]: optional body outlines for diagnostics
//! - [`KinematicWorld`]: a small bundled simulation backend

mod body_map;
mod bridge;
mod collision;
mod debug;
mod kinematic;
mod runner;

pub use body_map::{BodyLink, BodyMap};
pub use bridge::{PhysicsBridge, Snapshot, WorldFactory};
pub use collision::{CollisionDispatcher, CollisionPair, Detector};
pub use debug::{DebugFrame, DebugRenderer, DebugShape};
pub use kinematic::KinematicWorld;
pub use runner::StepRunner;

use crate::ecs::components::Vector2;
use std::any::Any;
use std::fmt;

/// Identifier of a body inside the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    /// Create a BodyId from a raw value
    pub fn new(id: u64) -> Self {
        BodyId(id)
    }

    /// Get the raw value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Collision shape of a body, centred on its position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle
    Rectangle {
        /// Full width
        width: f64,
        /// Full height
        height: f64,
    },
    /// Circle
    Circle {
        /// Radius
        radius: f64,
    },
}

impl Shape {
    /// Half extents of the shape's bounding box
    pub fn half_extents(&self) -> Vector2 {
        match *self {
            Shape::Rectangle { width, height } => Vector2::new(width / 2.0, height / 2.0),
            Shape::Circle { radius } => Vector2::new(radius, radius),
        }
    }
}

/// Parameters the simulation needs to create a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    /// Collision shape
    pub shape: Shape,
    /// Initial centre position
    pub position: Vector2,
    /// Initial angle in radians
    pub angle: f64,
    /// Static bodies never move
    pub is_static: bool,
    /// Multiplier applied to world gravity
    pub gravity_scale: f64,
}

impl BodyDesc {
    /// Dynamic rectangle centred at `(x, y)`
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        BodyDesc {
            shape: Shape::Rectangle { width, height },
            position: Vector2::new(x, y),
            angle: 0.0,
            is_static: false,
            gravity_scale: 1.0,
        }
    }

    /// Dynamic circle centred at `(x, y)`
    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        BodyDesc {
            shape: Shape::Circle { radius },
            position: Vector2::new(x, y),
            angle: 0.0,
            is_static: false,
            gravity_scale: 1.0,
        }
    }

    /// Mark the body static
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Override the gravity multiplier
    pub fn with_gravity_scale(mut self, scale: f64) -> Self {
        self.gravity_scale = scale;
        self
    }
}

/// Position and rotation of a body at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyPose {
    /// Centre position
    pub position: Vector2,
    /// Angle in radians
    pub rotation: f64,
}

/// One overlapping pair reported by the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRecord {
    /// First body of the pair
    pub body_a: BodyId,
    /// Second body of the pair
    pub body_b: BodyId,
    /// Penetration depth along `normal`
    pub depth: f64,
    /// Unit vector pointing from `body_a` towards `body_b`
    pub normal: Vector2,
}

/// Settings passed to the simulation when the world is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSettings {
    /// World width (usually the viewport width)
    pub width: f64,
    /// World height
    pub height: f64,
    /// Gravity in units per second squared
    pub gravity: Vector2,
    /// Squared speed under which a body counts as quiet
    pub sleep_threshold: f64,
    /// Quiet steps before a body sleeps; 0 disables sleeping
    pub sleep_after_steps: u32,
}

/// The rigid-body simulation consumed by the bridge
///
/// Implementations own body storage, integration and narrow-phase tests.
/// The bridge only ever talks to them through this trait.
pub trait Simulation: Send + Sync {
    /// Create a body that is not yet part of the world
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId;

    /// Add previously created bodies to the world
    fn add_to_world(&mut self, bodies: &[BodyId]);

    /// Remove bodies from the world and forget them
    fn remove_from_world(&mut self, bodies: &[BodyId]);

    /// Advance the simulation by `dt_ms` milliseconds
    fn step(&mut self, dt_ms: f64);

    /// Current pose of a body, `None` if unknown
    fn body_pose(&self, body: BodyId) -> Option<BodyPose>;

    /// Whether the body is static
    fn is_static(&self, body: BodyId) -> bool;

    /// Whether the body is asleep
    fn is_sleeping(&self, body: BodyId) -> bool;

    /// Overlapping pairs among exactly the given bodies
    fn pairwise_collisions(&self, bodies: &[BodyId]) -> Vec<CollisionRecord>;

    /// Outlines of every body in the world for diagnostics
    fn debug_shapes(&self) -> Vec<DebugShape> {
        Vec::new()
    }

    /// Allow downcasting to the concrete backend
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete backend
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
