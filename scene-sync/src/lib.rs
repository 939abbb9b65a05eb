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
//! # Scene Sync
//!
//! Keeps the entities of a 2D game scene in step with a rigid-body physics
//! simulation and a render surface.
//!
//! ## Features
//!
//! - **Entities and Components**: labelled entities carrying at most one
//!   visual, physics body, collider, animation controller and hook set
//! - **Physics Bridge**: owns the simulation world, maps entities to bodies
//!   both ways and hands out per-tick pose snapshots
//! - **Collision Spaces**: named groups of bodies polled for overlaps on a
//!   fixed cadence
//! - **Frame Driver**: one synchronization pass per render tick
//! - **Prefabs**: synchronous and resource-gated entity templates
//! - **Parallelization**: optional Rayon snapshot extraction for large scenes
//! - **Extensibility**: gameplay plugins with dependency ordering
//!
//! ## Example
//!
//! ```rust
//! use scene_sync::config::EngineConfig;
//! use scene_sync::driver::{FrameDriver, FrameTime};
//! use scene_sync::prefab::{GeometryPrefab, Prefab, PrefabParams};
//!
//! let config = EngineConfig::default();
//! let mut driver = FrameDriver::headless(&config).unwrap();
//! driver
//!     .create_collision_space("ground", |_world, pairs| {
//!         for pair in pairs {
//!             println!("{:?} touched {:?}", pair.entity_a, pair.entity_b);
//!         }
//!     })
//!     .unwrap();
//! driver.load().unwrap();
//! driver.start().unwrap();
//!
//! let mut floors = GeometryPrefab::new("floor", 800.0, 20.0);
//! driver.spawn(floors.generate(PrefabParams::at(400.0, 900.0).in_space("ground")));
//!
//! driver.world_mut().physics_mut().advance(16.0).unwrap();
//! driver.tick(FrameTime::new(16.0, 16.0)).unwrap();
//! assert_eq!(driver.world().entity_count(), 1);
//! ```

#![warn(missing_docs)]

/// Engine configuration loaded from TOML
pub mod config;

/// Per-tick orchestration
pub mod driver;

/// Entities, components and the world that holds them
pub mod ecs;

/// Error types
pub mod error;

/// Simulation boundary: bridge, body maps, collision spaces
pub mod physics;

/// Gameplay plugin system
pub mod plugins;

/// Memory pooling for snapshot buffers
pub mod pool;

/// Entity templates
pub mod prefab;

/// Render surface boundary
pub mod render;

pub use driver::{FrameDriver, FrameTime};
pub use ecs::{Entity, EntityId, World};
pub use error::{SyncError, SyncResult};
pub use physics::PhysicsBridge;
