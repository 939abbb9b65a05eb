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
//! Entity Component System
//!
//! Entities carry a fixed table of optional capabilities instead of a
//! string-keyed component list:
//! - [`Entity`]: identity, geometry, size, and a [`ComponentTable`]
//! - [`Component`]: one of Visual, PhysicsBody, PhysicsCollider,
//!   AnimationController, ScriptHooks
//! - [`EntityRegistry`]: dense storage with O(1) id lookup
//! - [`World`]: registry plus physics bridge plus render surface, with
//!   add/remove cascading into both

pub mod component;
pub mod components;
pub mod entity;
pub mod hooks;
pub mod registry;
pub mod world;

pub use component::{Component, ComponentKind, ComponentTable};
pub use entity::{Entity, EntityDebugInfo, EntityId, Geometry};
pub use hooks::{Hook, HookEvent, HookPoint, ScriptHooks};
pub use registry::EntityRegistry;
pub use world::World;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_world_creation() {
        let world = World::headless(&EngineConfig::default());
        assert_eq!(world.entity_count(), 0);
        assert!(!world.physics().is_initialized());
    }
}
