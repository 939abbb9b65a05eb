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
//! World container
//!
//! The [`World`] ties the entity registry to the physics bridge and the
//! render surface. Adding or removing an entity cascades into both, so the
//! bridge never tracks a body for an entity the registry has dropped.

use crate::config::EngineConfig;
use crate::driver::FrameTime;
use crate::ecs::components::{PointerEvent, Size};
use crate::ecs::hooks::HookPoint;
use crate::ecs::registry::EntityRegistry;
use crate::ecs::{Entity, EntityDebugInfo, EntityId};
use crate::error::SyncResult;
use crate::physics::{BodyId, PhysicsBridge};
use crate::render::{HeadlessSurface, RenderSurface, VisualHandle};

/// Entities, their simulated bodies and the surface they are drawn on
pub struct World {
    entities: EntityRegistry,
    physics: PhysicsBridge,
    surface: Box<dyn RenderSurface>,
}

impl World {
    /// Create a world over an existing bridge and surface
    pub fn new(physics: PhysicsBridge, surface: Box<dyn RenderSurface>) -> Self {
        World {
            entities: EntityRegistry::new(),
            physics,
            surface,
        }
    }

    /// World backed by the kinematic simulation and a headless surface
    pub fn headless(config: &EngineConfig) -> Self {
        let physics = PhysicsBridge::kinematic(config.physics.clone())
            .with_snapshot_pool(&config.snapshot_pool);
        let surface = HeadlessSurface::new(config.viewport.width, config.viewport.height);
        World::new(physics, Box::new(surface))
    }

    /// Add an entity and register its capabilities
    ///
    /// In order: the body is registered with the bridge, the collider joins
    /// its space, visuals enter the scene, `Load` and `Start` hooks run, and
    /// the entity is stored. An entity whose id is already present is
    /// dropped and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// `NotInitialized` if the entity carries a `PhysicsBody` and the bridge
    /// has no world yet. Nothing is registered in that case.
    pub fn add_entity(&mut self, mut entity: Entity) -> SyncResult<bool> {
        let id = entity.id();
        if self.entities.contains(id) {
            log::warn!("{} is already in the world, ignoring duplicate add", id);
            return Ok(false);
        }

        if entity.components().physics_body().is_some() {
            self.physics.add_bodies(std::slice::from_mut(&mut entity))?;
        }

        if let Some(collider) = entity.components().collider() {
            let space = collider.space().to_string();
            if self.physics.attach_to_space(&space, id) {
                log::debug!("{} joined collision space '{}'", id, space);
            }
        }

        for handle in visual_handles(&entity) {
            self.surface.add_to_scene(handle);
        }

        entity.run_hooks(HookPoint::Load, FrameTime::default());
        entity.run_hooks(HookPoint::Start, FrameTime::default());

        log::debug!("added {}", entity);
        Ok(self.entities.insert(entity).is_ok())
    }

    /// Add several entities, returning how many were new
    pub fn add_entities<I>(&mut self, entities: I) -> SyncResult<usize>
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut added = 0;
        for entity in entities {
            if self.add_entity(entity)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove an entity and everything registered for it
    ///
    /// Runs `BeforeDestroy`, takes the visuals out of the scene, unregisters
    /// the body (which also purges it from every collision space), erases
    /// the entity, then runs `Destroy`. Unknown ids return `Ok(false)`.
    pub fn remove_entity(&mut self, id: EntityId) -> SyncResult<bool> {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.run_hooks(HookPoint::BeforeDestroy, FrameTime::default());
            }
            None => return Ok(false),
        }

        let Some(mut entity) = self.entities.take(id) else {
            return Ok(false);
        };

        for handle in visual_handles(&entity) {
            self.surface.remove_from_scene(handle);
        }

        if self.physics.body_of(id).is_some() {
            self.physics.remove_bodies_by_id([id])?;
        }

        entity.run_hooks(HookPoint::Destroy, FrameTime::default());
        log::debug!("removed {}", entity);
        Ok(true)
    }

    /// Look up by id
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up by id, mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Entities with the given label
    pub fn find_by_label(&self, label: &str) -> Vec<&Entity> {
        self.entities.find_by_label(label)
    }

    /// Entities made by the given prefab
    pub fn find_by_prefab(&self, prefab: &str) -> Vec<&Entity> {
        self.entities.find_by_prefab(prefab)
    }

    /// Entity owning a simulated body
    pub fn find_by_body_id(&self, body: BodyId) -> Option<&Entity> {
        self.physics
            .entity_of(body)
            .and_then(|id| self.entities.get(id))
    }

    /// The entity registry
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The physics bridge
    pub fn physics(&self) -> &PhysicsBridge {
        &self.physics
    }

    /// The physics bridge, mutably
    pub fn physics_mut(&mut self) -> &mut PhysicsBridge {
        &mut self.physics
    }

    /// The render surface
    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }

    /// The render surface, mutably
    pub fn surface_mut(&mut self) -> &mut dyn RenderSurface {
        self.surface.as_mut()
    }

    /// The render surface as its concrete type
    pub fn surface_as<T: RenderSurface + 'static>(&self) -> Option<&T> {
        self.surface.as_any().downcast_ref::<T>()
    }

    /// Current viewport size
    pub fn viewport_size(&self) -> Size {
        self.surface.viewport_size()
    }

    /// Toggle horizontal-only physics updates for an entity
    pub fn set_lock_y(&mut self, id: EntityId, lock: bool) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.set_lock_y(lock);
                true
            }
            None => false,
        }
    }

    /// Attach an entity's body to a collision space
    pub fn attach_to_space(&mut self, name: &str, id: EntityId) -> bool {
        self.physics.attach_to_space(name, id)
    }

    /// Detach an entity's body from a collision space
    pub fn detach_from_space(&mut self, name: &str, id: EntityId) -> bool {
        self.physics.detach_from_space(name, id)
    }

    /// Deliver a pointer event to an entity's visual
    ///
    /// Returns false when the entity, its visual, or a matching callback is
    /// missing.
    pub fn dispatch_pointer(&self, id: EntityId, event: &PointerEvent) -> bool {
        self.entities
            .get(id)
            .and_then(|entity| entity.components().visual())
            .map_or(false, |visual| visual.pointer().dispatch(event))
    }

    /// Diagnostic summaries of every entity
    pub fn debug_entities(&self) -> Vec<EntityDebugInfo> {
        self.entities.iter().map(Entity::debug_info).collect()
    }

    /// Run the hooks for `point` on every entity
    pub fn run_hooks(&mut self, point: HookPoint, time: FrameTime) -> usize {
        self.entities
            .iter_mut()
            .map(|entity| entity.run_hooks(point, time))
            .sum()
    }

    /// Pull a snapshot and write poses into moving entities
    ///
    /// Entities without a tracked body, and entities whose body is static or
    /// sleeping, are left untouched. The snapshot is released before this
    /// returns. Returns the number of entities updated.
    ///
    /// # Errors
    ///
    /// `NotInitialized` if the bridge has no world.
    pub fn sync_from_physics(&mut self) -> SyncResult<usize> {
        let snapshot = self.physics.snapshot()?;
        let mut applied = 0;

        for entity in self.entities.iter_mut() {
            let id = entity.id();
            let Some(body) = self.physics.body_of(id) else {
                continue;
            };
            if self.physics.is_resting(body) {
                continue;
            }
            let Some(pose) = snapshot.get(&id) else {
                continue;
            };

            let transform = entity.apply_pose(pose);
            for handle in visual_handles(entity) {
                self.surface.set_visual_transform(handle, transform);
            }
            applied += 1;
        }

        drop(snapshot);
        log::trace!("applied {} poses", applied);
        Ok(applied)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("physics", &self.physics)
            .finish()
    }
}

fn visual_handles(entity: &Entity) -> impl Iterator<Item = VisualHandle> {
    let visual = entity.components().visual().map(|v| v.handle());
    let animation = entity.components().animation().map(|a| a.handle());
    visual.into_iter().chain(animation)
}
