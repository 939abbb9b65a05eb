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
//! Entity management
//!
//! An entity is an identity plus geometry, a size and a table of attached
//! components. Identity is assigned once at construction and never changes.

use crate::driver::FrameTime;
use crate::ecs::component::{Component, ComponentKind, ComponentTable};
use crate::ecs::components::{Size, Transform2D};
use crate::ecs::hooks::{HookEvent, HookPoint};
use crate::physics::BodyPose;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Create a new EntityId from a raw u64 value
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    /// Allocate an id that no other call in this process returns
    pub fn next() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Position, rotation and scale of an entity
///
/// `rot_x` holds the in-plane rotation written by physics. `rot_y` is
/// presentation-only skew that physics never touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Horizontal position
    pub pos_x: f64,
    /// Vertical position
    pub pos_y: f64,
    /// Rotation in radians
    pub rot_x: f64,
    /// Skew in radians
    pub rot_y: f64,
    /// Horizontal scale
    pub scale_x: f64,
    /// Vertical scale
    pub scale_y: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            pos_x: 0.0,
            pos_y: 0.0,
            rot_x: 0.0,
            rot_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Summary of an entity for diagnostic overlays and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDebugInfo {
    /// Entity id
    pub id: EntityId,
    /// Entity label
    pub label: String,
    /// Position formatted as `"x, y"`
    pub geometry: String,
    /// Labels of attached components
    pub components: Vec<&'static str>,
}

/// A game object
///
/// # Examples
///
/// ```
/// use scene_sync::ecs::Entity;
///
/// let mut player = Entity::new("player").with_position(10.0, 20.0);
/// player.set_lock_y(true);
/// assert_eq!(player.debug_info().geometry, "10, 20");
/// ```
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    label: String,
    prefab: String,
    geometry: Geometry,
    size: Size,
    components: ComponentTable,
    lock_y: bool,
}

impl Entity {
    /// Create an entity with a fresh id
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_id(EntityId::next(), label)
    }

    /// Create an entity with an explicit id
    pub fn with_id(id: EntityId, label: impl Into<String>) -> Self {
        Entity {
            id,
            label: label.into(),
            prefab: String::new(),
            geometry: Geometry::default(),
            size: Size::default(),
            components: ComponentTable::new(),
            lock_y: false,
        }
    }

    /// Tag the entity with the prefab (group) that made it
    pub fn with_prefab(mut self, prefab: impl Into<String>) -> Self {
        self.prefab = prefab.into();
        self
    }

    /// Set the initial position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.set_position(x, y);
        self
    }

    /// Set the size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    /// Attach a component
    pub fn with_component(mut self, component: Component) -> Self {
        self.attach(component);
        self
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Prefab tag, empty for hand-built entities
    pub fn prefab(&self) -> &str {
        &self.prefab
    }

    /// Current geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Mutable geometry
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// Move the entity
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.geometry.pos_x = x;
        self.geometry.pos_y = y;
    }

    /// Size
    pub fn size(&self) -> Size {
        self.size
    }

    /// Attached components
    pub fn components(&self) -> &ComponentTable {
        &self.components
    }

    /// Attached components, mutably
    pub fn components_mut(&mut self) -> &mut ComponentTable {
        &mut self.components
    }

    /// Attach a component, returning the one of the same kind it replaced
    pub fn attach(&mut self, component: Component) -> Option<Component> {
        let replaced = self.components.insert(component);
        if let Some(old) = &replaced {
            log::debug!("{} replaced its {} component", self.id, old.kind().label());
        }
        replaced
    }

    /// Detach the component of a kind
    pub fn detach(&mut self, kind: ComponentKind) -> Option<Component> {
        self.components.remove(kind)
    }

    /// Whether a component of `kind` is attached
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains(kind)
    }

    /// Whether physics may only move the entity horizontally
    pub fn lock_y(&self) -> bool {
        self.lock_y
    }

    /// Restrict physics updates to the horizontal axis
    pub fn set_lock_y(&mut self, lock: bool) {
        self.lock_y = lock;
    }

    /// Geometry as a render transform
    pub fn transform(&self) -> Transform2D {
        Transform2D {
            x: self.geometry.pos_x,
            y: self.geometry.pos_y,
            rotation: self.geometry.rot_x,
            scale_x: self.geometry.scale_x,
            scale_y: self.geometry.scale_y,
        }
    }

    /// Write a body pose into the geometry and the presentation components
    ///
    /// With `lock_y` set only `pos_x` changes. Returns the transform pushed
    /// to the visual and animation components.
    pub fn apply_pose(&mut self, pose: &BodyPose) -> Transform2D {
        self.geometry.pos_x = pose.position.x;
        if !self.lock_y {
            self.geometry.pos_y = pose.position.y;
            self.geometry.rot_x = pose.rotation;
        }

        let transform = self.transform();
        if let Some(visual) = self.components.visual_mut() {
            visual.set_transform(transform);
        }
        if let Some(animation) = self.components.animation_mut() {
            animation.set_transform(transform);
        }
        transform
    }

    /// Run this entity's hooks for `point`
    ///
    /// The hook list is taken out of the table while it runs so hooks can
    /// borrow the entity mutably. A `ScriptHooks` attached by a hook during
    /// the run replaces the running list.
    pub fn run_hooks(&mut self, point: HookPoint, time: FrameTime) -> usize {
        let mut hooks = match self.components.remove(ComponentKind::ScriptHooks) {
            Some(Component::ScriptHooks(hooks)) => hooks,
            Some(other) => {
                self.components.insert(other);
                return 0;
            }
            None => return 0,
        };

        let event = HookEvent {
            entity: self.id,
            point,
            time,
        };
        let ran = hooks.run(self, &event);

        if !self.components.contains(ComponentKind::ScriptHooks) {
            self.components.insert(Component::ScriptHooks(hooks));
        }
        ran
    }

    /// Diagnostic summary
    pub fn debug_info(&self) -> EntityDebugInfo {
        EntityDebugInfo {
            id: self.id,
            label: self.label.clone(),
            geometry: format!("{}, {}", self.geometry.pos_x, self.geometry.pos_y),
            components: self.components.kinds().map(ComponentKind::label).collect(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.id, self.label)
    }
}
