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
//! Component variants and per-entity storage
//!
//! A [`Component`] is one of five capabilities. Each entity stores them in a
//! [`ComponentTable`], one slot per [`ComponentKind`], so lookup is an array
//! index and an entity can never hold two components of the same kind.

use crate::ecs::components::{AnimationController, PhysicsBody, PhysicsCollider, Visual};
use crate::ecs::hooks::ScriptHooks;

/// Discriminant of a [`Component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// Sprite or graphic on the render surface
    Visual,
    /// Simulated rigid body
    PhysicsBody,
    /// Membership in a collision space
    PhysicsCollider,
    /// Animation playback
    AnimationController,
    /// Lifecycle scripts
    ScriptHooks,
}

impl ComponentKind {
    /// Number of kinds
    pub const COUNT: usize = 5;

    /// Every kind in slot order
    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Visual,
        ComponentKind::PhysicsBody,
        ComponentKind::PhysicsCollider,
        ComponentKind::AnimationController,
        ComponentKind::ScriptHooks,
    ];

    /// Short label used in debug views
    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::Visual => "visual",
            ComponentKind::PhysicsBody => "physics2d",
            ComponentKind::PhysicsCollider => "2dCollider",
            ComponentKind::AnimationController => "animation",
            ComponentKind::ScriptHooks => "hooks",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A capability attached to an entity
#[derive(Debug)]
pub enum Component {
    /// Sprite or graphic
    Visual(Visual),
    /// Rigid body
    PhysicsBody(PhysicsBody),
    /// Collision space membership
    PhysicsCollider(PhysicsCollider),
    /// Animation playback
    AnimationController(AnimationController),
    /// Lifecycle scripts
    ScriptHooks(ScriptHooks),
}

impl Component {
    /// Kind of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Visual(_) => ComponentKind::Visual,
            Component::PhysicsBody(_) => ComponentKind::PhysicsBody,
            Component::PhysicsCollider(_) => ComponentKind::PhysicsCollider,
            Component::AnimationController(_) => ComponentKind::AnimationController,
            Component::ScriptHooks(_) => ComponentKind::ScriptHooks,
        }
    }
}

/// One optional slot per component kind
#[derive(Debug, Default)]
pub struct ComponentTable {
    slots: [Option<Component>; ComponentKind::COUNT],
}

impl ComponentTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a component, returning the one it replaced
    pub fn insert(&mut self, component: Component) -> Option<Component> {
        let slot = component.kind().slot();
        self.slots[slot].replace(component)
    }

    /// Take a component out of its slot
    pub fn remove(&mut self, kind: ComponentKind) -> Option<Component> {
        self.slots[kind.slot()].take()
    }

    /// Component of a kind
    pub fn get(&self, kind: ComponentKind) -> Option<&Component> {
        self.slots[kind.slot()].as_ref()
    }

    /// Mutable component of a kind
    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut Component> {
        self.slots[kind.slot()].as_mut()
    }

    /// Whether a component of `kind` is attached
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    /// Number of attached components
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if nothing is attached
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Attached kinds in slot order
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    /// Attached components in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.slots.iter().flatten()
    }

    /// The visual, if any
    pub fn visual(&self) -> Option<&Visual> {
        match self.get(ComponentKind::Visual) {
            Some(Component::Visual(visual)) => Some(visual),
            _ => None,
        }
    }

    /// The visual, mutably
    pub fn visual_mut(&mut self) -> Option<&mut Visual> {
        match self.get_mut(ComponentKind::Visual) {
            Some(Component::Visual(visual)) => Some(visual),
            _ => None,
        }
    }

    /// The physics body, if any
    pub fn physics_body(&self) -> Option<&PhysicsBody> {
        match self.get(ComponentKind::PhysicsBody) {
            Some(Component::PhysicsBody(body)) => Some(body),
            _ => None,
        }
    }

    /// The physics body, mutably
    pub fn physics_body_mut(&mut self) -> Option<&mut PhysicsBody> {
        match self.get_mut(ComponentKind::PhysicsBody) {
            Some(Component::PhysicsBody(body)) => Some(body),
            _ => None,
        }
    }

    /// The collider, if any
    pub fn collider(&self) -> Option<&PhysicsCollider> {
        match self.get(ComponentKind::PhysicsCollider) {
            Some(Component::PhysicsCollider(collider)) => Some(collider),
            _ => None,
        }
    }

    /// The collider, mutably
    pub fn collider_mut(&mut self) -> Option<&mut PhysicsCollider> {
        match self.get_mut(ComponentKind::PhysicsCollider) {
            Some(Component::PhysicsCollider(collider)) => Some(collider),
            _ => None,
        }
    }

    /// The animation controller, if any
    pub fn animation(&self) -> Option<&AnimationController> {
        match self.get(ComponentKind::AnimationController) {
            Some(Component::AnimationController(anim)) => Some(anim),
            _ => None,
        }
    }

    /// The animation controller, mutably
    pub fn animation_mut(&mut self) -> Option<&mut AnimationController> {
        match self.get_mut(ComponentKind::AnimationController) {
            Some(Component::AnimationController(anim)) => Some(anim),
            _ => None,
        }
    }

    /// The script hooks, if any
    pub fn script_hooks(&self) -> Option<&ScriptHooks> {
        match self.get(ComponentKind::ScriptHooks) {
            Some(Component::ScriptHooks(hooks)) => Some(hooks),
            _ => None,
        }
    }
}
