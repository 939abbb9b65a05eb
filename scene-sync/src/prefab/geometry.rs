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
//! Synchronous rectangle prefab

use crate::ecs::components::{
    GraphicShape, PhysicsBody, PhysicsCollider, PointerEvent, PointerEventKind, PointerHandlers,
    Size, Stroke, Visual,
};
use crate::ecs::{Component, Entity};
use crate::physics::BodyDesc;
use crate::prefab::{Prefab, PrefabParams, PrefabTicket};

const OUTLINE: Stroke = Stroke {
    width: 1,
    color: 0xffd900,
};

/// Builds static rectangles: platforms, walls, buttons
///
/// Each entity gets an outlined graphic, a static rectangle body of the same
/// size and, when the params name a space, a collider in that space. Pointer
/// callbacks are attached to the graphic at construction.
///
/// # Examples
///
/// ```
/// use scene_sync::prefab::{GeometryPrefab, Prefab, PrefabParams};
///
/// let mut platforms = GeometryPrefab::new("platform", 200.0, 20.0).with_background(0x336699);
/// let mut ticket = platforms.generate(PrefabParams::at(100.0, 500.0).in_space("ground"));
/// let platform = ticket.try_take().unwrap();
/// assert_eq!(platform.prefab(), "platform");
/// assert!(platform.components().collider().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct GeometryPrefab {
    label: String,
    width: f64,
    height: f64,
    background: u32,
    pointer: PointerHandlers,
}

impl GeometryPrefab {
    /// Rectangles of the given size on a black background
    pub fn new(label: impl Into<String>, width: f64, height: f64) -> Self {
        GeometryPrefab {
            label: label.into(),
            width,
            height,
            background: 0x000000,
            pointer: PointerHandlers::new(),
        }
    }

    /// Fill colour
    pub fn with_background(mut self, color: u32) -> Self {
        self.background = color;
        self
    }

    /// Callback for clicks
    pub fn on_click<F>(self, callback: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.on(PointerEventKind::Click, callback)
    }

    /// Callback for the pointer entering
    pub fn on_hover<F>(self, callback: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.on(PointerEventKind::Hover, callback)
    }

    /// Callback for pointer movement
    pub fn on_pointer_move<F>(self, callback: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.on(PointerEventKind::Move, callback)
    }

    /// Callback for the pointer leaving
    pub fn on_pointer_out<F>(self, callback: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.on(PointerEventKind::Out, callback)
    }

    fn on<F>(mut self, kind: PointerEventKind, callback: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.pointer = self.pointer.on(kind, callback);
        self
    }

    /// Build an entity right away
    pub fn build(&self, params: &PrefabParams) -> Entity {
        let visual = Visual::graphic(
            GraphicShape::Rectangle(Size::new(self.width, self.height)),
            self.background,
        )
        .with_stroke(OUTLINE)
        .with_pointer(self.pointer.clone());

        let body = BodyDesc::rectangle(params.x, params.y, self.width, self.height).with_static(true);

        let mut entity = Entity::new(self.label.clone())
            .with_prefab(self.label.clone())
            .with_position(params.x, params.y)
            .with_size(self.width, self.height)
            .with_component(Component::Visual(visual))
            .with_component(Component::PhysicsBody(PhysicsBody::new(body)));

        if let Some(space) = &params.space {
            entity.attach(Component::PhysicsCollider(PhysicsCollider::new(space.clone())));
        }
        entity
    }
}

impl Prefab for GeometryPrefab {
    fn label(&self) -> &str {
        &self.label
    }

    fn generate(&mut self, params: PrefabParams) -> PrefabTicket {
        PrefabTicket::ready(self.build(&params))
    }
}
