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
//! Asynchronous sprite prefab
//!
//! The prefab starts [`ResourceStatus::Pending`]. Requests made while
//! pending are queued with the sender of their ticket. When the texture is
//! reported ready the prefab switches to [`ResourceStatus::Ready`] for good
//! and drains the queue in arrival order. There is no way to cancel a queued
//! request; dropping its ticket only discards the result.

use crate::ecs::components::{PhysicsBody, PhysicsCollider, Size, Visual};
use crate::ecs::{Component, Entity};
use crate::physics::BodyDesc;
use crate::prefab::{deliver, Prefab, PrefabParams, PrefabTicket};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::collections::VecDeque;
use std::fmt;

/// Loading state of the backing texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Still loading; requests are queued
    Pending,
    /// Loaded; requests resolve immediately
    Ready,
}

type LoadHook = Box<dyn FnOnce(&str) + Send>;
type MountHook = Box<dyn FnMut(&mut Entity) + Send>;

/// Builds dynamic sprite-backed circles once their texture has loaded
pub struct AsyncSpritePrefab {
    label: String,
    source: String,
    size: f64,
    status: ResourceStatus,
    texture: Option<String>,
    waiting: VecDeque<(PrefabParams, Sender<Entity>)>,
    loader: Option<Receiver<String>>,
    on_load: Option<LoadHook>,
    on_mount: Option<MountHook>,
}

impl AsyncSpritePrefab {
    /// Sprites of `size` pixels showing the texture at `source`
    pub fn new(label: impl Into<String>, source: impl Into<String>, size: f64) -> Self {
        AsyncSpritePrefab {
            label: label.into(),
            source: source.into(),
            size,
            status: ResourceStatus::Pending,
            texture: None,
            waiting: VecDeque::new(),
            loader: None,
            on_load: None,
            on_mount: None,
        }
    }

    /// Receive the loaded texture name from a loader running elsewhere
    ///
    /// [`poll`](Self::poll) checks the channel.
    pub fn with_loader(mut self, loader: Receiver<String>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Run once with the texture name when it becomes ready
    pub fn with_on_load<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&str) + Send + 'static,
    {
        self.on_load = Some(Box::new(hook));
        self
    }

    /// Run on every entity before it is handed out
    pub fn with_on_mount<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Entity) + Send + 'static,
    {
        self.on_mount = Some(Box::new(hook));
        self
    }

    /// Texture source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Current loading state
    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    /// Number of queued requests
    pub fn pending_count(&self) -> usize {
        self.waiting.len()
    }

    /// Check the loader channel and resolve if the texture arrived
    ///
    /// Returns the number of queued requests resolved.
    pub fn poll(&mut self) -> usize {
        let Some(loader) = &self.loader else {
            return 0;
        };
        match loader.try_recv() {
            Ok(texture) => {
                self.loader = None;
                self.resource_ready(texture)
            }
            Err(TryRecvError::Empty) => 0,
            Err(TryRecvError::Disconnected) => {
                log::warn!(
                    "loader for '{}' went away before '{}' was ready",
                    self.label,
                    self.source
                );
                self.loader = None;
                0
            }
        }
    }

    /// Mark the texture loaded and resolve every queued request in order
    ///
    /// Only the first call has an effect; the prefab never returns to
    /// pending. Returns the number of queued requests resolved.
    pub fn resource_ready(&mut self, texture: impl Into<String>) -> usize {
        if self.status == ResourceStatus::Ready {
            log::warn!("'{}' resource reported ready twice, ignoring", self.label);
            return 0;
        }

        let texture = texture.into();
        if let Some(hook) = self.on_load.take() {
            hook(&texture);
        }
        self.texture = Some(texture);
        self.status = ResourceStatus::Ready;

        let queued = std::mem::take(&mut self.waiting);
        let resolved = queued.len();
        for (params, sender) in queued {
            if let Some(entity) = self.build(&params) {
                deliver(&sender, entity);
            }
        }
        log::debug!("'{}' ready, resolved {} queued requests", self.label, resolved);
        resolved
    }

    fn build(&mut self, params: &PrefabParams) -> Option<Entity> {
        let texture = self.texture.as_ref()?;
        let visual = Visual::sprite(texture.clone(), Size::new(self.size, self.size));
        let body = BodyDesc::circle(params.x, params.y, self.size / 2.0);

        let mut entity = Entity::new(self.label.clone())
            .with_prefab(self.label.clone())
            .with_position(params.x, params.y)
            .with_size(self.size, self.size)
            .with_component(Component::Visual(visual))
            .with_component(Component::PhysicsBody(PhysicsBody::new(body)));

        if let Some(space) = &params.space {
            entity.attach(Component::PhysicsCollider(PhysicsCollider::new(space.clone())));
        }
        if let Some(hook) = self.on_mount.as_mut() {
            hook(&mut entity);
        }
        Some(entity)
    }
}

impl Prefab for AsyncSpritePrefab {
    fn label(&self) -> &str {
        &self.label
    }

    fn generate(&mut self, params: PrefabParams) -> PrefabTicket {
        if self.status == ResourceStatus::Ready {
            if let Some(entity) = self.build(&params) {
                return PrefabTicket::ready(entity);
            }
        }

        let (sender, ticket) = PrefabTicket::pending();
        self.waiting.push_back((params, sender));
        ticket
    }
}

impl fmt::Debug for AsyncSpritePrefab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSpritePrefab")
            .field("label", &self.label)
            .field("source", &self.source)
            .field("status", &self.status)
            .field("waiting", &self.waiting.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::VisualKind;
    use crate::physics::Shape;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_queued_until_ready() {
        let mut prefab = AsyncSpritePrefab::new("ball", "ball.png", 40.0);
        let mut ticket = prefab.generate(PrefabParams::at(1.0, 2.0));

        assert_eq!(prefab.status(), ResourceStatus::Pending);
        assert_eq!(prefab.pending_count(), 1);
        assert!(!ticket.is_ready());

        assert_eq!(prefab.resource_ready("ball-texture"), 1);
        assert_eq!(prefab.status(), ResourceStatus::Ready);

        let entity = ticket.try_take().unwrap();
        assert_eq!(entity.geometry().pos_x, 1.0);
        match entity.components().visual().unwrap().kind() {
            VisualKind::Sprite { texture, size } => {
                assert_eq!(texture, "ball-texture");
                assert_eq!(*size, Size::new(40.0, 40.0));
            }
            other => panic!("unexpected visual {:?}", other),
        }
        assert_eq!(
            entity.components().physics_body().unwrap().desc().shape,
            Shape::Circle { radius: 20.0 }
        );
    }

    #[test]
    fn test_ready_is_permanent() {
        let loads = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&loads);
        let mut prefab = AsyncSpritePrefab::new("ball", "ball.png", 10.0)
            .with_on_load(move |_| *counter.lock().unwrap() += 1);

        prefab.resource_ready("t");
        assert_eq!(prefab.resource_ready("other"), 0);
        assert_eq!(*loads.lock().unwrap(), 1);

        let mut ticket = prefab.generate(PrefabParams::at(0.0, 0.0));
        assert!(ticket.is_ready());
        assert_eq!(prefab.pending_count(), 0);
    }

    #[test]
    fn test_on_mount_runs_per_entity() {
        let mut prefab = AsyncSpritePrefab::new("hero", "hero.png", 16.0)
            .with_on_mount(|entity| entity.set_lock_y(true));
        let mut ticket = prefab.generate(PrefabParams::at(0.0, 0.0).in_space("ground"));
        prefab.resource_ready("hero");

        let entity = ticket.try_take().unwrap();
        assert!(entity.lock_y());
        assert_eq!(entity.components().collider().unwrap().space(), "ground");
    }

    #[test]
    fn test_loader_channel() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut prefab = AsyncSpritePrefab::new("ball", "ball.png", 10.0).with_loader(rx);
        let mut ticket = prefab.generate(PrefabParams::at(0.0, 0.0));

        assert_eq!(prefab.poll(), 0);
        tx.send("ball".to_string()).unwrap();
        assert_eq!(prefab.poll(), 1);
        assert!(ticket.is_ready());
        assert_eq!(prefab.poll(), 0);
    }
}
