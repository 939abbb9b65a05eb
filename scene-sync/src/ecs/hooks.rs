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
//! Per-entity script hooks
//!
//! Hooks are closures keyed by a [`HookPoint`]. They run in registration
//! order and receive the owning entity mutably, so a hook can reposition a
//! sleeping body's presentation or toggle `lock_y` without going through the
//! world.

use crate::driver::FrameTime;
use crate::ecs::{Entity, EntityId};
use std::fmt;

/// When a hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Entity entered the world
    Load,
    /// Right after `Load`
    Start,
    /// Every tick, before the physics snapshot is applied
    UpdateBeforePhysics,
    /// Every tick, alongside the gameplay update
    Update,
    /// Removal requested, entity still fully registered
    BeforeDestroy,
    /// Entity has left the world
    Destroy,
}

impl HookPoint {
    /// Every hook point in lifecycle order
    pub const ALL: [HookPoint; 6] = [
        HookPoint::Load,
        HookPoint::Start,
        HookPoint::UpdateBeforePhysics,
        HookPoint::Update,
        HookPoint::BeforeDestroy,
        HookPoint::Destroy,
    ];
}

/// Context handed to a hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HookEvent {
    /// Entity the hook belongs to
    pub entity: EntityId,
    /// Which point fired
    pub point: HookPoint,
    /// Frame timing; zero outside ticks
    pub time: FrameTime,
}

/// A script hook
pub type Hook = Box<dyn FnMut(&mut Entity, &HookEvent) + Send>;

/// Ordered hook lists for one entity
#[derive(Default)]
pub struct ScriptHooks {
    hooks: Vec<(HookPoint, Hook)>,
}

impl ScriptHooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook
    pub fn add<F>(&mut self, point: HookPoint, hook: F)
    where
        F: FnMut(&mut Entity, &HookEvent) + Send + 'static,
    {
        self.hooks.push((point, Box::new(hook)));
    }

    /// Builder form of [`add`](Self::add)
    pub fn on<F>(mut self, point: HookPoint, hook: F) -> Self
    where
        F: FnMut(&mut Entity, &HookEvent) + Send + 'static,
    {
        self.add(point, hook);
        self
    }

    /// Number of hooks registered for `point`
    pub fn count(&self, point: HookPoint) -> usize {
        self.hooks.iter().filter(|(p, _)| *p == point).count()
    }

    /// Total number of hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if no hook is registered
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook registered for the event's point, in order
    pub fn run(&mut self, entity: &mut Entity, event: &HookEvent) -> usize {
        let mut ran = 0;
        for (point, hook) in self.hooks.iter_mut() {
            if *point == event.point {
                hook(entity, event);
                ran += 1;
            }
        }
        ran
    }
}

impl fmt::Debug for ScriptHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for point in HookPoint::ALL {
            let count = self.count(point);
            if count > 0 {
                list.entry(&point, &count);
            }
        }
        list.finish()
    }
}
