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
//! Render surface seam
//!
//! The world never draws. It tells a [`RenderSurface`] which visuals are in
//! the scene and where they are; the surface owns everything else.
//! [`HeadlessSurface`] records those calls in memory for tests and for hosts
//! that run without a window.

use crate::ecs::components::{Size, Transform2D};
use crate::physics::DebugFrame;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VISUAL_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque handle of a visual on the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Allocate a handle no other call in this process returns
    pub fn next() -> Self {
        VisualHandle(NEXT_VISUAL_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VisualHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Visual({})", self.0)
    }
}

/// Where visuals are displayed
pub trait RenderSurface: Send + Sync {
    /// Put a visual into the scene graph
    fn add_to_scene(&mut self, handle: VisualHandle);

    /// Take a visual out of the scene graph; unknown handles are a no-op
    fn remove_from_scene(&mut self, handle: VisualHandle);

    /// Current viewport size
    fn viewport_size(&self) -> Size;

    /// Move a visual
    fn set_visual_transform(&mut self, handle: VisualHandle, transform: Transform2D);

    /// Draw physics body outlines over the scene
    fn draw_debug(&mut self, _frame: &DebugFrame) {}

    /// Allow downcasting to the concrete surface
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete surface
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// In-memory surface that records what it was told
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    viewport: Size,
    scene: HashSet<VisualHandle>,
    transforms: HashMap<VisualHandle, Transform2D>,
    transform_updates: u64,
    last_debug: Option<DebugFrame>,
}

impl HeadlessSurface {
    /// Surface with the given viewport
    pub fn new(width: f64, height: f64) -> Self {
        HeadlessSurface {
            viewport: Size::new(width, height),
            ..Self::default()
        }
    }

    /// Change the viewport size
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    /// Whether a visual is in the scene
    pub fn in_scene(&self, handle: VisualHandle) -> bool {
        self.scene.contains(&handle)
    }

    /// Number of visuals in the scene
    pub fn scene_len(&self) -> usize {
        self.scene.len()
    }

    /// Last transform set for a visual
    pub fn transform_of(&self, handle: VisualHandle) -> Option<Transform2D> {
        self.transforms.get(&handle).copied()
    }

    /// Total `set_visual_transform` calls received
    pub fn transform_updates(&self) -> u64 {
        self.transform_updates
    }

    /// Last debug frame drawn
    pub fn last_debug_frame(&self) -> Option<&DebugFrame> {
        self.last_debug.as_ref()
    }
}

impl RenderSurface for HeadlessSurface {
    fn add_to_scene(&mut self, handle: VisualHandle) {
        self.scene.insert(handle);
    }

    fn remove_from_scene(&mut self, handle: VisualHandle) {
        self.scene.remove(&handle);
        self.transforms.remove(&handle);
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn set_visual_transform(&mut self, handle: VisualHandle, transform: Transform2D) {
        self.transforms.insert(handle, transform);
        self.transform_updates += 1;
    }

    fn draw_debug(&mut self, frame: &DebugFrame) {
        self.last_debug = Some(frame.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
