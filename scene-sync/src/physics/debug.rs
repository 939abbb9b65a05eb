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
//! Diagnostic body outlines

use crate::physics::{BodyId, Shape, Simulation};
use crate::ecs::components::Vector2;

/// Outline of one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugShape {
    /// Body being drawn
    pub body: BodyId,
    /// Its shape
    pub shape: Shape,
    /// Centre position
    pub position: Vector2,
    /// Angle in radians
    pub angle: f64,
    /// Static bodies are drawn differently from dynamic ones
    pub is_static: bool,
    /// Sleeping bodies are drawn dimmed
    pub is_sleeping: bool,
}

/// Everything the diagnostic overlay draws for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebugFrame {
    /// Overlay width
    pub width: f64,
    /// Overlay height
    pub height: f64,
    /// Body outlines
    pub shapes: Vec<DebugShape>,
}

/// Builds [`DebugFrame`]s sized to the physics world
#[derive(Debug, Clone)]
pub struct DebugRenderer {
    width: f64,
    height: f64,
    frames_built: u64,
}

impl DebugRenderer {
    /// Create an overlay of the given size
    pub fn new(width: f64, height: f64) -> Self {
        DebugRenderer {
            width,
            height,
            frames_built: 0,
        }
    }

    /// Number of frames produced so far
    pub fn frames_built(&self) -> u64 {
        self.frames_built
    }

    /// Capture the current outlines from the simulation
    pub fn capture(&mut self, simulation: &dyn Simulation) -> DebugFrame {
        self.frames_built += 1;
        DebugFrame {
            width: self.width,
            height: self.height,
            shapes: simulation.debug_shapes(),
        }
    }
}
