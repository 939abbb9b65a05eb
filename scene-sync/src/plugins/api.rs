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
//! Gameplay plugin API
//!
//! A gameplay plugin is the per-frame hook of the frame driver. It is
//! prepared and started once when the driver loads, updated once per running
//! tick after physics poses and collision callbacks have been applied, and
//! shut down when the driver stops.
//!
//! # Contracts
//!
//! Plugins must:
//! - Not keep references into the world past the call that received them
//! - Return an error message instead of panicking
//! - Not create circular dependencies with other plugins

use crate::driver::FrameTime;
use crate::ecs::World;
use std::any::Any;
use std::fmt;

/// Version of the plugin API
///
/// Format: MAJOR.MINOR.PATCH following semantic versioning.
pub const PLUGIN_API_VERSION: &str = "0.3.0";

/// Scoped access handed to plugins
pub struct PluginContext<'a> {
    world: &'a mut World,
    time: FrameTime,
}

impl<'a> PluginContext<'a> {
    /// Create a new plugin context
    ///
    /// This is only callable by the engine, not by plugins.
    pub(crate) fn new(world: &'a mut World, time: FrameTime) -> Self {
        PluginContext { world, time }
    }

    /// The world
    pub fn world(&self) -> &World {
        self.world
    }

    /// The world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// Timing of the current tick; zero during prepare and start
    pub fn time(&self) -> FrameTime {
        self.time
    }
}

/// Lifecycle hooks for gameplay plugins
pub trait GameplayPlugin: Send {
    /// Get the name of this plugin
    ///
    /// Must be unique across all registered plugins.
    fn name(&self) -> &str;

    /// Get the version of this plugin
    fn version(&self) -> &str;

    /// Get the plugin API version this plugin was built against
    fn api_version(&self) -> &str {
        PLUGIN_API_VERSION
    }

    /// Names of plugins that must be prepared, started and updated first
    fn dependencies(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Called once while the driver loads, before any `start`
    ///
    /// Typically creates collision spaces and spawns the initial entities.
    fn prepare(&mut self, _context: &mut PluginContext) -> Result<(), String> {
        Ok(())
    }

    /// Called once after every plugin has been prepared
    fn start(&mut self, _context: &mut PluginContext) -> Result<(), String> {
        Ok(())
    }

    /// Called every running tick
    fn update(&mut self, _context: &mut PluginContext) -> Result<(), String> {
        Ok(())
    }

    /// Called once when the driver stops
    fn shutdown(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Allow downcasting to concrete plugin types
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to concrete plugin types
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

type UpdateFn = Box<dyn FnMut(&mut PluginContext) -> Result<(), String> + Send>;

/// A gameplay plugin made from a per-frame closure
///
/// # Examples
///
/// ```
/// use scene_sync::plugins::{FnPlugin, GameplayPlugin};
///
/// let plugin = FnPlugin::new("score", |ctx| {
///     let _ = ctx.time().total;
///     Ok(())
/// });
/// assert_eq!(plugin.name(), "score");
/// ```
pub struct FnPlugin {
    name: String,
    update: UpdateFn,
    updates: u64,
}

impl FnPlugin {
    /// Wrap `update` as a plugin named `name`
    pub fn new<F>(name: impl Into<String>, update: F) -> Self
    where
        F: FnMut(&mut PluginContext) -> Result<(), String> + Send + 'static,
    {
        FnPlugin {
            name: name.into(),
            update: Box::new(update),
            updates: 0,
        }
    }

    /// Number of times the closure has run
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl GameplayPlugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn update(&mut self, context: &mut PluginContext) -> Result<(), String> {
        self.updates += 1;
        (self.update)(context)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("updates", &self.updates)
            .finish()
    }
}
