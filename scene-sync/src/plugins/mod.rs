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
//! Gameplay plugins
//!
//! Gameplay code plugs into the frame driver through [`GameplayPlugin`]
//! implementations held in a [`PluginRegistry`].
//!
//! # Features
//!
//! - **Lifecycle**: `prepare` and `start` once on load, `update` every
//!   running tick, `shutdown` on stop
//! - **Dependency Management**: plugins run after the plugins they depend
//!   on; missing and circular dependencies are rejected
//! - **Version Checking**: a plugin's declared API version must be
//!   semver-compatible with [`PLUGIN_API_VERSION`]
//! - **Closures**: [`FnPlugin`] turns a per-frame closure into a plugin
//!
//! # Example
//!
//! ```rust
//! use scene_sync::plugins::{GameplayPlugin, PluginContext};
//! use std::any::Any;
//!
//! struct Spawner;
//!
//! impl GameplayPlugin for Spawner {
//!     fn name(&self) -> &str { "spawner" }
//!     fn version(&self) -> &str { "1.0.0" }
//!     fn prepare(&mut self, ctx: &mut PluginContext) -> Result<(), String> {
//!         ctx.world_mut()
//!             .physics_mut()
//!             .create_space("ground")
//!             .map(|_| ())
//!             .map_err(|e| e.to_string())
//!     }
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//! ```

pub mod api;
pub mod registry;

pub use api::{FnPlugin, GameplayPlugin, PluginContext, PLUGIN_API_VERSION};
pub use registry::PluginRegistry;
