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
//! Engine configuration
//!
//! Settings are read once at startup from TOML. Every field has a default so
//! a partial file (or no file at all) is valid.
//!
//! # Environment Configuration
//!
//! Set `SCENE_SYNC_CONFIG` to the path of a TOML file to have
//! [`EngineConfig::from_env`] load it:
//!
//! ```bash
//! export SCENE_SYNC_CONFIG=/etc/game/scene.toml
//! ```

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SCENE_SYNC_CONFIG";

/// Top-level engine configuration
///
/// # Example
///
/// ```
/// use scene_sync::config::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("[collision]\ninterval_ms = 100.0").unwrap();
/// assert_eq!(config.collision.interval_ms, 100.0);
/// assert_eq!(config.viewport.width, 1000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Viewport used when the render surface does not report one
    pub viewport: ViewportConfig,
    /// Physics world and step runner settings
    pub physics: PhysicsConfig,
    /// Collision polling cadence
    pub collision: CollisionConfig,
    /// Snapshot buffer pooling
    pub snapshot_pool: SnapshotPoolConfig,
}

/// Viewport dimensions in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            width: 1000.0,
            height: 1000.0,
        }
    }
}

/// Physics world settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed step length in milliseconds
    pub timestep_ms: f64,
    /// Gravity in pixels per second squared
    pub gravity: (f64, f64),
    /// Upper bound on steps taken by one `advance` call
    pub max_substeps: u32,
    /// Create the diagnostic renderer at init
    pub debug: bool,
    /// Squared speed under which a body counts as quiet
    pub sleep_threshold: f64,
    /// Consecutive quiet steps before a body falls asleep
    pub sleep_after_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            timestep_ms: 1000.0 / 60.0,
            gravity: (0.0, 980.0),
            max_substeps: 5,
            debug: false,
            sleep_threshold: 0.01,
            sleep_after_steps: 60,
        }
    }
}

/// Collision polling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Polling period in the same units as tick `total` time
    pub interval_ms: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        CollisionConfig { interval_ms: 50.0 }
    }
}

/// Snapshot buffer pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPoolConfig {
    /// Initial capacity of each pooled map
    pub initial_capacity: usize,
    /// Maximum number of idle maps kept
    pub max_pool_size: usize,
}

impl Default for SnapshotPoolConfig {
    fn default() -> Self {
        SnapshotPoolConfig {
            initial_capacity: 64,
            max_pool_size: 2,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> SyncResult<Self> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::info!("loading engine config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load the file named by `SCENE_SYNC_CONFIG`, or defaults when unset
    pub fn from_env() -> SyncResult<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> SyncResult<String> {
        toml::to_string(self).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Reject values the driver and runner cannot work with
    pub fn validate(&self) -> SyncResult<()> {
        let positive = |value: f64| value > 0.0 && value.is_finite();

        if !positive(self.collision.interval_ms) {
            return Err(SyncError::Config(format!(
                "collision.interval_ms must be positive and finite, got {}",
                self.collision.interval_ms
            )));
        }
        if !positive(self.physics.timestep_ms) {
            return Err(SyncError::Config(format!(
                "physics.timestep_ms must be positive and finite, got {}",
                self.physics.timestep_ms
            )));
        }
        if self.physics.max_substeps == 0 {
            return Err(SyncError::Config(
                "physics.max_substeps must be at least 1".to_string(),
            ));
        }
        if !positive(self.viewport.width) || !positive(self.viewport.height) {
            return Err(SyncError::Config(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !self.physics.gravity.0.is_finite() || !self.physics.gravity.1.is_finite() {
            return Err(SyncError::Config("physics.gravity must be finite".to_string()));
        }
        Ok(())
    }
}
