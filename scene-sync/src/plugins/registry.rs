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
//! Plugin registry
//!
//! This module provides the registry for gameplay plugins, including:
//! - Registration with duplicate-name and API version checks
//! - Dependency resolution and circular dependency detection
//! - Ordered prepare/start/update and reverse-order shutdown

use crate::error::{SyncError, SyncResult};
use crate::plugins::api::{GameplayPlugin, PluginContext, PLUGIN_API_VERSION};
use semver::Version;
use std::collections::{HashMap, VecDeque};

/// Registry for managing and running gameplay plugins
///
/// Plugins are registered before the frame driver loads. Loading resolves
/// the dependency order once; after that the registry is closed to new
/// registrations until it is shut down.
pub struct PluginRegistry {
    /// Registered plugins indexed by name
    plugins: HashMap<String, Box<dyn GameplayPlugin>>,
    /// Registration order, used to break ties in the dependency sort
    registration_order: Vec<String>,
    /// Plugin run order (topologically sorted by dependencies)
    load_order: Vec<String>,
    /// Whether prepare and start have run
    initialized: bool,
}

impl PluginRegistry {
    /// Create a new plugin registry
    pub fn new() -> Self {
        PluginRegistry {
            plugins: HashMap::new(),
            registration_order: Vec::new(),
            load_order: Vec::new(),
            initialized: false,
        }
    }

    /// Register a plugin
    ///
    /// # Errors
    ///
    /// `SyncError::Plugin` if:
    /// - A plugin with the same name is already registered
    /// - The plugin API version is incompatible
    /// - The registry has already been initialized
    pub fn register(&mut self, plugin: Box<dyn GameplayPlugin>) -> SyncResult<()> {
        let name = plugin.name().to_string();

        if self.initialized {
            return Err(plugin_error(&name, "cannot register plugins after initialization"));
        }

        if self.plugins.contains_key(&name) {
            return Err(plugin_error(&name, "already registered"));
        }

        let plugin_api_version = plugin.api_version();
        if !is_version_compatible(plugin_api_version, PLUGIN_API_VERSION) {
            return Err(plugin_error(
                &name,
                format!(
                    "API version {} is incompatible with engine API version {}",
                    plugin_api_version, PLUGIN_API_VERSION
                ),
            ));
        }

        log::debug!("registered plugin '{}' v{}", name, plugin.version());
        self.registration_order.push(name.clone());
        self.plugins.insert(name, plugin);
        Ok(())
    }

    /// Resolve dependencies, then prepare and start every plugin
    ///
    /// Every plugin is prepared before any plugin is started.
    ///
    /// # Errors
    ///
    /// - Missing dependencies
    /// - Circular dependencies detected
    /// - A plugin's `prepare` or `start` failing
    pub fn initialize_all(&mut self, context: &mut PluginContext) -> SyncResult<()> {
        if self.initialized {
            return Err(plugin_error("registry", "already initialized"));
        }

        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        for name in &self.registration_order {
            let Some(plugin) = self.plugins.get(name) else {
                continue;
            };
            let deps: Vec<String> = plugin
                .dependencies()
                .iter()
                .map(|s| s.to_string())
                .collect();

            for dep in &deps {
                if !self.plugins.contains_key(dep) {
                    return Err(plugin_error(
                        name,
                        format!("depends on '{}' which is not registered", dep),
                    ));
                }
            }

            dependencies.insert(name.clone(), deps);
        }

        self.load_order = topological_sort(&self.registration_order, &dependencies)
            .map_err(|reason| plugin_error("registry", reason))?;

        for name in &self.load_order {
            if let Some(plugin) = self.plugins.get_mut(name) {
                plugin
                    .prepare(context)
                    .map_err(|e| plugin_error(name, format!("prepare failed: {}", e)))?;
            }
        }
        for name in &self.load_order {
            if let Some(plugin) = self.plugins.get_mut(name) {
                plugin
                    .start(context)
                    .map_err(|e| plugin_error(name, format!("start failed: {}", e)))?;
            }
        }

        log::info!("started {} plugins: {:?}", self.load_order.len(), self.load_order);
        self.initialized = true;
        Ok(())
    }

    /// Update all plugins in load order
    ///
    /// # Errors
    ///
    /// The first plugin error; plugins after it are not updated this tick.
    pub fn update_all(&mut self, context: &mut PluginContext) -> SyncResult<()> {
        if !self.initialized {
            return Err(plugin_error("registry", "not initialized"));
        }

        for name in &self.load_order {
            if let Some(plugin) = self.plugins.get_mut(name) {
                plugin
                    .update(context)
                    .map_err(|e| plugin_error(name, format!("update failed: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Shut down all plugins in reverse load order
    ///
    /// Every plugin is shut down even if an earlier one fails; the first
    /// failure is returned.
    pub fn shutdown_all(&mut self) -> SyncResult<()> {
        if !self.initialized {
            return Ok(());
        }

        let mut first_error = None;
        for name in self.load_order.iter().rev() {
            if let Some(plugin) = self.plugins.get_mut(name) {
                if let Err(e) = plugin.shutdown() {
                    log::warn!("plugin '{}' failed to shut down: {}", name, e);
                    if first_error.is_none() {
                        first_error = Some(plugin_error(name, format!("shutdown failed: {}", e)));
                    }
                }
            }
        }

        self.initialized = false;
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<&dyn GameplayPlugin> {
        self.plugins.get(name).map(|p| p.as_ref())
    }

    /// Get a mutable plugin by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn GameplayPlugin + '_)> {
        self.plugins
            .get_mut(name)
            .map(|p| &mut **p as &mut (dyn GameplayPlugin + '_))
    }

    /// Get a plugin as its concrete type
    pub fn get_as<T: GameplayPlugin + 'static>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(|p| p.as_any().downcast_ref::<T>())
    }

    /// Get the number of registered plugins
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the registry is initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Names of plugins in the order they run
    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.registration_order)
            .field("initialized", &self.initialized)
            .finish()
    }
}

fn plugin_error(name: &str, reason: impl Into<String>) -> SyncError {
    SyncError::Plugin {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Check if a plugin API version is compatible with the engine
///
/// Uses semantic versioning rules:
/// - Major version must match
/// - For major version 0.x.y, minor versions must match (breaking changes)
/// - For major version >= 1, minor version can be less than or equal
/// - Patch version is ignored
fn is_version_compatible(plugin_version: &str, engine_version: &str) -> bool {
    let (Ok(plugin_ver), Ok(engine_ver)) =
        (Version::parse(plugin_version), Version::parse(engine_version))
    else {
        return false;
    };

    if plugin_ver.major != engine_ver.major {
        return false;
    }

    if plugin_ver.major != 0 {
        plugin_ver.minor <= engine_ver.minor
    } else {
        plugin_ver.minor == engine_ver.minor
    }
}

/// Kahn's algorithm over the dependency graph
///
/// Ties are broken by registration order so the result is deterministic.
fn topological_sort(
    registration_order: &[String],
    dependencies: &HashMap<String, Vec<String>>,
) -> Result<Vec<String>, String> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for name in registration_order {
        in_degree.entry(name.as_str()).or_insert(0);
    }

    for name in registration_order {
        if let Some(deps) = dependencies.get(name) {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
                *in_degree.entry(name.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut queue: VecDeque<&str> = registration_order
        .iter()
        .map(String::as_str)
        .filter(|name| in_degree.get(name).copied() == Some(0))
        .collect();

    let mut sorted = Vec::with_capacity(registration_order.len());
    while let Some(node) = queue.pop_front() {
        sorted.push(node.to_string());

        if let Some(neighbors) = dependents.get(node) {
            for &neighbor in neighbors {
                if let Some(degree) = in_degree.get_mut(neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    if sorted.len() != registration_order.len() {
        return Err("circular dependency detected in plugin dependencies".to_string());
    }

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::driver::FrameTime;
    use crate::ecs::World;
    use std::any::Any;

    struct TestPlugin {
        name: String,
        api_version: String,
        deps: Vec<String>,
        prepare_count: usize,
        start_count: usize,
        update_count: usize,
        shutdown_count: usize,
    }

    impl TestPlugin {
        fn new(name: &str, deps: Vec<&str>) -> Self {
            TestPlugin {
                name: name.to_string(),
                api_version: PLUGIN_API_VERSION.to_string(),
                deps: deps.iter().map(|s| s.to_string()).collect(),
                prepare_count: 0,
                start_count: 0,
                update_count: 0,
                shutdown_count: 0,
            }
        }
    }

    impl GameplayPlugin for TestPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn api_version(&self) -> &str {
            &self.api_version
        }

        fn dependencies(&self) -> Vec<&str> {
            self.deps.iter().map(|s| s.as_str()).collect()
        }

        fn prepare(&mut self, _context: &mut PluginContext) -> Result<(), String> {
            self.prepare_count += 1;
            Ok(())
        }

        fn start(&mut self, _context: &mut PluginContext) -> Result<(), String> {
            assert_eq!(self.prepare_count, 1);
            self.start_count += 1;
            Ok(())
        }

        fn update(&mut self, _context: &mut PluginContext) -> Result<(), String> {
            self.update_count += 1;
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), String> {
            self.shutdown_count += 1;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn world() -> World {
        World::headless(&EngineConfig::default())
    }

    fn reason(result: SyncResult<()>) -> String {
        match result {
            Err(SyncError::Plugin { reason, .. }) => reason,
            other => panic!("expected plugin error, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = PluginRegistry::new();
        assert_eq!(registry.plugin_count(), 0);
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_duplicate_plugin_registration() {
        let mut registry = PluginRegistry::new();
        registry
            .register(Box::new(TestPlugin::new("test", vec![])))
            .unwrap();

        let result = registry.register(Box::new(TestPlugin::new("test", vec![])));
        assert!(reason(result).contains("already registered"));
    }

    #[test]
    fn test_incompatible_api_version() {
        let mut registry = PluginRegistry::new();
        let mut plugin = TestPlugin::new("old", vec![]);
        plugin.api_version = "0.1.0".to_string();

        assert!(reason(registry.register(Box::new(plugin))).contains("incompatible"));
        assert_eq!(registry.plugin_count(), 0);
    }

    #[test]
    fn test_lifecycle() {
        let mut registry = PluginRegistry::new();
        registry
            .register(Box::new(TestPlugin::new("test", vec![])))
            .unwrap();

        let mut world = world();
        let mut ctx = PluginContext::new(&mut world, FrameTime::default());
        registry.initialize_all(&mut ctx).unwrap();
        registry.update_all(&mut ctx).unwrap();
        registry.update_all(&mut ctx).unwrap();
        registry.shutdown_all().unwrap();

        let plugin = registry.get_as::<TestPlugin>("test").unwrap();
        assert_eq!(plugin.start_count, 1);
        assert_eq!(plugin.update_count, 2);
        assert_eq!(plugin.shutdown_count, 1);
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_update_before_initialize() {
        let mut registry = PluginRegistry::new();
        let mut world = world();
        let mut ctx = PluginContext::new(&mut world, FrameTime::default());
        assert!(reason(registry.update_all(&mut ctx)).contains("not initialized"));
    }

    #[test]
    fn test_dependency_resolution() {
        let mut registry = PluginRegistry::new();
        registry
            .register(Box::new(TestPlugin::new("plugin_b", vec!["plugin_a"])))
            .unwrap();
        registry
            .register(Box::new(TestPlugin::new("plugin_a", vec![])))
            .unwrap();
        registry
            .register(Box::new(TestPlugin::new("plugin_c", vec![])))
            .unwrap();

        let mut world = world();
        let mut ctx = PluginContext::new(&mut world, FrameTime::default());
        registry.initialize_all(&mut ctx).unwrap();

        assert_eq!(registry.load_order(), &["plugin_a", "plugin_c", "plugin_b"]);
    }

    #[test]
    fn test_missing_dependency() {
        let mut registry = PluginRegistry::new();
        registry
            .register(Box::new(TestPlugin::new("plugin_b", vec!["plugin_a"])))
            .unwrap();

        let mut world = world();
        let mut ctx = PluginContext::new(&mut world, FrameTime::default());
        assert!(reason(registry.initialize_all(&mut ctx)).contains("not registered"));
    }

    #[test]
    fn test_circular_dependency() {
        let mut registry = PluginRegistry::new();

        // A -> B -> C -> A
        registry
            .register(Box::new(TestPlugin::new("plugin_a", vec!["plugin_c"])))
            .unwrap();
        registry
            .register(Box::new(TestPlugin::new("plugin_b", vec!["plugin_a"])))
            .unwrap();
        registry
            .register(Box::new(TestPlugin::new("plugin_c", vec!["plugin_b"])))
            .unwrap();

        let mut world = world();
        let mut ctx = PluginContext::new(&mut world, FrameTime::default());
        assert!(reason(registry.initialize_all(&mut ctx)).contains("circular dependency"));
    }

    #[test]
    fn test_register_after_initialize() {
        let mut registry = PluginRegistry::new();
        let mut world = world();
        let mut ctx = PluginContext::new(&mut world, FrameTime::default());
        registry.initialize_all(&mut ctx).unwrap();

        let result = registry.register(Box::new(TestPlugin::new("late", vec![])));
        assert!(reason(result).contains("after initialization"));
    }

    #[test]
    fn test_version_compatibility() {
        assert!(is_version_compatible("0.3.0", "0.3.0"));
        assert!(is_version_compatible("0.3.1", "0.3.0"));
        assert!(!is_version_compatible("0.2.0", "0.3.0"));
        assert!(is_version_compatible("1.0.0", "1.2.0"));
        assert!(!is_version_compatible("1.3.0", "1.2.0"));
        assert!(!is_version_compatible("2.0.0", "1.0.0"));
        assert!(!is_version_compatible("not-a-version", "1.0.0"));
    }
}
