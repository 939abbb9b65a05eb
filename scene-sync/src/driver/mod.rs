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
//! Frame driver
//!
//! The [`FrameDriver`] owns the [`World`] and the gameplay plugins and runs
//! one pass of synchronization per render tick delivered by the host.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --load--> Loaded --start--> Running --stop--> Stopped
//!                            \______________stop______________/
//! ```
//!
//! # Tick order
//!
//! 1. Resolved prefab tickets are added to the world
//! 2. `UpdateBeforePhysics` hooks
//! 3. Snapshot pulled, poses written into moving entities, snapshot released
//! 4. Collision spaces polled if the cadence period changed
//! 5. Gameplay plugins updated
//! 6. `Update` hooks
//! 7. Debug frame pushed to the surface when physics debug is on
//! 8. Debug signal
//!
//! The driver never steps physics; the host calls
//! [`PhysicsBridge::advance`](crate::physics::PhysicsBridge::advance) on its
//! own schedule.

mod cadence;

pub use cadence::CollisionCadence;

use crate::config::EngineConfig;
use crate::ecs::{HookPoint, World};
use crate::error::{SyncError, SyncResult};
use crate::physics::CollisionPair;
use crate::plugins::{GameplayPlugin, PluginContext, PluginRegistry};
use crate::prefab::PrefabTicket;
use std::collections::VecDeque;
use std::fmt;

/// Timing of one render tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Milliseconds since the previous tick
    pub elapsed: f64,
    /// Milliseconds since the tick source started
    pub total: f64,
}

impl FrameTime {
    /// Create tick timing
    pub fn new(elapsed: f64, total: f64) -> Self {
        FrameTime { elapsed, total }
    }
}

/// Lifecycle state of a [`FrameDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Physics world not created yet
    Uninitialized,
    /// Physics world created and plugins started
    Loaded,
    /// Ticks are processed
    Running,
    /// Shut down; ticks are ignored
    Stopped,
}

impl DriverState {
    /// Lower-case state name
    pub fn name(self) -> &'static str {
        match self {
            DriverState::Uninitialized => "uninitialized",
            DriverState::Loaded => "loaded",
            DriverState::Running => "running",
            DriverState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a processed tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Entities added from resolved prefab tickets
    pub spawned: usize,
    /// Entities whose pose was written from the snapshot
    pub applied: usize,
    /// Whether collision spaces were polled
    pub collisions_polled: bool,
}

/// Result of [`FrameDriver::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The driver was not running; nothing happened
    Idle,
    /// The tick ran
    Ran(TickReport),
}

/// Called with the result of polling one collision space
pub type CollisionCallback = Box<dyn FnMut(&mut World, &[CollisionPair]) + Send>;

/// Called with total tick time at the end of every tick
pub type DebugSignal = Box<dyn FnMut(f64) + Send>;

/// Drives the per-tick synchronization of a [`World`]
pub struct FrameDriver {
    world: World,
    plugins: PluginRegistry,
    cadence: CollisionCadence,
    spaces: Vec<(String, CollisionCallback)>,
    pending: VecDeque<PrefabTicket>,
    debug_signal: Option<DebugSignal>,
    physics_debug: bool,
    state: DriverState,
}

impl FrameDriver {
    /// Drive `world` with the cadence and debug settings of `config`
    ///
    /// # Errors
    ///
    /// `Config` if `config` fails validation.
    pub fn new(world: World, config: &EngineConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(FrameDriver {
            world,
            plugins: PluginRegistry::new(),
            cadence: CollisionCadence::new(config.collision.interval_ms),
            spaces: Vec::new(),
            pending: VecDeque::new(),
            debug_signal: None,
            physics_debug: config.physics.debug,
            state: DriverState::Uninitialized,
        })
    }

    /// Driver over a kinematic simulation and a headless surface
    pub fn headless(config: &EngineConfig) -> SyncResult<Self> {
        Self::new(World::headless(config), config)
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The driven world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The driven world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Registered gameplay plugins
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Register a gameplay plugin; must happen before [`load`](Self::load)
    pub fn register_plugin(&mut self, plugin: Box<dyn GameplayPlugin>) -> SyncResult<()> {
        self.plugins.register(plugin)
    }

    /// Create a collision space polled on the cadence with `callback`
    ///
    /// # Errors
    ///
    /// `DuplicateSpace` if the space already exists.
    pub fn create_collision_space<F>(&mut self, name: &str, callback: F) -> SyncResult<()>
    where
        F: FnMut(&mut World, &[CollisionPair]) + Send + 'static,
    {
        self.world.physics_mut().create_space(name)?;
        self.spaces.push((name.to_string(), Box::new(callback)));
        log::debug!("collision space '{}' registered", name);
        Ok(())
    }

    /// Install the end-of-tick debug signal
    pub fn set_debug_signal<F>(&mut self, signal: F)
    where
        F: FnMut(f64) + Send + 'static,
    {
        self.debug_signal = Some(Box::new(signal));
    }

    /// Hand a prefab ticket over; its entity joins the world at the start
    /// of the first tick after it resolves
    pub fn spawn(&mut self, ticket: PrefabTicket) {
        self.pending.push_back(ticket);
    }

    /// Tickets not yet added to the world
    pub fn pending_spawns(&self) -> usize {
        self.pending.len()
    }

    /// Create the physics world and start the plugins
    ///
    /// The physics world is sized to the surface viewport. A bridge that was
    /// initialized by the host beforehand is used as is.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless uninitialized; plugin failures from `prepare`
    /// or `start`.
    pub fn load(&mut self) -> SyncResult<()> {
        self.expect_state(DriverState::Uninitialized, DriverState::Loaded)?;

        if !self.world.physics().is_initialized() {
            let viewport = self.world.viewport_size();
            let debug = self.physics_debug;
            self.world
                .physics_mut()
                .init(viewport.width, viewport.height, debug)?;
        }

        let mut context = PluginContext::new(&mut self.world, FrameTime::default());
        self.plugins.initialize_all(&mut context)?;

        self.state = DriverState::Loaded;
        log::info!(
            "frame driver loaded with {} entities and {} plugins",
            self.world.entity_count(),
            self.plugins.plugin_count()
        );
        Ok(())
    }

    /// Begin processing ticks
    pub fn start(&mut self) -> SyncResult<()> {
        self.expect_state(DriverState::Loaded, DriverState::Running)?;
        self.state = DriverState::Running;
        log::info!("frame driver running");
        Ok(())
    }

    /// Stop processing ticks and shut the plugins down
    ///
    /// # Errors
    ///
    /// `InvalidState` unless loaded or running; the first plugin shutdown
    /// failure. The driver is stopped either way.
    pub fn stop(&mut self) -> SyncResult<()> {
        if !matches!(self.state, DriverState::Loaded | DriverState::Running) {
            return Err(self.invalid_transition(DriverState::Stopped));
        }
        self.state = DriverState::Stopped;
        log::info!("frame driver stopped");
        self.plugins.shutdown_all()
    }

    /// Process one render tick
    ///
    /// Ticks outside `Running` are ignored.
    pub fn tick(&mut self, time: FrameTime) -> SyncResult<TickOutcome> {
        if self.state != DriverState::Running {
            log::trace!("tick at {} ignored while {}", time.total, self.state);
            return Ok(TickOutcome::Idle);
        }

        let spawned = self.flush_spawns()?;

        self.world.run_hooks(HookPoint::UpdateBeforePhysics, time);
        let applied = self.world.sync_from_physics()?;

        let collisions_polled = self.cadence.advance(time.total);
        if collisions_polled {
            self.poll_collisions()?;
        }

        let mut context = PluginContext::new(&mut self.world, time);
        self.plugins.update_all(&mut context)?;

        self.world.run_hooks(HookPoint::Update, time);

        if self.world.physics().debug_enabled() {
            if let Some(frame) = self.world.physics_mut().debug_frame() {
                self.world.surface_mut().draw_debug(&frame);
            }
        }

        if let Some(signal) = self.debug_signal.as_mut() {
            signal(time.total);
        }

        Ok(TickOutcome::Ran(TickReport {
            spawned,
            applied,
            collisions_polled,
        }))
    }

    fn flush_spawns(&mut self) -> SyncResult<usize> {
        let mut waiting = VecDeque::with_capacity(self.pending.len());
        let mut spawned = 0;

        while let Some(mut ticket) = self.pending.pop_front() {
            if let Some(entity) = ticket.try_take() {
                if let Err(err) = self.world.add_entity(entity) {
                    waiting.extend(self.pending.drain(..));
                    self.pending = waiting;
                    return Err(err);
                }
                spawned += 1;
            } else if ticket.is_abandoned() {
                log::warn!("dropping prefab ticket whose producer went away");
            } else {
                waiting.push_back(ticket);
            }
        }

        self.pending = waiting;
        if spawned > 0 {
            log::debug!("spawned {} prefab entities", spawned);
        }
        Ok(spawned)
    }

    /// Query every space registered through
    /// [`create_collision_space`](Self::create_collision_space) and hand the
    /// pairs to its callback
    ///
    /// Spaces created directly on the
    /// [`PhysicsBridge`](crate::physics::PhysicsBridge) have no callback and
    /// are never polled here.
    fn poll_collisions(&mut self) -> SyncResult<()> {
        for (name, callback) in self.spaces.iter_mut() {
            let pairs = self.world.physics().query(name.as_str())?;
            log::trace!("space '{}' reported {} pairs", name, pairs.len());
            callback(&mut self.world, &pairs);
        }
        Ok(())
    }

    fn expect_state(&self, from: DriverState, to: DriverState) -> SyncResult<()> {
        if self.state == from {
            Ok(())
        } else {
            Err(self.invalid_transition(to))
        }
    }

    fn invalid_transition(&self, to: DriverState) -> SyncError {
        SyncError::InvalidState {
            from: self.state.name(),
            to: to.name(),
        }
    }
}

impl fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDriver")
            .field("state", &self.state)
            .field("world", &self.world)
            .field("plugins", &self.plugins.plugin_count())
            .field("spaces", &self.spaces.len())
            .field("pending", &self.pending.len())
            .field("cadence", &self.cadence)
            .finish()
    }
}
