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
//! The physics bridge
//!
//! [`PhysicsBridge`] is the single owner of the simulation handle, the
//! entity/body bijection and the collision spaces. Every mutation of those
//! three goes through it, so removing a body can purge it from the map and
//! from every space in one place.
//!
//! # Lifecycle
//!
//! A bridge starts uninitialised. [`PhysicsBridge::init`] creates the world
//! exactly once; calling it again is an error rather than a silent reset,
//! because a second world would orphan every tracked body id. Operations
//! that need the world fail with [`SyncError::NotInitialized`] until then.
//!
//! # Snapshots
//!
//! [`PhysicsBridge::snapshot`] reads one pose per tracked body and returns a
//! pooled map. Dropping the map clears it and returns it to the pool, so each
//! snapshot is consumed once.

use crate::config::{PhysicsConfig, SnapshotPoolConfig};
use crate::ecs::components::Vector2;
use crate::ecs::{Entity, EntityId};
use crate::error::{SyncError, SyncResult};
use crate::physics::{
    BodyId, BodyMap, BodyPose, CollisionDispatcher, CollisionPair, DebugFrame, DebugRenderer,
    Detector, KinematicWorld, Simulation, StepRunner, WorldSettings,
};
use crate::pool::{HashMapGuard, HashMapPool, PoolConfig};

/// Builds the simulation when the bridge is initialised
pub type WorldFactory = Box<dyn Fn(&WorldSettings) -> Box<dyn Simulation> + Send + Sync>;

/// Single-use pose map keyed by entity
pub type Snapshot = HashMapGuard<EntityId, BodyPose>;

/// Below this many tracked bodies the snapshot is built on the calling thread
#[cfg(feature = "parallel")]
const PARALLEL_SNAPSHOT_THRESHOLD: usize = 512;

struct ActiveWorld {
    simulation: Box<dyn Simulation>,
    runner: StepRunner,
    debug: Option<DebugRenderer>,
    settings: WorldSettings,
}

/// Owner of the simulation, the entity/body bijection and collision spaces
pub struct PhysicsBridge {
    factory: WorldFactory,
    config: PhysicsConfig,
    active: Option<ActiveWorld>,
    bodies: BodyMap,
    dispatcher: CollisionDispatcher,
    snapshot_pool: HashMapPool<EntityId, BodyPose>,
}

impl PhysicsBridge {
    /// Create an uninitialised bridge that will build its world with `factory`
    pub fn new(factory: WorldFactory, config: PhysicsConfig) -> Self {
        PhysicsBridge {
            factory,
            config,
            active: None,
            bodies: BodyMap::new(),
            dispatcher: CollisionDispatcher::new(),
            snapshot_pool: HashMapPool::new(),
        }
    }

    /// Create an uninitialised bridge backed by [`KinematicWorld`]
    pub fn kinematic(config: PhysicsConfig) -> Self {
        Self::new(
            Box::new(|settings: &WorldSettings| {
                Box::new(KinematicWorld::new(*settings)) as Box<dyn Simulation>
            }),
            config,
        )
    }

    /// Size the snapshot pool
    pub fn with_snapshot_pool(mut self, pool: &SnapshotPoolConfig) -> Self {
        self.snapshot_pool = HashMapPool::with_config(PoolConfig::new(
            pool.initial_capacity,
            pool.max_pool_size,
        ));
        self
    }

    /// Create the simulation world and its step runner
    ///
    /// When `debug` is set a diagnostic renderer of the same size is created
    /// as well.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` if the world already exists; the existing world
    /// and every tracked body are left as they were.
    pub fn init(&mut self, width: f64, height: f64, debug: bool) -> SyncResult<()> {
        if self.active.is_some() {
            return Err(SyncError::AlreadyInitialized);
        }

        let settings = WorldSettings {
            width,
            height,
            gravity: Vector2::new(self.config.gravity.0, self.config.gravity.1),
            sleep_threshold: self.config.sleep_threshold,
            sleep_after_steps: self.config.sleep_after_steps,
        };
        let simulation = (self.factory)(&settings);
        let runner = StepRunner::new(self.config.timestep_ms, self.config.max_substeps);
        let debug = (debug || self.config.debug).then(|| DebugRenderer::new(width, height));

        log::info!(
            "physics world initialised ({}x{}, timestep {:.3} ms, debug {})",
            width,
            height,
            self.config.timestep_ms,
            debug.is_some()
        );

        self.active = Some(ActiveWorld {
            simulation,
            runner,
            debug,
            settings,
        });
        Ok(())
    }

    /// Check whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// Settings the world was created with
    pub fn settings(&self) -> Option<&WorldSettings> {
        self.active.as_ref().map(|active| &active.settings)
    }

    /// Turn the diagnostic renderer on or off
    ///
    /// Before `init` this only records the preference for `init` to use.
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.config.debug = enabled;
        if let Some(active) = self.active.as_mut() {
            match (enabled, active.debug.is_some()) {
                (true, false) => {
                    active.debug = Some(DebugRenderer::new(
                        active.settings.width,
                        active.settings.height,
                    ));
                    log::debug!("physics debug renderer enabled");
                }
                (false, true) => {
                    active.debug = None;
                    log::debug!("physics debug renderer disabled");
                }
                _ => {}
            }
        }
    }

    /// Whether a diagnostic renderer is active
    pub fn debug_enabled(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, |active| active.debug.is_some())
    }

    /// Capture a diagnostic frame if the renderer is active
    pub fn debug_frame(&mut self) -> Option<DebugFrame> {
        let active = self.active.as_mut()?;
        let simulation = active.simulation.as_ref();
        active
            .debug
            .as_mut()
            .map(|renderer| renderer.capture(simulation))
    }

    /// The simulation, for reads
    pub fn simulation(&self) -> SyncResult<&dyn Simulation> {
        self.active
            .as_ref()
            .map(|active| active.simulation.as_ref())
            .ok_or(SyncError::NotInitialized {
                operation: "simulation",
            })
    }

    /// The simulation, for direct manipulation (velocities, teleports)
    pub fn simulation_mut(&mut self) -> SyncResult<&mut dyn Simulation> {
        match self.active.as_mut() {
            Some(active) => Ok(active.simulation.as_mut()),
            None => Err(SyncError::NotInitialized {
                operation: "simulation_mut",
            }),
        }
    }

    /// Bank `elapsed_ms` in the step runner and run whole physics steps
    ///
    /// Returns the number of steps taken. The host calls this on its own
    /// schedule; a snapshot taken afterwards reflects post-step poses.
    pub fn advance(&mut self, elapsed_ms: f64) -> SyncResult<u32> {
        let active = self.active.as_mut().ok_or(SyncError::NotInitialized {
            operation: "advance",
        })?;
        Ok(active
            .runner
            .advance(active.simulation.as_mut(), elapsed_ms))
    }

    /// Register the bodies of every entity carrying a `PhysicsBody`
    ///
    /// A body is created from the component's description unless the
    /// component already holds one the simulation still knows; a binding
    /// left over from an earlier removal is replaced. Entities without a `PhysicsBody` are
    /// skipped, as are entities already tracked. The body id is written back
    /// into the `PhysicsBody` and any `PhysicsCollider` on the entity.
    ///
    /// Returns the number of newly registered bodies.
    pub fn add_bodies(&mut self, entities: &mut [Entity]) -> SyncResult<usize> {
        let active = self.active.as_mut().ok_or(SyncError::NotInitialized {
            operation: "add_bodies",
        })?;

        let mut added = Vec::new();
        for entity in entities.iter_mut() {
            let id = entity.id();
            let Some(physics) = entity.components_mut().physics_body_mut() else {
                continue;
            };

            if self.bodies.contains_entity(id) {
                log::warn!("{} already has a registered body, skipping", id);
                continue;
            }

            let body = match physics.body() {
                Some(body) if active.simulation.body_pose(body).is_some() => body,
                _ => active.simulation.create_body(physics.desc()),
            };

            if !self.bodies.link(id, body) {
                log::warn!("{} is already linked to another entity, skipping {}", body, id);
                continue;
            }
            physics.bind(body);

            if let Some(collider) = entity.components_mut().collider_mut() {
                collider.bind(body);
            }

            log::debug!("registered {} for {}", body, id);
            added.push(body);
        }

        if !added.is_empty() {
            active.simulation.add_to_world(&added);
        }
        Ok(added.len())
    }

    /// Unregister the bodies of the given entities
    ///
    /// Each body is unlinked from the bijection, purged from every collision
    /// space and removed from the simulation. Entities that were never
    /// tracked are a no-op. Returns the number of bodies removed.
    pub fn remove_bodies(&mut self, entities: &[Entity]) -> SyncResult<usize> {
        self.remove_bodies_by_id(entities.iter().map(Entity::id))
    }

    /// Same as [`remove_bodies`](Self::remove_bodies), by entity id
    pub fn remove_bodies_by_id<I>(&mut self, ids: I) -> SyncResult<usize>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let active = self.active.as_mut().ok_or(SyncError::NotInitialized {
            operation: "remove_bodies",
        })?;

        let mut removed = Vec::new();
        for id in ids {
            let Some(body) = self.bodies.unlink_entity(id) else {
                continue;
            };
            let purged = self.dispatcher.purge(body);
            log::debug!(
                "unregistered {} of {} (purged from {} spaces)",
                body,
                id,
                purged
            );
            removed.push(body);
        }

        if !removed.is_empty() {
            active.simulation.remove_from_world(&removed);
        }
        Ok(removed.len())
    }

    /// Read the current pose of every tracked body
    ///
    /// Runs in time linear in the number of tracked bodies. Bodies the
    /// simulation no longer knows are left out.
    pub fn snapshot(&self) -> SyncResult<Snapshot> {
        let active = self.active.as_ref().ok_or(SyncError::NotInitialized {
            operation: "snapshot",
        })?;
        let simulation = active.simulation.as_ref();
        let links = self.bodies.links();

        let mut snapshot = self.snapshot_pool.acquire();
        snapshot.reserve(links.len());

        #[cfg(feature = "parallel")]
        {
            if links.len() >= PARALLEL_SNAPSHOT_THRESHOLD {
                use rayon::prelude::*;

                let poses: Vec<(EntityId, BodyPose)> = links
                    .par_iter()
                    .filter_map(|link| {
                        simulation.body_pose(link.body).map(|pose| (link.entity, pose))
                    })
                    .collect();
                snapshot.extend(poses);
                return Ok(snapshot);
            }
        }

        snapshot.extend(
            links
                .iter()
                .filter_map(|link| simulation.body_pose(link.body).map(|pose| (link.entity, pose))),
        );
        Ok(snapshot)
    }

    /// Whether a body is static or sleeping
    ///
    /// Unknown bodies and an uninitialised bridge count as not resting.
    pub fn is_resting(&self, body: BodyId) -> bool {
        self.active.as_ref().map_or(false, |active| {
            active.simulation.is_static(body) || active.simulation.is_sleeping(body)
        })
    }

    /// Body registered for an entity
    pub fn body_of(&self, entity: EntityId) -> Option<BodyId> {
        self.bodies.body_of(entity)
    }

    /// Entity owning a body
    pub fn entity_of(&self, body: BodyId) -> Option<EntityId> {
        self.bodies.entity_of(body)
    }

    /// Number of tracked bodies
    pub fn tracked_count(&self) -> usize {
        self.bodies.len()
    }

    /// The entity/body bijection
    pub fn body_map(&self) -> &BodyMap {
        &self.bodies
    }

    /// The collision space registry
    pub fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    /// Register a collision space
    ///
    /// # Errors
    ///
    /// `DuplicateSpace` if the name is already registered.
    pub fn create_space(&mut self, name: &str) -> SyncResult<&mut Detector> {
        self.dispatcher.create_space(name)
    }

    /// Look up a collision space
    pub fn find_space(&self, name: &str) -> Option<&Detector> {
        self.dispatcher.find_space(name)
    }

    /// Names of every collision space
    pub fn space_names(&self) -> Vec<String> {
        self.dispatcher.space_names().map(str::to_string).collect()
    }

    /// Attach an entity's body to a space
    ///
    /// Returns false if the entity has no body, the space is unknown, or the
    /// body is already attached.
    pub fn attach_to_space(&mut self, name: &str, entity: EntityId) -> bool {
        match self.bodies.body_of(entity) {
            Some(body) => self.dispatcher.attach(name, body),
            None => {
                log::debug!("{} has no body to attach to '{}'", entity, name);
                false
            }
        }
    }

    /// Detach an entity's body from a space; absent members are a no-op
    pub fn detach_from_space(&mut self, name: &str, entity: EntityId) -> bool {
        self.bodies
            .body_of(entity)
            .map_or(false, |body| self.dispatcher.detach(name, body))
    }

    /// Pairwise collisions among the bodies attached to `name`
    ///
    /// Unknown and empty spaces give an empty list even before `init`.
    ///
    /// # Errors
    ///
    /// `NotInitialized` when the space has members but no world exists.
    pub fn query(&self, name: &str) -> SyncResult<Vec<CollisionPair>> {
        match self.dispatcher.find_space(name) {
            Some(detector) if !detector.is_empty() => {}
            _ => return Ok(Vec::new()),
        }
        let simulation = self.simulation()?;
        Ok(self.dispatcher.query(name, simulation, &self.bodies))
    }
}

impl std::fmt::Debug for PhysicsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsBridge")
            .field("initialized", &self.is_initialized())
            .field("tracked", &self.bodies.len())
            .field("spaces", &self.dispatcher.space_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{PhysicsBody, PhysicsCollider};
    use crate::ecs::Component;
    use crate::physics::BodyDesc;

    fn bridge() -> PhysicsBridge {
        let mut bridge = PhysicsBridge::kinematic(PhysicsConfig::default());
        bridge.init(800.0, 600.0, false).unwrap();
        bridge
    }

    fn body_entity(x: f64, y: f64) -> Entity {
        Entity::new("body").with_component(Component::PhysicsBody(PhysicsBody::new(
            BodyDesc::rectangle(x, y, 10.0, 10.0),
        )))
    }

    #[test]
    fn test_double_init_rejected() {
        let mut bridge = bridge();
        assert!(matches!(
            bridge.init(1.0, 1.0, false),
            Err(SyncError::AlreadyInitialized)
        ));
        assert_eq!(bridge.settings().unwrap().width, 800.0);
    }

    #[test]
    fn test_uninitialised_operations_surface() {
        let mut bridge = PhysicsBridge::kinematic(PhysicsConfig::default());
        let mut entities = vec![body_entity(0.0, 0.0)];

        assert!(matches!(
            bridge.add_bodies(&mut entities),
            Err(SyncError::NotInitialized { operation: "add_bodies" })
        ));
        assert!(matches!(
            bridge.snapshot(),
            Err(SyncError::NotInitialized { operation: "snapshot" })
        ));
        assert!(bridge.advance(16.0).is_err());
        // Unknown spaces are a not-found condition, not a usage error
        assert!(bridge.query("nowhere").unwrap().is_empty());
    }

    #[test]
    fn test_add_skips_entities_without_body() {
        let mut bridge = bridge();
        let mut entities = vec![Entity::new("label only"), body_entity(1.0, 2.0)];

        assert_eq!(bridge.add_bodies(&mut entities).unwrap(), 1);
        assert_eq!(bridge.tracked_count(), 1);
        assert!(bridge.body_of(entities[0].id()).is_none());

        let body = bridge.body_of(entities[1].id()).unwrap();
        assert_eq!(bridge.entity_of(body), Some(entities[1].id()));
        assert_eq!(
            entities[1].components().physics_body().unwrap().body(),
            Some(body)
        );
    }

    #[test]
    fn test_add_binds_collider() {
        let mut bridge = bridge();
        let mut entities = vec![body_entity(0.0, 0.0)
            .with_component(Component::PhysicsCollider(PhysicsCollider::new("ground")))];

        bridge.add_bodies(&mut entities).unwrap();
        let body = bridge.body_of(entities[0].id());
        assert_eq!(entities[0].components().collider().unwrap().body(), body);
    }

    #[test]
    fn test_readding_is_noop() {
        let mut bridge = bridge();
        let mut entities = vec![body_entity(0.0, 0.0)];
        bridge.add_bodies(&mut entities).unwrap();
        let body = bridge.body_of(entities[0].id());

        assert_eq!(bridge.add_bodies(&mut entities).unwrap(), 0);
        assert_eq!(bridge.tracked_count(), 1);
        assert_eq!(bridge.body_of(entities[0].id()), body);
    }

    #[test]
    fn test_remove_purges_spaces() {
        let mut bridge = bridge();
        let mut entities = vec![body_entity(0.0, 0.0), body_entity(5.0, 0.0)];
        bridge.add_bodies(&mut entities).unwrap();
        bridge.create_space("a").unwrap();
        bridge.create_space("b").unwrap();
        for name in ["a", "b"] {
            assert!(bridge.attach_to_space(name, entities[0].id()));
            assert!(bridge.attach_to_space(name, entities[1].id()));
        }
        let gone = bridge.body_of(entities[0].id()).unwrap();

        assert_eq!(bridge.remove_bodies(&entities[..1]).unwrap(), 1);
        assert!(bridge.dispatcher().spaces_containing(gone).is_empty());
        assert_eq!(bridge.find_space("a").unwrap().len(), 1);
        assert!(bridge.entity_of(gone).is_none());

        // A second removal is a silent no-op
        assert_eq!(bridge.remove_bodies(&entities[..1]).unwrap(), 0);
    }

    #[test]
    fn test_snapshot_covers_tracked_bodies() {
        let mut bridge = bridge();
        let mut entities = vec![
            body_entity(1.0, 2.0),
            Entity::new("visual only"),
            body_entity(3.0, 4.0),
        ];
        bridge.add_bodies(&mut entities).unwrap();

        let snapshot = bridge.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot[&entities[0].id()].position,
            Vector2::new(1.0, 2.0)
        );
        assert!(!snapshot.contains_key(&entities[1].id()));
        drop(snapshot);

        // The pooled buffer comes back empty
        bridge.remove_bodies(&entities).unwrap();
        assert!(bridge.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_is_resting() {
        let mut bridge = bridge();
        let mut entities = vec![
            body_entity(0.0, 0.0),
            Entity::new("floor").with_component(Component::PhysicsBody(PhysicsBody::new(
                BodyDesc::rectangle(0.0, 100.0, 100.0, 10.0).with_static(true),
            ))),
        ];
        bridge.add_bodies(&mut entities).unwrap();

        assert!(!bridge.is_resting(bridge.body_of(entities[0].id()).unwrap()));
        assert!(bridge.is_resting(bridge.body_of(entities[1].id()).unwrap()));
        assert!(!bridge.is_resting(BodyId::new(999)));
    }

    #[test]
    fn test_advance_moves_bodies() {
        let mut bridge = bridge();
        let mut entities = vec![body_entity(0.0, 0.0)];
        bridge.add_bodies(&mut entities).unwrap();

        let steps = bridge.advance(100.0).unwrap();
        assert!(steps > 0);
        let snapshot = bridge.snapshot().unwrap();
        assert!(snapshot[&entities[0].id()].position.y > 0.0);
    }

    #[test]
    fn test_debug_mode_toggle() {
        let mut bridge = bridge();
        assert!(!bridge.debug_enabled());
        assert!(bridge.debug_frame().is_none());

        bridge.set_debug_mode(true);
        let frame = bridge.debug_frame().unwrap();
        assert_eq!(frame.width, 800.0);

        bridge.set_debug_mode(false);
        assert!(bridge.debug_frame().is_none());
    }

    #[test]
    fn test_attach_without_body() {
        let mut bridge = bridge();
        bridge.create_space("s").unwrap();
        assert!(!bridge.attach_to_space("s", EntityId::new(42)));
        assert!(!bridge.detach_from_space("s", EntityId::new(42)));
        assert!(bridge.query("s").unwrap().is_empty());
    }
}
