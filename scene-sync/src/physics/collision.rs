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
//! Named collision spaces
//!
//! A collision space is an explicitly managed group of bodies that are tested
//! against each other on demand. Bodies not attached to a space are never
//! reported by its query, no matter what they overlap.

use crate::ecs::EntityId;
use crate::error::{SyncError, SyncResult};
use crate::physics::{BodyId, BodyMap, CollisionRecord, Simulation};
use std::collections::BTreeMap;

/// Ordered set of bodies visible to one collision space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detector {
    name: String,
    bodies: Vec<BodyId>,
}

impl Detector {
    /// Create an empty detector
    pub fn new(name: impl Into<String>) -> Self {
        Detector {
            name: name.into(),
            bodies: Vec::new(),
        }
    }

    /// Name of the space
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bodies in attachment order
    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    /// Check membership
    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    /// Number of attached bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Check if no body is attached
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Append a body; attaching twice is a no-op returning false
    pub fn attach(&mut self, body: BodyId) -> bool {
        if self.contains(body) {
            return false;
        }
        self.bodies.push(body);
        true
    }

    /// Remove exactly one matching body; absent bodies are a no-op
    pub fn detach(&mut self, body: BodyId) -> bool {
        match self.bodies.iter().position(|&b| b == body) {
            Some(index) => {
                self.bodies.remove(index);
                true
            }
            None => false,
        }
    }
}

/// A collision translated back to entities
///
/// Either endpoint is `None` when its body no longer belongs to an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    /// Entity owning `record.body_a`
    pub entity_a: Option<EntityId>,
    /// Entity owning `record.body_b`
    pub entity_b: Option<EntityId>,
    /// Raw record from the simulation
    pub record: CollisionRecord,
}

impl CollisionPair {
    /// Check whether the pair involves `entity`
    pub fn involves(&self, entity: EntityId) -> bool {
        self.entity_a == Some(entity) || self.entity_b == Some(entity)
    }

    /// The endpoint opposite `entity`, if `entity` takes part
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.entity_a == Some(entity) {
            self.entity_b
        } else if self.entity_b == Some(entity) {
            self.entity_a
        } else {
            None
        }
    }
}

/// Registry of named detectors
#[derive(Debug, Default)]
pub struct CollisionDispatcher {
    spaces: BTreeMap<String, Detector>,
}

impl CollisionDispatcher {
    /// Create a dispatcher with no spaces
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty space
    ///
    /// # Errors
    ///
    /// `DuplicateSpace` if the name is taken; the existing space is kept.
    pub fn create_space(&mut self, name: &str) -> SyncResult<&mut Detector> {
        if self.spaces.contains_key(name) {
            return Err(SyncError::DuplicateSpace(name.to_string()));
        }
        log::debug!("created collision space '{}'", name);
        Ok(self
            .spaces
            .entry(name.to_string())
            .or_insert_with(|| Detector::new(name)))
    }

    /// Look up a space
    pub fn find_space(&self, name: &str) -> Option<&Detector> {
        self.spaces.get(name)
    }

    /// Names of all spaces in sorted order
    pub fn space_names(&self) -> impl Iterator<Item = &str> {
        self.spaces.keys().map(String::as_str)
    }

    /// Number of registered spaces
    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    /// Attach a body to a space
    ///
    /// Returns false if the space is unknown or the body is already attached.
    pub fn attach(&mut self, name: &str, body: BodyId) -> bool {
        match self.spaces.get_mut(name) {
            Some(detector) => detector.attach(body),
            None => {
                log::warn!("attach of {} to unknown collision space '{}'", body, name);
                false
            }
        }
    }

    /// Detach a body from a space; unknown space or body is a no-op
    pub fn detach(&mut self, name: &str, body: BodyId) -> bool {
        self.spaces
            .get_mut(name)
            .map(|detector| detector.detach(body))
            .unwrap_or(false)
    }

    /// Remove a body from every space, returning how many referenced it
    pub fn purge(&mut self, body: BodyId) -> usize {
        self.spaces
            .values_mut()
            .map(|detector| detector.detach(body))
            .filter(|&removed| removed)
            .count()
    }

    /// Spaces that currently reference a body
    pub fn spaces_containing(&self, body: BodyId) -> Vec<&str> {
        self.spaces
            .values()
            .filter(|detector| detector.contains(body))
            .map(Detector::name)
            .collect()
    }

    /// Run a pairwise test over exactly the bodies attached to `name`
    ///
    /// Unknown or empty spaces yield an empty list without touching the
    /// simulation.
    pub fn query(&self, name: &str, simulation: &dyn Simulation, map: &BodyMap) -> Vec<CollisionPair> {
        let detector = match self.spaces.get(name) {
            Some(d) if !d.is_empty() => d,
            _ => return Vec::new(),
        };

        simulation
            .pairwise_collisions(detector.bodies())
            .into_iter()
            .map(|record| CollisionPair {
                entity_a: map.entity_of(record.body_a),
                entity_b: map.entity_of(record.body_b),
                record,
            })
            .collect()
    }
}
