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
//! Bidirectional entity/body map
//!
//! Links are stored densely and indexed from both sides, so the forward and
//! reverse lookups can never disagree:
//!
//! ```text
//! links:       [ (e3, b7), (e1, b2), (e9, b4) ]
//! by_entity:   { e3 -> 0, e1 -> 1, e9 -> 2 }
//! by_body:     { b7 -> 0, b2 -> 1, b4 -> 2 }
//! ```
//!
//! Removal swaps the last link into the hole and patches both indices.

use crate::ecs::EntityId;
use crate::physics::BodyId;
use std::collections::HashMap;

/// One entity/body association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyLink {
    /// Owning entity
    pub entity: EntityId,
    /// Simulation body
    pub body: BodyId,
}

/// Arena of entity/body links addressable by either id
#[derive(Debug, Default)]
pub struct BodyMap {
    links: Vec<BodyLink>,
    by_entity: HashMap<EntityId, usize>,
    by_body: HashMap<BodyId, usize>,
}

impl BodyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of linked pairs
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Check if nothing is linked
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Link an entity to a body
    ///
    /// Returns false, leaving the map untouched, if either side is
    /// already linked.
    pub fn link(&mut self, entity: EntityId, body: BodyId) -> bool {
        if self.by_entity.contains_key(&entity) || self.by_body.contains_key(&body) {
            return false;
        }

        let index = self.links.len();
        self.links.push(BodyLink { entity, body });
        self.by_entity.insert(entity, index);
        self.by_body.insert(body, index);

        debug_assert_eq!(self.by_entity.len(), self.links.len());
        debug_assert_eq!(self.by_body.len(), self.links.len());
        true
    }

    /// Remove the link owned by `entity`, returning its body
    pub fn unlink_entity(&mut self, entity: EntityId) -> Option<BodyId> {
        let index = *self.by_entity.get(&entity)?;
        Some(self.remove_at(index).body)
    }

    fn remove_at(&mut self, index: usize) -> BodyLink {
        let removed = self.links.swap_remove(index);
        self.by_entity.remove(&removed.entity);
        self.by_body.remove(&removed.body);

        // The former last link now lives at `index`
        if let Some(moved) = self.links.get(index) {
            self.by_entity.insert(moved.entity, index);
            self.by_body.insert(moved.body, index);
        }

        debug_assert_eq!(self.by_entity.len(), self.links.len());
        debug_assert_eq!(self.by_body.len(), self.links.len());
        removed
    }

    /// Body linked to an entity
    pub fn body_of(&self, entity: EntityId) -> Option<BodyId> {
        self.by_entity.get(&entity).map(|&i| self.links[i].body)
    }

    /// Entity linked to a body
    pub fn entity_of(&self, body: BodyId) -> Option<EntityId> {
        self.by_body.get(&body).map(|&i| self.links[i].entity)
    }

    /// Check whether an entity has a linked body
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.by_entity.contains_key(&entity)
    }

    /// Dense slice of all links
    pub fn links(&self) -> &[BodyLink] {
        &self.links
    }
}
