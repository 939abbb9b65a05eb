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
//! Entity storage
//!
//! Entities live in a dense `Vec` with an id-to-index map beside it.
//! Removal swaps the last entity into the hole and patches its index, so
//! iteration stays cache-friendly and lookups stay O(1).

use crate::ecs::{Entity, EntityId};
use std::collections::HashMap;

/// Owns every entity in a world
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
}

impl EntityRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity unless one with the same id is present
    ///
    /// On a duplicate the entity is handed back unchanged.
    pub fn insert(&mut self, entity: Entity) -> Result<(), Entity> {
        if self.index.contains_key(&entity.id()) {
            return Err(entity);
        }
        self.index.insert(entity.id(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Remove and return an entity; absent ids are a no-op
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index.remove(&id)?;
        let entity = self.entities.swap_remove(index);
        if let Some(moved) = self.entities.get(index) {
            self.index.insert(moved.id(), index);
        }
        Some(entity)
    }

    /// Look up by id
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    /// Look up by id, mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.index.get(&id) {
            Some(&i) => self.entities.get_mut(i),
            None => None,
        }
    }

    /// Check membership
    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Entities with the given label
    pub fn find_by_label(&self, label: &str) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.label() == label).collect()
    }

    /// Entities made by the given prefab
    pub fn find_by_prefab(&self, prefab: &str) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.prefab() == prefab).collect()
    }

    /// Every entity in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// Every entity in storage order, mutably
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entities.iter_mut()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
