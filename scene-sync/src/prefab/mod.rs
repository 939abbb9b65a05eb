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
//! Prefabs: templated entity construction
//!
//! [`Prefab::generate`] always returns a [`PrefabTicket`]. Synchronous
//! prefabs hand back a ticket that is already resolved; asynchronous ones
//! resolve it later, once their backing resource is ready. Tickets are
//! usually passed to [`FrameDriver::spawn`](crate::driver::FrameDriver::spawn)
//! which adds the entity at the start of the first tick after it resolves.

mod geometry;
mod sprite;

pub use geometry::GeometryPrefab;
pub use sprite::{AsyncSpritePrefab, ResourceStatus};

use crate::ecs::Entity;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// Where and how to instantiate a prefab
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrefabParams {
    /// Horizontal centre
    pub x: f64,
    /// Vertical centre
    pub y: f64,
    /// Collision space for the collider, if any
    pub space: Option<String>,
}

impl PrefabParams {
    /// Instantiate at `(x, y)` without a collider
    pub fn at(x: f64, y: f64) -> Self {
        PrefabParams { x, y, space: None }
    }

    /// Give the entity a collider in `space`
    pub fn in_space(mut self, space: impl Into<String>) -> Self {
        self.space = Some(space.into());
        self
    }
}

/// Factory of fully composed entities
pub trait Prefab {
    /// Label given to generated entities, also used as their prefab tag
    fn label(&self) -> &str;

    /// Request an entity
    fn generate(&mut self, params: PrefabParams) -> PrefabTicket;
}

/// Claim on an entity a prefab has produced or will produce
///
/// A ticket resolves at most once. Dropping it discards the entity.
#[derive(Debug)]
pub struct PrefabTicket {
    receiver: Receiver<Entity>,
    resolved: Option<Entity>,
}

impl PrefabTicket {
    /// A ticket already holding `entity`
    pub fn ready(entity: Entity) -> Self {
        let (sender, ticket) = Self::pending();
        deliver(&sender, entity);
        ticket
    }

    /// An unresolved ticket and the sender that resolves it
    pub fn pending() -> (Sender<Entity>, Self) {
        let (sender, receiver) = bounded(1);
        (
            sender,
            PrefabTicket {
                receiver,
                resolved: None,
            },
        )
    }

    /// Whether the entity is waiting to be taken
    pub fn is_ready(&mut self) -> bool {
        self.pull().is_ok()
    }

    /// Whether nothing is waiting and the producer is gone
    pub fn is_abandoned(&mut self) -> bool {
        matches!(self.pull(), Err(TryRecvError::Disconnected))
    }

    /// Take the entity if it has been produced
    pub fn try_take(&mut self) -> Option<Entity> {
        // An empty or disconnected channel just leaves the slot empty
        let _ = self.pull();
        self.resolved.take()
    }

    /// Block until the entity is produced; `None` if the producer went away
    pub fn wait(mut self) -> Option<Entity> {
        match self.resolved.take() {
            Some(entity) => Some(entity),
            None => self.receiver.recv().ok(),
        }
    }

    fn pull(&mut self) -> Result<(), TryRecvError> {
        if self.resolved.is_none() {
            self.resolved = Some(self.receiver.try_recv()?);
        }
        Ok(())
    }
}

/// Send `entity` to a ticket, logging if the ticket was dropped
pub(crate) fn deliver(sender: &Sender<Entity>, entity: Entity) {
    let id = entity.id();
    if sender.send(entity).is_err() {
        log::debug!("prefab ticket for {} was dropped before delivery", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_ticket() {
        let entity = Entity::new("made");
        let id = entity.id();
        let mut ticket = PrefabTicket::ready(entity);

        assert!(ticket.is_ready());
        assert_eq!(ticket.try_take().map(|e| e.id()), Some(id));
        assert!(ticket.try_take().is_none());
    }

    #[test]
    fn test_pending_ticket() {
        let (sender, mut ticket) = PrefabTicket::pending();
        assert!(!ticket.is_ready());
        assert!(!ticket.is_abandoned());

        deliver(&sender, Entity::new("late"));
        assert!(ticket.is_ready());
        assert_eq!(ticket.wait().unwrap().label(), "late");
    }

    #[test]
    fn test_abandoned_ticket() {
        let (sender, mut ticket) = PrefabTicket::pending();
        drop(sender);
        assert!(ticket.is_abandoned());
        assert!(ticket.try_take().is_none());
    }

    #[test]
    fn test_params_builder() {
        let params = PrefabParams::at(1.0, 2.0).in_space("ground");
        assert_eq!(params.space.as_deref(), Some("ground"));
    }
}
