//! Game entity system with simple integer IDs
//!
//! Card instances live in a single arena owned by the game state and are
//! referenced everywhere else (zones, attachments, pending selections) by id.
//! Zone membership is therefore a single authoritative update instead of
//! aliasing the same object from several places.

use crate::{EngineError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed integer ID for game entities
///
/// The type parameter only exists at compile time so a `CardId` can never be
/// passed where a `PlayerId` is expected. IDs are stable for the whole game;
/// entities are never deallocated.
pub struct EntityId<T> {
    id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub const fn new(id: u32) -> Self {
        EntityId {
            id,
            _marker: PhantomData,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.id
    }

    fn index(&self) -> usize {
        self.id as usize
    }
}

// Manual impls so that no bounds are placed on `T`.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.id)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(EntityId::new)
    }
}

/// Base trait for all game entities
pub trait GameEntity<T> {
    fn id(&self) -> EntityId<T>;
    fn name(&self) -> &str;
}

/// Arena storage for all entities of one kind
///
/// IDs are dense indices into the arena, which keeps iteration and
/// serialization order identical on every machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: Vec<T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore { entities: Vec::new() }
    }

    /// The id the next inserted entity will receive
    pub fn next_id(&self) -> EntityId<T> {
        EntityId::new(self.entities.len() as u32)
    }

    /// Insert an entity built from its freshly allocated id
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId<T>) -> T) -> EntityId<T> {
        let id = self.next_id();
        self.entities.push(build(id));
        id
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId<T>) -> Result<&T> {
        self.entities
            .get(id.index())
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: EntityId<T>) -> Result<&mut T> {
        self.entities
            .get_mut(id.index())
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId<T>) -> bool {
        id.index() < self.entities.len()
    }

    /// Iterate over all entities in id order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId<T>, &T)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(idx, entity)| (EntityId::new(idx as u32), entity))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestEntity {
        id: EntityId<TestEntity>,
        name: String,
    }

    impl GameEntity<TestEntity> for TestEntity {
        fn id(&self) -> EntityId<TestEntity> {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_entity_store() {
        let mut store = EntityStore::new();
        let id1 = store.insert_with(|id| TestEntity {
            id,
            name: "Test1".to_string(),
        });
        let id2 = store.insert_with(|id| TestEntity {
            id,
            name: "Test2".to_string(),
        });

        assert_eq!(id1.as_u32(), 0);
        assert_eq!(id2.as_u32(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id2).unwrap().name(), "Test2");
        assert_eq!(store.get(id1).unwrap().id(), id1);
        assert!(store.get(EntityId::new(7)).is_err());
    }

    #[test]
    fn test_entity_id_serializes_as_integer() {
        let id: EntityId<TestEntity> = EntityId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: EntityId<TestEntity> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
