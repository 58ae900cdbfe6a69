//! Normalized, keyed entity storage with a sorted read view.
//!
//! Records are stored once by id; a separate id list is kept in comparer
//! order so reads never need to sort. [`CacheState`] pairs the collection
//! with the request flags a front-end renders from.

use std::{cmp::Ordering, collections::HashMap, fmt, hash::Hash};

use thiserror::Error;
use tracing::warn;

pub trait Entity: Clone {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display;
    /// Partial update merged into an existing record by [`EntityCache::patch_one`].
    type Changes;

    fn id(&self) -> &Self::Id;

    /// Ordering of the sorted read view.
    fn sort_cmp(&self, other: &Self) -> Ordering;

    /// Must not change the record's id.
    fn apply_changes(&mut self, changes: Self::Changes);

    /// Records without a usable identity are refused by the cache.
    fn has_identity(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("no entity with id {id}")]
    NotFound { id: String },
}

#[derive(Debug, Clone)]
pub struct EntityCache<E: Entity> {
    ids: Vec<E::Id>,
    entities: HashMap<E::Id, E>,
}

impl<E: Entity> Default for EntityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityCache<E> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            entities: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in sorted read order.
    pub fn ids(&self) -> &[E::Id] {
        &self.ids
    }

    pub fn by_id(&self, id: &E::Id) -> Option<&E> {
        self.entities.get(id)
    }

    pub fn all_sorted(&self) -> impl Iterator<Item = &E> + '_ {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }

    /// Inserts the record, or replaces the stored record with the same id.
    /// Returns `false` when the record was refused for lacking an identity.
    pub fn upsert_one(&mut self, entity: E) -> bool {
        if !entity.has_identity() {
            warn!("refusing entity without identity");
            return false;
        }
        let id = entity.id().clone();
        if self.entities.insert(id.clone(), entity).is_some() {
            self.unlink(&id);
        }
        self.link_sorted(id);
        true
    }

    pub fn upsert_many(&mut self, entities: impl IntoIterator<Item = E>) {
        for entity in entities {
            self.upsert_one(entity);
        }
    }

    /// Inserts only when the id is not cached yet; returns whether it was inserted.
    pub fn add_one(&mut self, entity: E) -> bool {
        if self.entities.contains_key(entity.id()) {
            return false;
        }
        self.upsert_one(entity)
    }

    pub fn add_many(&mut self, entities: impl IntoIterator<Item = E>) {
        for entity in entities {
            self.add_one(entity);
        }
    }

    /// Replaces the whole collection.
    pub fn set_all(&mut self, entities: impl IntoIterator<Item = E>) {
        self.remove_all();
        self.upsert_many(entities);
    }

    pub fn remove_one(&mut self, id: &E::Id) -> Option<E> {
        let removed = self.entities.remove(id)?;
        self.unlink(id);
        Some(removed)
    }

    pub fn remove_all(&mut self) {
        self.ids.clear();
        self.entities.clear();
    }

    pub fn patch_one(&mut self, id: &E::Id, changes: E::Changes) -> Result<(), CacheError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CacheError::NotFound { id: id.to_string() })?;
        entity.apply_changes(changes);
        self.unlink(id);
        self.link_sorted(id.clone());
        Ok(())
    }

    fn unlink(&mut self, id: &E::Id) {
        if let Some(position) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(position);
        }
    }

    // Lands after every record comparing equal, so ties keep write order.
    fn link_sorted(&mut self, id: E::Id) {
        let entities = &self.entities;
        let Some(entity) = entities.get(&id) else {
            return;
        };
        let position = self.ids.partition_point(|existing| {
            entities
                .get(existing)
                .map_or(true, |other| other.sort_cmp(entity) != Ordering::Greater)
        });
        self.ids.insert(position, id);
    }
}

/// Entity collection plus list-request flags.
#[derive(Debug, Clone)]
pub struct CacheState<E: Entity> {
    entities: EntityCache<E>,
    loading: bool,
    error: Option<String>,
}

impl<E: Entity> Default for CacheState<E> {
    fn default() -> Self {
        Self {
            entities: EntityCache::new(),
            loading: false,
            error: None,
        }
    }
}

impl<E: Entity> CacheState<E> {
    pub fn entities(&self) -> &EntityCache<E> {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityCache<E> {
        &mut self.entities
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
