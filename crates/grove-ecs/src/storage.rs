//! Component storage - one sparse set plus a parallel dense value array per
//! component type.
//!
//! `values[set.index_of(e)]` is entity `e`'s component for every entity in
//! the set. Removal swap-fills both arrays with the same move, so iteration
//! over `entities()` and `values()` stays packed and aligned.
//!
//! Zero-sized components (tags) go through the same code: a `Vec` of a
//! zero-sized type never allocates and every element reference points at the
//! same dangling address, so a tag store carries presence only.

use std::any::Any;

use crate::{
    component::{Component, ComponentId, ComponentInfo},
    entity::EntityId,
    error::{Error, Result},
    observer::{Observers, Subscription},
    sparse_set::SparseSet,
};

/// Storage for all components of type `T`.
pub struct ComponentStore<T> {
    info: ComponentInfo,
    set: SparseSet,
    values: Vec<T>,
    observers: Observers<Subscription>,
}

impl<T: Component> ComponentStore<T> {
    /// Create a store for entity ids below `max_entities` holding at most
    /// `capacity` components.
    #[must_use]
    pub fn new(max_entities: usize, capacity: usize) -> Self {
        Self {
            info: ComponentInfo::of::<T>(),
            set: SparseSet::new(max_entities, capacity),
            values: Vec::with_capacity(capacity),
            observers: Observers::new(),
        }
    }

    /// Attach a component to an entity.
    ///
    /// Does not notify observers; [`crate::World::create_component`] does.
    pub fn create(&mut self, entity: EntityId, value: T) -> Result<&mut T> {
        if self.set.contains(entity) {
            return Err(Error::DuplicateComponent {
                entity,
                component: self.info.id(),
            });
        }
        if self.set.is_full() {
            return Err(Error::ComponentCapacity {
                component: self.info.id(),
                capacity: self.set.dense_capacity(),
            });
        }

        let index = self.set.insert(entity)?;
        debug_assert_eq!(index, self.values.len());
        self.values.push(value);
        Ok(&mut self.values[index])
    }

    /// Detach and return an entity's component.
    pub fn remove(&mut self, entity: EntityId) -> Result<T> {
        if !self.set.contains(entity) {
            return Err(self.missing(entity));
        }

        let moved = self.set.remove(entity)?;
        debug_assert_eq!(moved.last, self.values.len() - 1);
        Ok(self.values.swap_remove(moved.vacated))
    }

    /// Remove an entity's component if it has one.
    pub fn try_remove(&mut self, entity: EntityId) -> Option<T> {
        self.remove(entity).ok()
    }

    /// Check if an entity has this component.
    #[must_use]
    pub fn has(&self, entity: EntityId) -> bool {
        self.set.contains(entity)
    }

    /// Get an entity's component.
    pub fn get(&self, entity: EntityId) -> Result<&T> {
        match self.set.index_of(entity) {
            Some(index) => Ok(&self.values[index]),
            None => Err(self.missing(entity)),
        }
    }

    /// Get an entity's component mutably.
    pub fn get_mut(&mut self, entity: EntityId) -> Result<&mut T> {
        match self.set.index_of(entity) {
            Some(index) => Ok(&mut self.values[index]),
            None => Err(self.missing(entity)),
        }
    }

    /// Overwrite an existing component, returning the previous value.
    pub fn set(&mut self, entity: EntityId, value: T) -> Result<T> {
        self.get_mut(entity)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Entities with this component, in dense order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        self.set.entries()
    }

    /// Component values, aligned with [`Self::entities`].
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.set.entries().iter().copied().zip(self.values.iter())
    }

    /// Dense position of an entity's component.
    #[must_use]
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.set.index_of(entity)
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.info.id()
    }

    #[must_use]
    pub const fn info(&self) -> &ComponentInfo {
        &self.info
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Maximum number of components this store holds.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.set.dense_capacity()
    }

    /// Whether `T` is a zero-sized tag.
    #[must_use]
    pub const fn is_tag(&self) -> bool {
        self.info.is_tag()
    }

    /// Groups watching this store.
    #[must_use]
    pub const fn observers(&self) -> &Observers<Subscription> {
        &self.observers
    }

    fn missing(&self, entity: EntityId) -> Error {
        Error::MissingComponent {
            entity,
            component: self.info.id(),
        }
    }
}

impl<T> std::fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("info", &self.info)
            .field("len", &self.set.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Type-erased view of a [`ComponentStore`], used by the store registry,
/// by groups and by entity cleanup.
pub trait AnyStore: Any + Send + Sync {
    /// Component type information.
    fn info(&self) -> &ComponentInfo;

    /// Check if an entity has this component.
    fn has(&self, entity: EntityId) -> bool;

    /// Entities with this component, in dense order.
    fn entities(&self) -> &[EntityId];

    /// Get the number of entities in storage.
    fn len(&self) -> usize;

    /// Check if storage is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and drop an entity's component.
    fn remove_entity(&mut self, entity: EntityId) -> Result<()>;

    fn observers(&self) -> &Observers<Subscription>;

    fn observers_mut(&mut self) -> &mut Observers<Subscription>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn has(&self, entity: EntityId) -> bool {
        self.set.contains(entity)
    }

    fn entities(&self) -> &[EntityId] {
        self.set.entries()
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn remove_entity(&mut self, entity: EntityId) -> Result<()> {
        self.remove(entity).map(drop)
    }

    fn observers(&self) -> &Observers<Subscription> {
        &self.observers
    }

    fn observers_mut(&mut self) -> &mut Observers<Subscription> {
        &mut self.observers
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
