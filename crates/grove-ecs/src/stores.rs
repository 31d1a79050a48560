//! Store registry - lazily created component stores keyed by component id.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    component::{Component, ComponentId},
    entity::EntityId,
    error::{Error, Result},
    storage::{AnyStore, ComponentStore},
};

/// Owns one [`ComponentStore`] per component type used in a world.
///
/// Stores are created on first use and live until the registry is dropped.
/// Slots are dense in creation order; `index` maps a component id to its slot.
pub struct StoreRegistry {
    stores: Vec<Box<dyn AnyStore>>,
    index: FxHashMap<ComponentId, usize>,
    max_types: usize,
    max_entities: usize,
    max_components: usize,
}

impl StoreRegistry {
    /// Create an empty registry.
    ///
    /// Every store it creates covers entity ids below `max_entities` and
    /// holds at most `max_components` components.
    #[must_use]
    pub fn new(max_types: usize, max_entities: usize, max_components: usize) -> Self {
        Self {
            stores: Vec::with_capacity(max_types),
            index: FxHashMap::default(),
            max_types,
            max_entities,
            max_components,
        }
    }

    /// Get the store for `T`, creating it if needed.
    ///
    /// Returns the component id and whether the store was just created.
    pub fn ensure<T: Component>(&mut self) -> Result<(ComponentId, bool)> {
        let id = ComponentId::of::<T>();
        if self.index.contains_key(&id) {
            return Ok((id, false));
        }
        if self.stores.len() >= self.max_types {
            return Err(Error::ComponentTypeCapacity {
                capacity: self.max_types,
            });
        }

        let store = ComponentStore::<T>::new(self.max_entities, self.max_components);
        debug!(
            component = ?id,
            name = store.info().name(),
            capacity = self.max_components,
            "component store created"
        );

        self.index.insert(id, self.stores.len());
        self.stores.push(Box::new(store));
        Ok((id, true))
    }

    /// Get the typed store for `T`, if it exists.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.get_dyn(ComponentId::of::<T>())?
            .as_any()
            .downcast_ref()
    }

    /// Get the typed store for `T` mutably, if it exists.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.get_dyn_mut(ComponentId::of::<T>())?
            .as_any_mut()
            .downcast_mut()
    }

    /// Get a store by component id.
    #[must_use]
    pub fn get_dyn(&self, id: ComponentId) -> Option<&dyn AnyStore> {
        let &slot = self.index.get(&id)?;
        Some(&*self.stores[slot])
    }

    /// Get a store by component id, mutably.
    #[must_use]
    pub fn get_dyn_mut(&mut self, id: ComponentId) -> Option<&mut dyn AnyStore> {
        let &slot = self.index.get(&id)?;
        Some(&mut *self.stores[slot])
    }

    /// Check if `entity` has component `id`. Missing stores hold nothing.
    #[must_use]
    pub fn has(&self, id: ComponentId, entity: EntityId) -> bool {
        self.get_dyn(id).is_some_and(|store| store.has(entity))
    }

    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterate over stores in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn AnyStore> {
        self.stores.iter().map(|store| &**store)
    }

    /// Get the number of stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Maximum number of distinct component types.
    #[must_use]
    pub const fn max_types(&self) -> usize {
        self.max_types
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("count", &self.stores.len())
            .field("max_types", &self.max_types)
            .field("stores", &self.stores.iter().map(|s| s.info()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position {
        x: f32,
        y: f32,
    }

    struct Velocity {
        x: f32,
        y: f32,
    }

    struct Health(u32);

    #[test]
    fn test_lazy_creation() {
        let mut registry = StoreRegistry::new(8, 16, 16);
        assert!(registry.get::<Position>().is_none());

        let (id, created) = registry.ensure::<Position>().unwrap();
        assert!(created);
        assert_eq!(id, ComponentId::of::<Position>());

        let (again, created) = registry.ensure::<Position>().unwrap();
        assert!(!created);
        assert_eq!(again, id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_typed_and_erased_access_agree() {
        let mut registry = StoreRegistry::new(8, 16, 16);
        registry.ensure::<Position>().unwrap();

        registry
            .get_mut::<Position>()
            .unwrap()
            .create(2, Position { x: 1.0, y: 1.0 })
            .unwrap();

        let id = ComponentId::of::<Position>();
        assert!(registry.has(id, 2));
        assert!(!registry.has(id, 3));
        assert!(!registry.has(ComponentId::of::<Velocity>(), 2));
        assert_eq!(registry.get_dyn(id).unwrap().entities(), &[2]);
    }

    #[test]
    fn test_type_capacity() {
        let mut registry = StoreRegistry::new(2, 16, 16);
        registry.ensure::<Position>().unwrap();
        registry.ensure::<Velocity>().unwrap();

        assert_eq!(
            registry.ensure::<Health>(),
            Err(Error::ComponentTypeCapacity { capacity: 2 })
        );
        // Existing types are still reachable at capacity.
        assert!(registry.ensure::<Position>().is_ok());
    }
}
