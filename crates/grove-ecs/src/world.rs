//! World - the composition root owning entities, stores and groups.
//!
//! Every component mutation goes through the world, which forwards the
//! store event to the groups watching that store before returning. Group
//! contents are therefore exact after each call; there is no deferred
//! refresh step.

use tracing::{debug, trace};

use crate::{
    command::CommandBuffer,
    component::{Component, ComponentId},
    config::WorldConfig,
    entity::{EntityHandle, EntityId, EntityRegistry},
    error::{Error, Result},
    group::{Group, GroupId, GroupRegistry},
    observer::StoreEvent,
    signature::Signature,
    storage::ComponentStore,
    stores::StoreRegistry,
};

/// The ECS world.
pub struct World {
    // Fields drop in declaration order: groups release their subscriptions
    // before the stores go, and stores go before the entity registry.
    groups: GroupRegistry,
    stores: StoreRegistry,
    entities: EntityRegistry,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a world with the default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::build(WorldConfig::default())
    }

    /// Create a world with explicit bounds.
    pub fn with_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        debug!(?config, "world created");
        Self {
            groups: GroupRegistry::new(config.max_groups, config.max_entities),
            stores: StoreRegistry::new(
                config.max_component_types,
                config.max_entities,
                config.max_components,
            ),
            entities: EntityRegistry::new(config.max_entities),
            config,
        }
    }

    // ==================== Entity Operations ====================

    /// Allocate an entity id.
    pub fn create_entity(&mut self) -> Result<EntityId> {
        self.entities.create()
    }

    /// Allocate an entity and return a handle that survives recycling checks.
    pub fn create_boxed(&mut self) -> Result<EntityHandle> {
        self.entities.create_boxed()
    }

    /// Create an entity with one component.
    ///
    /// If the component cannot be created the entity is removed again. The
    /// rollback bumps that id's generation like any other removal; no handle
    /// to it was ever returned, so nothing observes the change.
    pub fn spawn<T: Component>(&mut self, component: T) -> Result<EntityId> {
        let entity = self.create_entity()?;
        let created = self.create_component(entity, component).map(|_| ());
        if let Err(error) = created {
            // Roll back so a failed spawn does not leak an empty entity.
            self.entities.remove(entity)?;
            return Err(error);
        }
        Ok(entity)
    }

    /// Destroy an entity, removing every component it has.
    ///
    /// Each removal is announced to the groups watching that store, so the
    /// entity leaves every group before its id is recycled.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        self.check_alive(entity)?;

        for &component in self.entities.removal_listeners() {
            let Some(store) = self.stores.get_dyn_mut(component) else {
                continue;
            };
            if !store.has(entity) {
                continue;
            }
            store.remove_entity(entity)?;
            self.groups
                .notify(&self.stores, component, StoreEvent::Removed, entity);
        }

        self.entities.remove(entity)?;
        debug!(entity, "entity destroyed");
        Ok(())
    }

    /// Destroy the entity behind a handle if the handle is still current.
    ///
    /// A stale handle is not an error and yields `Ok(false)`.
    pub fn destroy_boxed(&mut self, handle: EntityHandle) -> Result<bool> {
        match self.entities.try_unbox(handle) {
            Some(entity) => self.destroy_entity(entity).map(|()| true),
            None => Ok(false),
        }
    }

    /// Check if an entity is alive.
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Pair a live entity with its current generation.
    pub fn box_entity(&self, entity: EntityId) -> Result<EntityHandle> {
        self.entities.box_entity(entity)
    }

    /// Resolve a handle, or `None` if its entity was removed or recycled.
    #[must_use]
    pub fn try_unbox(&self, handle: EntityHandle) -> Option<EntityId> {
        self.entities.try_unbox(handle)
    }

    /// Get the number of alive entities.
    #[must_use]
    pub const fn entity_count(&self) -> u32 {
        self.entities.alive_count()
    }

    // ==================== Component Operations ====================

    /// Create the store for `T` ahead of first use.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId> {
        let (id, created) = self.stores.ensure::<T>()?;
        if created {
            self.groups.attach(id, &mut self.stores);
            self.entities.listen_removed(id);
        }
        Ok(id)
    }

    /// Attach a component to a live entity.
    pub fn create_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<&mut T> {
        self.check_alive(entity)?;
        let id = self.register::<T>()?;
        self.store_mut::<T>(entity)?.create(entity, value)?;
        trace!(entity, component = ?id, "component created");

        self.groups
            .notify(&self.stores, id, StoreEvent::Created, entity);
        self.get_component_mut(entity)
    }

    /// Attach a clone of `source`'s component to `entity`.
    pub fn create_component_from<T: Component + Clone>(
        &mut self,
        entity: EntityId,
        source: EntityId,
    ) -> Result<&mut T> {
        let value = self.get_component::<T>(source)?.clone();
        self.create_component(entity, value)
    }

    /// Detach and return a component.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<T> {
        self.check_alive(entity)?;
        let value = self.store_mut::<T>(entity)?.remove(entity)?;
        let id = ComponentId::of::<T>();
        trace!(entity, component = ?id, "component removed");

        self.groups
            .notify(&self.stores, id, StoreEvent::Removed, entity);
        Ok(value)
    }

    /// Remove a component if the entity has one.
    pub fn try_remove_component<T: Component>(&mut self, entity: EntityId) -> Result<Option<T>> {
        self.check_alive(entity)?;
        if !self.has_component::<T>(entity) {
            return Ok(None);
        }
        self.remove_component(entity).map(Some)
    }

    /// Get a component reference.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Result<&T> {
        self.stores
            .get::<T>()
            .ok_or_else(|| missing::<T>(entity))?
            .get(entity)
    }

    /// Get a mutable component reference. Groups are not notified.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T> {
        self.store_mut::<T>(entity)?.get_mut(entity)
    }

    /// Check if an entity has a component of type `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.stores.has(ComponentId::of::<T>(), entity)
    }

    /// Overwrite an existing component, returning the old value.
    ///
    /// Membership cannot change, so groups are not notified.
    pub fn set_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<T> {
        self.store_mut::<T>(entity)?.set(entity, value)
    }

    /// Overwrite `destination`'s component with a clone of `source`'s.
    pub fn copy_component<T: Component + Clone>(
        &mut self,
        source: EntityId,
        destination: EntityId,
    ) -> Result<T> {
        let value = self.get_component::<T>(source)?.clone();
        self.set_component(destination, value)
    }

    /// Add a tag if it is not already present. Returns whether it was added.
    pub fn insert_tag<T: Component + Default>(&mut self, entity: EntityId) -> Result<bool> {
        self.check_alive(entity)?;
        if self.has_component::<T>(entity) {
            return Ok(false);
        }
        self.create_component(entity, T::default()).map(|_| true)
    }

    /// Remove a tag if present. Returns whether it was removed.
    pub fn remove_tag<T: Component>(&mut self, entity: EntityId) -> Result<bool> {
        self.try_remove_component::<T>(entity)
            .map(|removed| removed.is_some())
    }

    /// Typed store for `T`, if any component of that type was ever created.
    #[must_use]
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores.get::<T>()
    }

    /// Every `T` value in dense order; empty if the store does not exist.
    #[must_use]
    pub fn components<T: Component>(&self) -> &[T] {
        self.stores
            .get::<T>()
            .map(ComponentStore::values)
            .unwrap_or_default()
    }

    // ==================== Group Operations ====================

    /// Build or fetch the group for a signature.
    ///
    /// Equal signatures always resolve to the same [`GroupId`].
    pub fn group(&mut self, signature: Signature) -> Result<GroupId> {
        self.groups.get_or_build(signature, &mut self.stores)
    }

    #[must_use]
    pub fn get_group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Members of a group in dense order.
    pub fn group_entities(&self, id: GroupId) -> Result<&[EntityId]> {
        self.groups
            .get(id)
            .map(Group::entities)
            .ok_or(Error::UnknownGroup)
    }

    #[must_use]
    pub fn find_group(&self, signature: &Signature) -> Option<GroupId> {
        self.groups.find(signature)
    }

    /// Tear a group down. Its id never resolves again.
    pub fn remove_group(&mut self, id: GroupId) -> Result<()> {
        self.groups.remove(id, &mut self.stores).map(drop)
    }

    #[must_use]
    pub const fn group_count(&self) -> usize {
        self.groups.len()
    }

    // ==================== Deferred Commands ====================

    /// Apply recorded commands in order. See [`CommandBuffer::apply`].
    pub fn apply(&mut self, commands: &mut CommandBuffer) -> Result<usize> {
        commands.apply(self)
    }

    // ==================== Accessors ====================

    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub const fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    #[must_use]
    pub const fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    #[must_use]
    pub const fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    fn check_alive(&self, entity: EntityId) -> Result<()> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(Error::EntityNotAlive { entity })
        }
    }

    fn store_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut ComponentStore<T>> {
        self.stores
            .get_mut::<T>()
            .ok_or_else(|| missing::<T>(entity))
    }
}

fn missing<T: Component>(entity: EntityId) -> Error {
    Error::MissingComponent {
        entity,
        component: ComponentId::of::<T>(),
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.groups.clear(&mut self.stores);
        debug!(
            entities = self.entities.alive_count(),
            stores = self.stores.len(),
            "world dropped"
        );
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.entities.alive_count())
            .field("component_types", &self.stores.len())
            .field("group_count", &self.groups.len())
            .finish()
    }
}
