//! Entity identifiers with generational handles.
//!
//! Entities are plain integer ids. The registry recycles ids through an
//! intrusive free list and bumps a per-slot generation on every recycle,
//! so an [`EntityHandle`] held outside the world can be checked for
//! use-after-recycle without per-entity allocation.

use std::fmt;

use tracing::trace;

use crate::{
    component::ComponentId,
    error::{Error, Result},
    observer::Observers,
};

/// Generation counter to detect stale entity references.
/// Incremented each time an entity slot is recycled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(u32);

impl Generation {
    /// Create a new generation (starts at 0).
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Increment the generation counter.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Get the raw generation value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Raw entity index, valid only inside the registry that created it.
pub type EntityId = u32;

/// A safe-to-hold reference to an entity.
///
/// Pairs the id with the generation it was boxed at. Once the id is
/// recycled the handle no longer unboxes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    id: EntityId,
    generation: Generation,
}

impl EntityHandle {
    /// Create a handle from its parts.
    #[must_use]
    pub const fn new(id: EntityId, generation: Generation) -> Self {
        Self { id, generation }
    }

    /// Get the entity's index.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.id
    }

    /// Get the entity's generation.
    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({}v{})", self.id, self.generation.0)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id, self.generation.0)
    }
}

/// Fixed-capacity allocator for entity ids.
///
/// `links[id]` is the next free id while `id` is free, and `id` itself while
/// `id` is alive. The free list is threaded through the same array.
pub struct EntityRegistry {
    links: Box<[EntityId]>,
    generations: Box<[Generation]>,
    /// Head of the free list; equals the capacity when exhausted.
    next_free: EntityId,
    alive_count: u32,
    /// Component stores to clean up when an entity is removed.
    removal_listeners: Observers<ComponentId>,
}

impl EntityRegistry {
    /// Create a registry with room for `capacity` live entities.
    ///
    /// Capacity must stay below `u32::MAX`; [`crate::WorldConfig::validate`]
    /// enforces this.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let links = (1..=capacity as EntityId).collect::<Vec<_>>();
        Self {
            links: links.into_boxed_slice(),
            generations: vec![Generation::new(); capacity].into_boxed_slice(),
            next_free: 0,
            alive_count: 0,
            removal_listeners: Observers::new(),
        }
    }

    /// Pop the free-list head. O(1).
    pub fn create(&mut self) -> Result<EntityId> {
        let id = self.next_free;
        let Some(&successor) = self.links.get(id as usize) else {
            return Err(Error::EntityCapacity {
                capacity: self.capacity(),
            });
        };

        self.next_free = successor;
        self.links[id as usize] = id;
        self.alive_count += 1;

        trace!(entity = id, "entity created");
        Ok(id)
    }

    /// Push the id back onto the free list and invalidate its handles.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        if !self.is_alive(id) {
            return Err(Error::EntityNotAlive { entity: id });
        }

        let slot = id as usize;
        self.links[slot] = self.next_free;
        self.next_free = id;
        self.generations[slot] = self.generations[slot].next();
        self.alive_count -= 1;

        trace!(entity = id, generation = ?self.generations[slot], "entity removed");
        Ok(())
    }

    /// Create an entity and box it in one step.
    pub fn create_boxed(&mut self) -> Result<EntityHandle> {
        let id = self.create()?;
        self.box_entity(id)
    }

    /// Remove the entity behind a handle if the handle is still current.
    ///
    /// Returns `false` for stale handles. Component cleanup is the world's
    /// job; see [`crate::World::destroy_boxed`].
    pub fn remove_boxed(&mut self, handle: EntityHandle) -> bool {
        match self.try_unbox(handle) {
            Some(id) => self.remove(id).is_ok(),
            None => false,
        }
    }

    /// Check if an id is currently allocated.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.links.get(id as usize) == Some(&id)
    }

    /// Box a live id with its current generation.
    pub fn box_entity(&self, id: EntityId) -> Result<EntityHandle> {
        if !self.is_alive(id) {
            return Err(Error::EntityNotAlive { entity: id });
        }
        Ok(EntityHandle::new(id, self.generations[id as usize]))
    }

    /// Recover the id from a handle if it still refers to the same entity.
    ///
    /// A recycled or freed id yields `None`; this is normal control flow.
    #[must_use]
    pub fn try_unbox(&self, handle: EntityHandle) -> Option<EntityId> {
        let id = handle.id();
        (self.is_alive(id) && self.generations[id as usize] == handle.generation()).then_some(id)
    }

    /// Current generation of a slot.
    #[must_use]
    pub fn generation(&self, id: EntityId) -> Option<Generation> {
        self.generations.get(id as usize).copied()
    }

    /// Get the number of currently alive entities.
    #[must_use]
    pub const fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// Get the total number of entity slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.links.len()
    }

    /// Iterate over alive ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter(|&(slot, &link)| link as usize == slot)
            .map(|(_, &link)| link)
    }

    /// Subscribe a component store to entity removal.
    pub(crate) fn listen_removed(&mut self, component: ComponentId) {
        self.removal_listeners.subscribe(component);
    }

    /// Stores notified when an entity is removed, in subscription order.
    #[must_use]
    pub fn removal_listeners(&self) -> &[ComponentId] {
        self.removal_listeners.as_slice()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("alive_count", &self.alive_count)
            .field("capacity", &self.links.len())
            .field("next_free", &self.next_free)
            .finish()
    }
}
