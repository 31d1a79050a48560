//! Deferred world mutations.
//!
//! A [`CommandBuffer`] records structural changes while the caller is still
//! reading from the world (for example while walking a group's members) and
//! replays them later in recording order.

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    component::Component,
    entity::EntityId,
    error::{Error, Result},
    world::World,
};

type Command = Box<dyn FnOnce(&mut World) -> Result<()> + Send>;

/// Bounded queue of pending world mutations.
pub struct CommandBuffer {
    commands: VecDeque<Command>,
    capacity: usize,
}

impl CommandBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an arbitrary mutation.
    pub fn push<F>(&mut self, command: F) -> Result<()>
    where
        F: FnOnce(&mut World) -> Result<()> + Send + 'static,
    {
        if self.commands.len() >= self.capacity {
            return Err(Error::CommandCapacity {
                capacity: self.capacity,
            });
        }
        self.commands.push_back(Box::new(command));
        Ok(())
    }

    /// Record [`World::create_component`].
    pub fn create_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        self.push(move |world| world.create_component(entity, value).map(|_| ()))
    }

    /// Record [`World::create_component_from`]. The source value is read
    /// when the command is applied, not when it is recorded.
    pub fn create_component_from<T: Component + Clone>(
        &mut self,
        entity: EntityId,
        source: EntityId,
    ) -> Result<()> {
        self.push(move |world| {
            world
                .create_component_from::<T>(entity, source)
                .map(|_| ())
        })
    }

    /// Record [`World::remove_component`].
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        self.push(move |world| world.remove_component::<T>(entity).map(drop))
    }

    /// Record [`World::set_component`].
    pub fn set_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        self.push(move |world| world.set_component(entity, value).map(drop))
    }

    /// Record [`World::copy_component`]. The source value is read when the
    /// command is applied.
    pub fn copy_component<T: Component + Clone>(
        &mut self,
        source: EntityId,
        destination: EntityId,
    ) -> Result<()> {
        self.push(move |world| {
            world
                .copy_component::<T>(source, destination)
                .map(drop)
        })
    }

    /// Record [`World::destroy_entity`].
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        self.push(move |world| world.destroy_entity(entity))
    }

    /// Apply every command in recording order and empty the buffer.
    ///
    /// Stops at the first failing command; commands after it are discarded.
    /// Returns the number of commands applied.
    pub fn apply(&mut self, world: &mut World) -> Result<usize> {
        let mut applied = 0;
        while let Some(command) = self.commands.pop_front() {
            if let Err(error) = command(world) {
                debug!(applied, discarded = self.commands.len(), %error, "command failed");
                self.commands.clear();
                return Err(error);
            }
            applied += 1;
        }
        debug!(applied, "commands applied");
        Ok(applied)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every pending command without applying it.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("len", &self.commands.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
