//! ECS error types.
//!
//! Every failure is local and synchronous. Errors fall into two families:
//! capacity exhaustion (a configured bound was hit) and precondition
//! violations (the caller asked for something the storage cannot honour,
//! such as creating a component twice). Stale entity handles are not errors;
//! see [`crate::World::try_unbox`].

use thiserror::Error;

use crate::{component::ComponentId, entity::EntityId};

/// ECS error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No free entity slot left.
    #[error("entity capacity exhausted: all {capacity} entity slots are alive")]
    EntityCapacity { capacity: usize },

    /// A component store reached its dense capacity.
    #[error("component store {component:?} is full ({capacity} components)")]
    ComponentCapacity {
        component: ComponentId,
        capacity: usize,
    },

    /// Too many distinct component types in one world.
    #[error("component type capacity exhausted ({capacity} stores)")]
    ComponentTypeCapacity { capacity: usize },

    /// Too many live groups.
    #[error("group capacity exhausted ({capacity} groups)")]
    GroupCapacity { capacity: usize },

    /// A command buffer reached its capacity.
    #[error("command buffer is full ({capacity} commands)")]
    CommandCapacity { capacity: usize },

    /// A sparse set key lies outside the sparse domain.
    #[error("key {key} is outside the sparse domain [0, {capacity})")]
    KeyOutOfRange { key: EntityId, capacity: usize },

    /// A sparse set reached its dense capacity.
    #[error("sparse set is full ({capacity} keys)")]
    SetFull { capacity: usize },

    /// The entity id is not currently allocated.
    #[error("entity {entity} is not alive")]
    EntityNotAlive { entity: EntityId },

    /// The entity already has a component of this type.
    #[error("entity {entity} already has component {component:?}")]
    DuplicateComponent {
        entity: EntityId,
        component: ComponentId,
    },

    /// The entity has no component of this type.
    #[error("entity {entity} has no component {component:?}")]
    MissingComponent {
        entity: EntityId,
        component: ComponentId,
    },

    /// The key is already present in the sparse set.
    #[error("key {key} is already present")]
    DuplicateKey { key: EntityId },

    /// The key is not present in the sparse set.
    #[error("key {key} is not present")]
    MissingKey { key: EntityId },

    /// A signature both includes and excludes the same component.
    #[error("signature both includes and excludes component {component:?}")]
    ConflictingSignature { component: ComponentId },

    /// A signature without included components cannot seed a group.
    #[error("signature has no included components")]
    EmptySignature,

    /// The group id does not refer to a live group.
    #[error("group does not exist or was removed")]
    UnknownGroup,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error reports an exhausted configured bound.
    #[must_use]
    pub const fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::EntityCapacity { .. }
                | Self::ComponentCapacity { .. }
                | Self::ComponentTypeCapacity { .. }
                | Self::GroupCapacity { .. }
                | Self::CommandCapacity { .. }
                | Self::KeyOutOfRange { .. }
                | Self::SetFull { .. }
        )
    }

    /// Whether this error reports a violated caller precondition.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EntityNotAlive { .. }
                | Self::DuplicateComponent { .. }
                | Self::MissingComponent { .. }
                | Self::DuplicateKey { .. }
                | Self::MissingKey { .. }
                | Self::ConflictingSignature { .. }
                | Self::EmptySignature
                | Self::UnknownGroup
        )
    }
}

/// Result type for ECS operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
