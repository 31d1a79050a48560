#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::float_cmp)]

//! Grove ECS - sparse-set Entity Component System with live groups.
//!
//! # Key Concepts
//!
//! - **Entity**: A plain `u32` id; data lives in component stores, not on the entity
//! - **EntityHandle**: An id paired with its generation, safe to hold across recycling
//! - **Component**: Any `Send + Sync + 'static` value attached to an entity
//! - **Tag**: A zero-sized component; its store tracks presence only
//! - **Signature**: Included and excluded component types, order-independent
//! - **Group**: A live set of entities matching a signature, updated on every mutation
//!
//! # Example
//!
//! ```
//! use grove_ecs::{Signature, World};
//!
//! struct Position(f32, f32);
//! struct Velocity(f32, f32);
//!
//! let mut world = World::new();
//! let still = world
//!     .group(Signature::new().include::<Position>().exclude::<Velocity>())
//!     .unwrap();
//!
//! let entity = world.spawn(Position(0.0, 0.0)).unwrap();
//! assert_eq!(world.group_entities(still).unwrap(), &[entity]);
//!
//! world.create_component(entity, Velocity(1.0, 0.0)).unwrap();
//! assert!(world.group_entities(still).unwrap().is_empty());
//! ```

mod command;
mod component;
mod config;
mod entity;
mod error;
mod group;
mod observer;
mod signature;
mod sparse_set;
mod storage;
mod stores;
mod world;

pub use command::CommandBuffer;
pub use component::{Component, ComponentId, ComponentInfo};
pub use config::WorldConfig;
pub use entity::{EntityHandle, EntityId, EntityRegistry, Generation};
pub use error::{Error, Result};
pub use group::{Group, GroupId, GroupRegistry};
pub use observer::{Observers, Reaction, Role, StoreEvent, Subscription};
pub use signature::Signature;
pub use sparse_set::{SparseSet, SwapRemove};
pub use storage::{AnyStore, ComponentStore};
pub use stores::StoreRegistry;
pub use world::World;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CommandBuffer, Component, EntityHandle, EntityId, GroupId, Signature, World, WorldConfig,
    };
}
