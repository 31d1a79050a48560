#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

//! Four-phase system scheduling for grove-ecs.
//!
//! # Lifecycle
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌─────────────────┐   ┌─────────┐
//! │ initialize │ ─►│ start-up │ ─►│ execute (ticks) │ ─►│ dispose │
//! └────────────┘   └──────────┘   └─────────────────┘   └─────────┘
//!      once            once          once per call         once
//! ```
//!
//! Each phase runs its systems in registration order. A system takes part in
//! any subset of the four phases, declared with [`Phases`].
//!
//! # Example
//!
//! ```
//! use grove_ecs::{Signature, World, WorldConfig};
//! use grove_tick::{App, Phases, System};
//!
//! struct Position(f32);
//! struct Velocity(f32);
//!
//! struct Movement;
//!
//! impl System for Movement {
//!     fn phases(&self) -> Phases {
//!         Phases::EXECUTE
//!     }
//!
//!     fn execute(&mut self, world: &mut World) -> grove_ecs::Result<()> {
//!         let moving = world.group(Signature::new().include::<Position>().include::<Velocity>())?;
//!         for entity in world.group_entities(moving)?.to_vec() {
//!             let velocity = world.get_component::<Velocity>(entity)?.0;
//!             world.get_component_mut::<Position>(entity)?.0 += velocity;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut app = App::new(WorldConfig::default()).unwrap();
//! app.add_system(Movement).unwrap();
//! let entity = app.world_mut().spawn(Position(0.0)).unwrap();
//! app.world_mut().create_component(entity, Velocity(2.0)).unwrap();
//!
//! app.start().unwrap();
//! app.tick().unwrap();
//! assert_eq!(app.world().get_component::<Position>(entity).unwrap().0, 2.0);
//! ```

mod app;
mod error;
mod phase;
mod scheduler;
mod system;

pub use app::App;
pub use error::{TickError, TickResult};
pub use phase::{Phase, Phases, SchedulerState};
pub use scheduler::Scheduler;
pub use system::System;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{App, Phase, Phases, Scheduler, System, TickError};
}
