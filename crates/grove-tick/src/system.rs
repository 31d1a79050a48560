//! The system trait.

use grove_ecs::World;

use crate::phase::{Phase, Phases};

/// A unit of game logic driven by the [`crate::Scheduler`].
///
/// A system declares the phases it takes part in through [`System::phases`]
/// and overrides the matching callbacks. Callbacks for phases a system did
/// not declare are never called.
///
/// # Example
///
/// ```
/// use grove_ecs::World;
/// use grove_tick::{Phases, System};
///
/// struct Counter(u32);
///
/// impl System for Counter {
///     fn phases(&self) -> Phases {
///         Phases::EXECUTE
///     }
///
///     fn execute(&mut self, _world: &mut World) -> grove_ecs::Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait System: 'static {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Phases this system runs in. Read once at registration.
    fn phases(&self) -> Phases;

    fn initialize(&mut self, _world: &mut World) -> grove_ecs::Result<()> {
        Ok(())
    }

    fn start_up(&mut self, _world: &mut World) -> grove_ecs::Result<()> {
        Ok(())
    }

    fn execute(&mut self, _world: &mut World) -> grove_ecs::Result<()> {
        Ok(())
    }

    fn dispose(&mut self, _world: &mut World) -> grove_ecs::Result<()> {
        Ok(())
    }

    /// Call the callback for `phase`.
    fn run(&mut self, phase: Phase, world: &mut World) -> grove_ecs::Result<()> {
        match phase {
            Phase::Initialize => self.initialize(world),
            Phase::StartUp => self.start_up(world),
            Phase::Execute => self.execute(world),
            Phase::Dispose => self.dispose(world),
        }
    }
}
