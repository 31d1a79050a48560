//! App - a world paired with the scheduler that drives it.

use grove_ecs::{World, WorldConfig};
use tracing::warn;

use crate::{
    error::TickResult,
    phase::SchedulerState,
    scheduler::Scheduler,
    system::System,
};

/// Composition root: owns one [`World`] and one [`Scheduler`].
///
/// Dropping an app that was started runs the dispose phase, so teardown
/// happens on every exit path.
pub struct App {
    scheduler: Scheduler,
    world: World,
}

impl App {
    /// Build an app whose world and scheduler share one configuration.
    pub fn new(config: WorldConfig) -> TickResult<Self> {
        let scheduler = Scheduler::from_config(&config);
        let world = World::with_config(config)?;
        Ok(Self { scheduler, world })
    }

    pub fn add_system<S: System>(&mut self, system: S) -> TickResult<&mut Self> {
        self.scheduler.register(system)?;
        Ok(self)
    }

    /// Run the initialize and start-up phases.
    pub fn start(&mut self) -> TickResult<()> {
        self.scheduler.initialize(&mut self.world)?;
        self.scheduler.start_up(&mut self.world)
    }

    /// Run one execute tick.
    pub fn tick(&mut self) -> TickResult<()> {
        self.scheduler.execute(&mut self.world)
    }

    /// Run the dispose phase.
    pub fn dispose(&mut self) -> TickResult<()> {
        self.scheduler.dispose(&mut self.world)
    }

    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    pub const fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            scheduler: Scheduler::from_config(&WorldConfig::default()),
            world: World::new(),
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.scheduler.state() == SchedulerState::Disposed {
            return;
        }
        if let Err(error) = self.scheduler.dispose(&mut self.world) {
            warn!(%error, "dispose failed while dropping app");
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("world", &self.world)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
