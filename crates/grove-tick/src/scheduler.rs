//! Four-phase system scheduler.
//!
//! ```text
//! register* ─► initialize ─► start_up ─► execute* ─► dispose
//! ```
//!
//! Systems are stored once; each phase keeps the registration-order indices
//! of the systems that declared it. Running a phase needs `&mut Scheduler`,
//! so a phase cannot be re-entered from inside a system callback.

use grove_ecs::{World, WorldConfig};
use tracing::{debug, info, warn};

use crate::{
    error::{TickError, TickResult},
    phase::{Phase, SchedulerState},
    system::System,
};

/// Runs registered systems phase by phase.
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    /// Per-phase indices into `systems`, indexed by [`Phase::index`].
    phases: [Vec<usize>; 4],
    state: SchedulerState,
    max_systems: usize,
}

impl Scheduler {
    #[must_use]
    pub fn new(max_systems: usize) -> Self {
        Self {
            systems: Vec::new(),
            phases: Default::default(),
            state: SchedulerState::Composing,
            max_systems,
        }
    }

    /// Create a scheduler bounded by `config.max_systems`.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.max_systems)
    }

    /// Register a system in every phase it declares.
    pub fn register<S: System>(&mut self, system: S) -> TickResult<&mut Self> {
        self.register_boxed(Box::new(system))
    }

    pub fn register_boxed(&mut self, system: Box<dyn System>) -> TickResult<&mut Self> {
        if self.state != SchedulerState::Composing {
            return Err(TickError::RegistrationClosed { state: self.state });
        }
        if self.systems.len() >= self.max_systems {
            return Err(TickError::SystemCapacity {
                capacity: self.max_systems,
            });
        }

        let index = self.systems.len();
        let phases = system.phases();
        for phase in phases.iter_phases() {
            self.phases[phase.index()].push(index);
        }
        debug!(system = system.name(), ?phases, "system registered");
        self.systems.push(system);
        Ok(self)
    }

    /// Run every initialize system once.
    ///
    /// A failing system stops the phase and leaves the scheduler
    /// [`SchedulerState::Faulted`]; the phase cannot be retried and only
    /// dispose is accepted afterwards.
    pub fn initialize(&mut self, world: &mut World) -> TickResult<()> {
        self.enter(Phase::Initialize, SchedulerState::Composing, SchedulerState::Initialized)?;
        self.run_once(Phase::Initialize, world)
    }

    /// Run every start-up system once. Fails the same way as
    /// [`Self::initialize`].
    pub fn start_up(&mut self, world: &mut World) -> TickResult<()> {
        self.enter(Phase::StartUp, SchedulerState::Initialized, SchedulerState::Started)?;
        self.run_once(Phase::StartUp, world)
    }

    /// Run every execute system once. Call once per tick.
    ///
    /// A failed tick leaves the scheduler started, so the caller may tick
    /// again.
    pub fn execute(&mut self, world: &mut World) -> TickResult<()> {
        if self.state != SchedulerState::Started {
            return Err(TickError::PhaseOrder {
                phase: Phase::Execute,
                state: self.state,
            });
        }
        self.run(Phase::Execute, world)
    }

    /// Run every dispose system once and close the scheduler.
    ///
    /// All dispose systems run even if some fail; the first failure is
    /// returned. A scheduler that never ran has nothing to tear down, so its
    /// dispose systems are skipped.
    pub fn dispose(&mut self, world: &mut World) -> TickResult<()> {
        let previous = self.state;
        if previous == SchedulerState::Disposed {
            return Err(TickError::PhaseOrder {
                phase: Phase::Dispose,
                state: previous,
            });
        }
        self.state = SchedulerState::Disposed;
        if previous == SchedulerState::Composing {
            debug!("scheduler disposed before initialize");
            return Ok(());
        }

        info!(systems = self.phase_len(Phase::Dispose), "dispose");
        let mut first_error = None;
        for &index in &self.phases[Phase::Dispose.index()] {
            let system = &mut self.systems[index];
            if let Err(source) = system.run(Phase::Dispose, world) {
                warn!(system = system.name(), %source, "dispose failed");
                first_error.get_or_insert(TickError::System {
                    phase: Phase::Dispose,
                    system: system.name(),
                    source,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn enter(
        &mut self,
        phase: Phase,
        expected: SchedulerState,
        next: SchedulerState,
    ) -> TickResult<()> {
        if self.state != expected {
            return Err(TickError::PhaseOrder {
                phase,
                state: self.state,
            });
        }
        self.state = next;
        info!(%phase, systems = self.phase_len(phase), "phase entered");
        Ok(())
    }

    /// Run a one-shot phase, faulting the scheduler if a system fails.
    fn run_once(&mut self, phase: Phase, world: &mut World) -> TickResult<()> {
        let result = self.run(phase, world);
        if let Err(error) = &result {
            warn!(%phase, %error, "phase failed, scheduler faulted");
            self.state = SchedulerState::Faulted;
        }
        result
    }

    /// Run one phase in registration order, stopping at the first failure.
    fn run(&mut self, phase: Phase, world: &mut World) -> TickResult<()> {
        for &index in &self.phases[phase.index()] {
            let system = &mut self.systems[index];
            system
                .run(phase, world)
                .map_err(|source| TickError::System {
                    phase,
                    system: system.name(),
                    source,
                })?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of systems registered for a phase.
    #[must_use]
    pub fn phase_len(&self, phase: Phase) -> usize {
        self.phases[phase.index()].len()
    }

    /// Names of the systems in a phase, in run order.
    pub fn phase_systems(&self, phase: Phase) -> impl Iterator<Item = &'static str> + '_ {
        self.phases[phase.index()]
            .iter()
            .map(|&index| self.systems[index].name())
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    #[must_use]
    pub const fn max_systems(&self) -> usize {
        self.max_systems
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("systems", &self.systems.len())
            .field("max_systems", &self.max_systems)
            .finish()
    }
}
