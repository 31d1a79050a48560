//! Scheduler error types.

use thiserror::Error;

use crate::phase::{Phase, SchedulerState};

/// Scheduler error type.
#[derive(Debug, Error)]
pub enum TickError {
    /// An ECS operation outside any system failed.
    #[error(transparent)]
    Ecs(#[from] grove_ecs::Error),

    /// Too many registered systems.
    #[error("system capacity exhausted ({capacity} systems)")]
    SystemCapacity { capacity: usize },

    /// Systems can only be registered before the first phase runs.
    #[error("cannot register systems while the scheduler is {state}")]
    RegistrationClosed { state: SchedulerState },

    /// A phase was requested out of order.
    #[error("cannot run {phase} while the scheduler is {state}")]
    PhaseOrder {
        phase: Phase,
        state: SchedulerState,
    },

    /// A system returned an error.
    #[error("system {system} failed during {phase}")]
    System {
        phase: Phase,
        system: &'static str,
        #[source]
        source: grove_ecs::Error,
    },
}

/// Result type for scheduler operations.
pub type TickResult<T> = Result<T, TickError>;
