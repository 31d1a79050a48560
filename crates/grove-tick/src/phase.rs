//! Scheduler phases and lifecycle state.

use std::fmt;

use bitflags::bitflags;

/// One of the four scheduler phases, in run order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Runs once, before anything else.
    Initialize,
    /// Runs once, after initialization.
    StartUp,
    /// Runs once per caller-driven tick.
    Execute,
    /// Runs once at teardown.
    Dispose,
}

impl Phase {
    /// All phases in run order.
    pub const ALL: [Self; 4] = [Self::Initialize, Self::StartUp, Self::Execute, Self::Dispose];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The flag for this phase.
    #[must_use]
    pub const fn flag(self) -> Phases {
        match self {
            Self::Initialize => Phases::INITIALIZE,
            Self::StartUp => Phases::START_UP,
            Self::Execute => Phases::EXECUTE,
            Self::Dispose => Phases::DISPOSE,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initialize => "initialize",
            Self::StartUp => "start-up",
            Self::Execute => "execute",
            Self::Dispose => "dispose",
        })
    }
}

bitflags! {
    /// The set of phases a system takes part in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Phases: u8 {
        const INITIALIZE = 1 << 0;
        const START_UP = 1 << 1;
        const EXECUTE = 1 << 2;
        const DISPOSE = 1 << 3;
    }
}

impl Phases {
    /// Phases in this set, in run order.
    pub fn iter_phases(self) -> impl Iterator<Item = Phase> {
        Phase::ALL
            .into_iter()
            .filter(move |phase| self.contains(phase.flag()))
    }
}

/// Where a scheduler is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Accepting systems; nothing has run.
    Composing,
    /// The initialize phase has been entered.
    Initialized,
    /// The start-up phase has been entered; execute may run.
    Started,
    /// An initialize or start-up system failed. Only dispose is accepted.
    Faulted,
    /// Torn down; nothing runs again.
    Disposed,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Composing => "composing",
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Faulted => "faulted",
            Self::Disposed => "disposed",
        })
    }
}
