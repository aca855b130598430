//! Dispatch results

use crate::core::types::{Cell, ProviderId, ThingId};
use serde::{Deserialize, Serialize};

/// Coarse tag a provider attaches to the tasks it gives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskTag {
    #[default]
    MiscWork,
    Fieldwork,
    Hauling,
    Construction,
    Idle,
    Emergency,
}

/// What a job acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Thing(ThingId, Cell),
    Cell(Cell),
    None,
}

impl Target {
    pub fn cell(&self) -> Option<Cell> {
        match self {
            Target::Thing(_, cell) | Target::Cell(cell) => Some(*cell),
            Target::None => None,
        }
    }

    pub fn thing(&self) -> Option<ThingId> {
        match self {
            Target::Thing(id, _) => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Thing(id, cell) => write!(f, "thing #{} at {}", id.0, cell),
            Target::Cell(cell) => write!(f, "cell {}", cell),
            Target::None => write!(f, "no target"),
        }
    }
}

/// The concrete work a provider hands out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub kind: String,
    pub target: Target,
    pub destination: Option<Cell>,
}

impl Job {
    pub fn new(kind: impl Into<String>, target: Target) -> Self {
        Self {
            kind: kind.into(),
            target,
            destination: None,
        }
    }

    pub fn with_destination(mut self, cell: Cell) -> Self {
        self.destination = Some(cell);
        self
    }
}

/// A dispatch result: a job plus the provider that gave it
///
/// Created fresh per dispatch call; ownership passes to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub provider: ProviderId,
    pub tag: TaskTag,
    pub job: Job,
    /// Produced from a forced-task override
    pub forced: bool,
}

impl Task {
    pub fn new(provider: ProviderId, tag: TaskTag, job: Job) -> Self {
        Self {
            provider,
            tag,
            job,
            forced: false,
        }
    }

    pub fn as_forced(mut self) -> Self {
        self.forced = true;
        self
    }
}
