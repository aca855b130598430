//! Agents requesting work and their per-agent dispatch bookkeeping

use crate::core::types::{AgentId, Cell, ProviderId};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// Tags describing the nature of a piece of work
///
/// An agent with a tag disabled never receives work from a provider
/// carrying that tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkTag {
    ManualDumb,
    ManualSkilled,
    Violent,
    Caring,
    Social,
    Intellectual,
    Hauling,
    Cleaning,
    Mining,
    Firefighting,
}

/// Physical capacities a provider can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capacity {
    Manipulation,
    Moving,
    Sight,
    Talking,
}

/// What the agent's schedule says it should be doing right now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeAssignment {
    #[default]
    Anything,
    Work,
    Sleep,
    Joy,
}

/// A pending forced-task override
///
/// Dispatch in emergency mode tries the category's providers against
/// `cell` before anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedWork {
    pub category: String,
    pub cell: Cell,
}

/// Per-agent work priorities and the provider lists derived from them
///
/// Priority 0 disables a category, 1 is the most urgent. The provider lists
/// are ordered by precedence and rebuilt by the registry whenever the
/// priorities change.
#[derive(Debug, Clone, Default)]
pub struct WorkSettings {
    priorities: AHashMap<String, u8>,
    pub normal: Vec<ProviderId>,
    pub emergency: Vec<ProviderId>,
}

impl WorkSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_priority(&mut self, category: impl Into<String>, priority: u8) {
        self.priorities.insert(category.into(), priority);
    }

    /// Priority of a category, 0 when never assigned
    pub fn priority_of(&self, category: &str) -> u8 {
        self.priorities.get(category).copied().unwrap_or(0)
    }

    /// True if any category is enabled
    pub fn ever_works(&self) -> bool {
        self.priorities.values().any(|&p| p > 0)
    }
}

/// The entity requesting work
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub position: Cell,
    /// Full member of the controlling faction
    pub faction_member: bool,
    pub disabled_tags: AHashSet<WorkTag>,
    pub capacities: AHashMap<Capacity, f32>,
    /// Cells the agent may work in; `None` means unrestricted
    pub allowed_area: Option<AHashSet<Cell>>,
    pub work_settings: WorkSettings,
    pub forced: Option<ForcedWork>,
    /// Category of the provider that most recently yielded a target
    pub last_given_category: Option<String>,
    pub time_assignment: TimeAssignment,
}

impl Agent {
    /// A faction member with every capacity at full level
    pub fn new(name: impl Into<String>, position: Cell) -> Self {
        let capacities = [
            Capacity::Manipulation,
            Capacity::Moving,
            Capacity::Sight,
            Capacity::Talking,
        ]
        .into_iter()
        .map(|c| (c, 1.0))
        .collect();

        Self {
            id: AgentId::new(),
            name: name.into(),
            position,
            faction_member: true,
            disabled_tags: AHashSet::new(),
            capacities,
            allowed_area: None,
            work_settings: WorkSettings::new(),
            forced: None,
            last_given_category: None,
            time_assignment: TimeAssignment::default(),
        }
    }

    pub fn is_capable_of(&self, capacity: Capacity) -> bool {
        self.capacities.get(&capacity).copied().unwrap_or(0.0) > 0.0
    }

    /// True if any of the given tags is disabled for this agent
    pub fn tags_disabled(&self, tags: &[WorkTag]) -> bool {
        tags.iter().any(|t| self.disabled_tags.contains(t))
    }

    /// True if the agent may work at `cell` under its area restriction
    pub fn allowed_at(&self, cell: Cell) -> bool {
        self.allowed_area
            .as_ref()
            .map_or(true, |area| area.contains(&cell))
    }

    pub fn force_work(&mut self, category: impl Into<String>, cell: Cell) {
        self.forced = Some(ForcedWork {
            category: category.into(),
            cell,
        });
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
