//! Carry loose haulables into storage

use crate::core::error::Result;
use crate::core::types::Cell;
use crate::entity::{Agent, Job, Target};
use crate::spatial::{Thing, ThingGroup, WorkMap};
use crate::work::provider::{ProviderDef, TaskProvider};

const DEFAULT_STORAGE: &str = "storage";

pub struct HaulToStorage {
    def: ProviderDef,
}

impl HaulToStorage {
    pub fn new(def: ProviderDef) -> Self {
        Self { def }
    }

    fn storage(&self) -> &str {
        self.def.designation.as_deref().unwrap_or(DEFAULT_STORAGE)
    }

    /// Closest empty storage cell the agent may use
    fn free_storage_cell(&self, agent: &Agent, map: &dyn WorkMap, from: Cell) -> Option<Cell> {
        map.designated_cells(self.storage())
            .into_iter()
            .filter(|&c| !map.is_cell_forbidden(c, agent) && map.things().things_at(c).is_empty())
            .min_by_key(|c| c.distance_squared(&from))
    }
}

impl TaskProvider for HaulToStorage {
    fn def(&self) -> &ProviderDef {
        &self.def
    }

    fn should_skip(&self, _agent: &Agent, map: &dyn WorkMap) -> bool {
        map.designated_cells(self.storage()).is_empty()
    }

    fn has_task_on_thing(&self, agent: &Agent, map: &dyn WorkMap, thing: &Thing) -> Result<bool> {
        Ok(thing.group == ThingGroup::Haulable
            && !map.is_designated(thing.position, self.storage())
            && self.free_storage_cell(agent, map, thing.position).is_some())
    }

    fn task_on_thing(&self, agent: &Agent, map: &dyn WorkMap, thing: &Thing) -> Result<Option<Job>> {
        Ok(self.free_storage_cell(agent, map, thing.position).map(|dest| {
            Job::new("haul", Target::Thing(thing.id, thing.position)).with_destination(dest)
        }))
    }
}
