//! Repair damaged buildings, worst first

use crate::core::error::Result;
use crate::entity::{Agent, Job, Target};
use crate::spatial::{Thing, WorkMap};
use crate::work::provider::{ProviderDef, TaskProvider};

pub struct RepairDamaged {
    def: ProviderDef,
}

impl RepairDamaged {
    pub fn new(def: ProviderDef) -> Self {
        Self { def }
    }
}

impl TaskProvider for RepairDamaged {
    fn def(&self) -> &ProviderDef {
        &self.def
    }

    fn has_task_on_thing(&self, _agent: &Agent, _map: &dyn WorkMap, thing: &Thing) -> Result<bool> {
        Ok(thing.health < 1.0)
    }

    fn priority_of(&self, _agent: &Agent, map: &dyn WorkMap, target: &Target) -> Result<f32> {
        Ok(target
            .thing()
            .and_then(|id| map.things().get(id))
            .map_or(0.0, |t| 1.0 - t.health))
    }

    fn task_on_thing(&self, _agent: &Agent, _map: &dyn WorkMap, thing: &Thing) -> Result<Option<Job>> {
        if thing.health >= 1.0 {
            return Ok(None);
        }
        Ok(Some(Job::new("repair", Target::Thing(thing.id, thing.position))))
    }
}
