//! Clear designated cells, working inward from supported edges last

use crate::core::error::Result;
use crate::core::types::Cell;
use crate::entity::{Agent, Job, Target};
use crate::spatial::WorkMap;
use crate::work::provider::{ProviderDef, TaskProvider};

const DEFAULT_DESIGNATION: &str = "clear";

/// Priority of a cell touching an impassable neighbour
const SUPPORTED_PRIORITY: f32 = -60.0;

pub struct ClearDesignated {
    def: ProviderDef,
}

impl ClearDesignated {
    pub fn new(def: ProviderDef) -> Self {
        Self { def }
    }

    fn designation(&self) -> &str {
        self.def.designation.as_deref().unwrap_or(DEFAULT_DESIGNATION)
    }
}

impl TaskProvider for ClearDesignated {
    fn def(&self) -> &ProviderDef {
        &self.def
    }

    fn potential_cells(&self, _agent: &Agent, map: &dyn WorkMap) -> Result<Vec<Cell>> {
        Ok(map.designated_cells(self.designation()))
    }

    fn has_task_on_cell(&self, agent: &Agent, map: &dyn WorkMap, cell: Cell) -> Result<bool> {
        Ok(map.is_designated(cell, self.designation()) && !map.is_cell_forbidden(cell, agent))
    }

    /// Cells with fewer designated neighbours come first; cells next to an
    /// impassable cell come last
    fn priority_of(&self, _agent: &Agent, map: &dyn WorkMap, target: &Target) -> Result<f32> {
        let Some(cell) = target.cell() else {
            return Ok(0.0);
        };
        let mut designated = 0;
        for neighbor in cell.neighbors8() {
            if !map.in_bounds(neighbor) {
                continue;
            }
            if !map.is_passable(neighbor) {
                return Ok(SUPPORTED_PRIORITY);
            }
            if map.is_designated(neighbor, self.designation()) {
                designated += 1;
            }
        }
        Ok(-(designated.min(3) as f32))
    }

    fn task_on_cell(&self, _agent: &Agent, _map: &dyn WorkMap, cell: Cell) -> Result<Option<Job>> {
        Ok(Some(Job::new("clear", Target::Cell(cell))))
    }
}
