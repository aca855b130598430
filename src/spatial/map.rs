//! The spatial collaborator consulted during candidate scans

use crate::core::types::Cell;
use crate::entity::Agent;
use crate::spatial::things::{Thing, ThingRegistry};
use serde::{Deserialize, Serialize};

/// Where a path must end relative to its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathEndMode {
    /// Stand on the target cell
    OnCell,
    /// Stand on or next to the target
    #[default]
    Touch,
    /// Stand on or next to the target, taking the closest such cell
    ClosestTouch,
}

/// Danger level of a cell, ordered from safest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Danger {
    #[default]
    None,
    Some,
    Deadly,
}

/// Constraints on how an agent may traverse the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraverseParms {
    pub max_danger: Danger,
}

impl TraverseParms {
    pub fn with_max_danger(max_danger: Danger) -> Self {
        Self { max_danger }
    }
}

/// Read-only view of a map during dispatch
pub trait WorkMap {
    fn things(&self) -> &ThingRegistry;

    fn in_bounds(&self, cell: Cell) -> bool;

    fn is_passable(&self, cell: Cell) -> bool;

    fn is_thing_forbidden(&self, thing: &Thing, agent: &Agent) -> bool;

    fn is_cell_forbidden(&self, cell: Cell, agent: &Agent) -> bool;

    /// Cost of the cheapest path, `None` when unreachable
    fn path_cost(
        &self,
        from: Cell,
        to: Cell,
        end: PathEndMode,
        parms: TraverseParms,
    ) -> Option<f32>;

    fn can_reach(&self, from: Cell, to: Cell, end: PathEndMode, parms: TraverseParms) -> bool {
        self.path_cost(from, to, end, parms).is_some()
    }

    /// Cells carrying a named designation, in the order they were designated
    fn designated_cells(&self, designation: &str) -> Vec<Cell>;

    fn is_designated(&self, cell: Cell, designation: &str) -> bool;
}
