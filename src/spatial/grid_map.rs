//! Bounded grid map for dispatch and tests
//!
//! Cell-based blocking with an 8-connected breadth-first search for
//! reachability. Every step costs 1.

use crate::core::types::Cell;
use crate::entity::Agent;
use crate::spatial::map::{Danger, PathEndMode, TraverseParms, WorkMap};
use crate::spatial::things::{Thing, ThingRegistry};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// Cells sharing a designation, remembering designation order
#[derive(Debug, Clone, Default)]
struct Designation {
    order: Vec<Cell>,
    members: AHashSet<Cell>,
}

pub struct GridMap {
    pub width: i32,
    pub height: i32,
    blocked: AHashSet<Cell>,
    danger: AHashMap<Cell, Danger>,
    forbidden_cells: AHashSet<Cell>,
    designations: AHashMap<String, Designation>,
    things: ThingRegistry,
}

impl GridMap {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            blocked: AHashSet::new(),
            danger: AHashMap::new(),
            forbidden_cells: AHashSet::new(),
            designations: AHashMap::new(),
            things: ThingRegistry::new(),
        }
    }

    pub fn things_mut(&mut self) -> &mut ThingRegistry {
        &mut self.things
    }

    pub fn block(&mut self, cell: Cell) {
        self.blocked.insert(cell);
    }

    pub fn unblock(&mut self, cell: Cell) {
        self.blocked.remove(&cell);
    }

    pub fn set_danger(&mut self, cell: Cell, danger: Danger) {
        if danger == Danger::None {
            self.danger.remove(&cell);
        } else {
            self.danger.insert(cell, danger);
        }
    }

    pub fn danger_at(&self, cell: Cell) -> Danger {
        self.danger.get(&cell).copied().unwrap_or_default()
    }

    pub fn forbid_cell(&mut self, cell: Cell) {
        self.forbidden_cells.insert(cell);
    }

    pub fn designate(&mut self, designation: &str, cell: Cell) {
        let entry = self.designations.entry(designation.to_string()).or_default();
        if entry.members.insert(cell) {
            entry.order.push(cell);
        }
    }

    pub fn undesignate(&mut self, designation: &str, cell: Cell) {
        if let Some(entry) = self.designations.get_mut(designation) {
            if entry.members.remove(&cell) {
                entry.order.retain(|&c| c != cell);
            }
        }
    }

    fn walkable(&self, cell: Cell, parms: TraverseParms) -> bool {
        self.in_bounds(cell) && self.is_passable(cell) && self.danger_at(cell) <= parms.max_danger
    }
}

impl WorkMap for GridMap {
    fn things(&self) -> &ThingRegistry {
        &self.things
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn is_passable(&self, cell: Cell) -> bool {
        !self.blocked.contains(&cell)
    }

    fn is_thing_forbidden(&self, thing: &Thing, agent: &Agent) -> bool {
        thing.forbidden && agent.faction_member
    }

    fn is_cell_forbidden(&self, cell: Cell, agent: &Agent) -> bool {
        self.forbidden_cells.contains(&cell) || !agent.allowed_at(cell)
    }

    fn path_cost(
        &self,
        from: Cell,
        to: Cell,
        end: PathEndMode,
        parms: TraverseParms,
    ) -> Option<f32> {
        if !self.in_bounds(to) {
            return None;
        }
        if end == PathEndMode::OnCell && !self.walkable(to, parms) {
            return None;
        }

        let arrived = |cell: Cell| match end {
            PathEndMode::OnCell => cell == to,
            PathEndMode::Touch | PathEndMode::ClosestTouch => cell.is_adjacent_or_same(&to),
        };

        if arrived(from) {
            return Some(0.0);
        }

        let mut visited: AHashSet<Cell> = AHashSet::new();
        let mut open: VecDeque<(Cell, u32)> = VecDeque::new();
        visited.insert(from);
        open.push_back((from, 0));

        while let Some((current, steps)) = open.pop_front() {
            for neighbor in current.neighbors8() {
                if !visited.insert(neighbor) || !self.walkable(neighbor, parms) {
                    continue;
                }
                if arrived(neighbor) {
                    return Some((steps + 1) as f32);
                }
                open.push_back((neighbor, steps + 1));
            }
        }

        None // No path found
    }

    fn designated_cells(&self, designation: &str) -> Vec<Cell> {
        self.designations
            .get(designation)
            .map(|d| d.order.clone())
            .unwrap_or_default()
    }

    fn is_designated(&self, cell: Cell, designation: &str) -> bool {
        self.designations
            .get(designation)
            .is_some_and(|d| d.members.contains(&cell))
    }
}
