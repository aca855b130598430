//! Walk back into the allowed area when standing outside it

use crate::core::error::Result;
use crate::core::types::Cell;
use crate::entity::{Agent, Job, Target};
use crate::spatial::WorkMap;
use crate::work::provider::{ProviderDef, TaskProvider};

pub struct ReturnToArea {
    def: ProviderDef,
}

impl ReturnToArea {
    pub fn new(def: ProviderDef) -> Self {
        Self { def }
    }
}

impl TaskProvider for ReturnToArea {
    fn def(&self) -> &ProviderDef {
        &self.def
    }

    fn non_scan_task(&self, agent: &Agent, map: &dyn WorkMap) -> Result<Option<Job>> {
        let Some(area) = &agent.allowed_area else {
            return Ok(None);
        };
        if area.contains(&agent.position) {
            return Ok(None);
        }

        // Area sets are unordered; break distance ties on coordinates
        let nearest: Option<Cell> = area
            .iter()
            .copied()
            .filter(|&c| map.in_bounds(c) && map.is_passable(c))
            .min_by_key(|c| (c.distance_squared(&agent.position), c.x, c.y));

        Ok(nearest.map(|cell| Job::new("return_to_area", Target::Cell(cell))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::GridMap;

    #[test]
    fn test_no_task_inside_area_or_unrestricted() {
        let map = GridMap::new(10, 10);
        let provider = ReturnToArea::new(ProviderDef::new("return", "misc"));
        let mut agent = Agent::new("Ada", Cell::new(1, 1));
        assert!(provider.non_scan_task(&agent, &map).unwrap().is_none());

        agent.allowed_area = Some([Cell::new(1, 1)].into_iter().collect());
        assert!(provider.non_scan_task(&agent, &map).unwrap().is_none());
    }

    #[test]
    fn test_walks_to_nearest_allowed_cell() {
        let mut map = GridMap::new(10, 10);
        map.block(Cell::new(3, 0));
        let provider = ReturnToArea::new(ProviderDef::new("return", "misc"));
        let mut agent = Agent::new("Ada", Cell::new(0, 0));
        agent.allowed_area = Some(
            [Cell::new(3, 0), Cell::new(5, 0), Cell::new(0, 4)]
                .into_iter()
                .collect(),
        );

        let job = provider.non_scan_task(&agent, &map).unwrap().unwrap();
        assert_eq!(job.target, Target::Cell(Cell::new(0, 4)));
    }
}
