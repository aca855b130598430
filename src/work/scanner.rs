//! Candidate search over things and cells for a single provider
//!
//! Selection rules:
//! - Prioritized: highest priority wins, ties go to the closer candidate,
//!   exact ties to the first encountered.
//! - Non-prioritized: nearest wins, first at the minimum distance.
//! - Forbidden candidates are never eligible.
//! - Unless the provider allows unreachable targets, a candidate needs a path
//!   under the provider's danger tolerance and path end mode.
//!
//! Prioritized thing scans measure distance by path cost when reachability is
//! required and by straight line otherwise. The two metrics pick different
//! things near obstacles.
//!
//! `scan_provider` reports the winner as a `Candidate` so the dispatcher can
//! compare providers of one tier. Its `distance` is always the squared
//! straight-line distance from the agent, whatever metric chose it.

use crate::core::config::DispatchConfig;
use crate::core::error::{DispatchError, Result};
use crate::core::types::{Cell, ThingId};
use crate::entity::{Agent, Target};
use crate::spatial::{Thing, TraverseParms, WorkMap};
use crate::work::provider::TaskProvider;

/// Result of scanning one provider
#[derive(Debug)]
pub enum ScanOutcome<T> {
    Found(T),
    NotFound,
    Faulted(DispatchError),
}

impl<T> ScanOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            ScanOutcome::Found(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Result<Option<T>>> for ScanOutcome<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => ScanOutcome::Found(value),
            Ok(None) => ScanOutcome::NotFound,
            Err(err) => ScanOutcome::Faulted(err),
        }
    }
}

/// A scored scan winner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<T> {
    pub value: T,
    /// Provider weight; 0 for non-prioritized scans
    pub priority: f32,
    pub distance: f32,
}

impl<T> Candidate<T> {
    /// Higher priority, or equal priority and strictly closer
    pub fn beats(&self, other: &Candidate<T>) -> bool {
        self.priority > other.priority
            || (self.priority == other.priority && self.distance < other.distance)
    }
}

pub struct CandidateScanner<'a> {
    config: &'a DispatchConfig,
}

impl<'a> CandidateScanner<'a> {
    pub fn new(config: &'a DispatchConfig) -> Self {
        Self { config }
    }

    /// Best thing the provider offers, if any
    pub fn scan_things(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
    ) -> ScanOutcome<ThingId> {
        self.try_scan_things(provider, agent, map)
            .map(|found| found.map(|(id, _)| id))
            .into()
    }

    /// Best cell the provider offers, if any
    pub fn scan_cells(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
    ) -> ScanOutcome<Cell> {
        self.try_scan_cells(provider, agent, map)
            .map(|found| found.map(|(cell, _)| cell))
            .into()
    }

    /// Best candidate of a scanning provider; a thing beats a cell
    pub fn scan_provider(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
    ) -> ScanOutcome<Candidate<Target>> {
        self.try_scan_provider(provider, agent, map).into()
    }

    fn try_scan_provider(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
    ) -> Result<Option<Candidate<Target>>> {
        let def = provider.def();
        let origin = agent.position;
        let scored = |target: Target, priority: f32| {
            let distance = target
                .cell()
                .map_or(0.0, |cell| cell.distance_squared(&origin) as f32);
            Candidate {
                value: target,
                priority,
                distance,
            }
        };

        if def.scan_things {
            if let Some((id, priority)) = self.try_scan_things(provider, agent, map)? {
                let cell = map.things().get(id).map(|t| t.position).unwrap_or_default();
                return Ok(Some(scored(Target::Thing(id, cell), priority)));
            }
        }
        if def.scan_cells {
            if let Some((cell, priority)) = self.try_scan_cells(provider, agent, map)? {
                return Ok(Some(scored(Target::Cell(cell), priority)));
            }
        }
        Ok(None)
    }

    fn try_scan_things(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
    ) -> Result<Option<(ThingId, f32)>> {
        let origin = agent.position;
        let parms = TraverseParms::with_max_danger(provider.max_path_danger(agent));
        let end = provider.path_end_mode();
        let supplied = provider.potential_things(agent, map)?;

        let validator = |thing: &Thing| -> Result<bool> {
            Ok(!map.is_thing_forbidden(thing, agent) && provider.has_task_on_thing(agent, map, thing)?)
        };
        let candidates = || match &supplied {
            Some(ids) => ids
                .iter()
                .filter_map(|&id| map.things().get(id))
                .collect::<Vec<_>>(),
            None => map
                .things()
                .matching(provider.thing_request())
                .collect::<Vec<_>>(),
        };

        let unweighted = |found: Option<ThingId>| found.map(|id| (id, 0.0));

        let found = if provider.prioritized() {
            let best = if provider.allow_unreachable() {
                best_prioritized(
                    candidates(),
                    self.config.global_search_distance,
                    |t| Some(t.position.distance(&origin)),
                    validator,
                    |t| provider.priority_of(agent, map, &Target::Thing(t.id, t.position)),
                )
            } else {
                best_prioritized(
                    candidates(),
                    self.config.reachable_search_distance,
                    |t| map.path_cost(origin, t.position, end, parms),
                    validator,
                    |t| provider.priority_of(agent, map, &Target::Thing(t.id, t.position)),
                )
            };
            best?.map(|b| (b.value, b.priority))
        } else if provider.allow_unreachable() {
            unweighted(nearest_linear(
                candidates(),
                origin,
                self.config.global_search_distance,
                validator,
            )?)
        } else if supplied.is_some() {
            unweighted(nearest_linear(
                candidates(),
                origin,
                self.config.reachable_search_distance,
                |t| Ok(validator(t)? && map.can_reach(origin, t.position, end, parms)),
            )?)
        } else {
            unweighted(map.things().nearest_matching(
                origin,
                provider.thing_request(),
                self.config.reachable_search_distance,
                self.config.local_search_radius,
                |t| Ok(validator(t)? && map.can_reach(origin, t.position, end, parms)),
            )?)
        };
        Ok(found)
    }

    fn try_scan_cells(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
    ) -> Result<Option<(Cell, f32)>> {
        let origin = agent.position;
        let prioritized = provider.prioritized();
        let allow_unreachable = provider.allow_unreachable();
        let parms = TraverseParms::with_max_danger(provider.max_path_danger(agent));
        let end = provider.path_end_mode();

        let mut best_distance = self.config.cell_scan_distance_squared;
        let mut best_priority = f32::MIN;
        let mut best: Option<Cell> = None;

        for cell in provider.potential_cells(agent, map)? {
            let distance = cell.distance_squared(&origin) as f32;
            let mut priority = 0.0;

            if prioritized {
                if map.is_cell_forbidden(cell, agent) || !provider.has_task_on_cell(agent, map, cell)? {
                    continue;
                }
                if !allow_unreachable && !map.can_reach(origin, cell, end, parms) {
                    continue;
                }
                priority = provider.priority_of(agent, map, &Target::Cell(cell))?;
                if !(priority > best_priority
                    || (priority == best_priority && distance < best_distance))
                {
                    continue;
                }
            } else {
                if distance >= best_distance
                    || map.is_cell_forbidden(cell, agent)
                    || !provider.has_task_on_cell(agent, map, cell)?
                {
                    continue;
                }
                if !allow_unreachable && !map.can_reach(origin, cell, end, parms) {
                    continue;
                }
            }

            best = Some(cell);
            best_distance = distance;
            best_priority = priority;
        }

        Ok(best.map(|cell| (cell, best_priority)))
    }

    /// First thing on `cell` the provider accepts, ignoring distance
    pub fn thing_at_cell<'m>(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &'m dyn WorkMap,
        cell: Cell,
    ) -> Result<Option<&'m Thing>> {
        for thing in map.things().things_at(cell) {
            if provider.thing_request().accepts(thing)
                && !map.is_thing_forbidden(thing, agent)
                && provider.has_task_on_thing(agent, map, thing)?
            {
                return Ok(Some(thing));
            }
        }
        Ok(None)
    }

    /// Whether the provider has work on exactly this cell
    pub fn cell_at(
        &self,
        provider: &dyn TaskProvider,
        agent: &Agent,
        map: &dyn WorkMap,
        cell: Cell,
    ) -> Result<bool> {
        Ok(!map.is_cell_forbidden(cell, agent) && provider.has_task_on_cell(agent, map, cell)?)
    }
}

/// Highest priority within `max_distance`, ties broken by `distance`
///
/// The returned distance is in the scan's own metric.
fn best_prioritized<'t, D, V, P>(
    things: Vec<&'t Thing>,
    max_distance: f32,
    distance: D,
    validator: V,
    priority: P,
) -> Result<Option<Candidate<ThingId>>>
where
    D: Fn(&Thing) -> Option<f32>,
    V: Fn(&Thing) -> Result<bool>,
    P: Fn(&Thing) -> Result<f32>,
{
    let mut best: Option<Candidate<ThingId>> = None;
    for thing in things {
        if !validator(thing)? {
            continue;
        }
        let Some(dist) = distance(thing) else {
            continue;
        };
        if dist > max_distance {
            continue;
        }
        let candidate = Candidate {
            value: thing.id,
            priority: priority(thing)?,
            distance: dist,
        };
        if best.as_ref().map_or(true, |b| candidate.beats(b)) {
            best = Some(candidate);
        }
    }
    Ok(best)
}

/// Nearest by straight line within `max_distance`; first at the minimum wins
fn nearest_linear<'t, V>(
    things: Vec<&'t Thing>,
    origin: Cell,
    max_distance: f32,
    validator: V,
) -> Result<Option<ThingId>>
where
    V: Fn(&Thing) -> Result<bool>,
{
    let max_sq = (max_distance as f64) * (max_distance as f64);
    let mut best: Option<(i64, ThingId)> = None;
    for thing in things {
        let dist_sq = thing.position.distance_squared(&origin);
        if dist_sq as f64 > max_sq || best.is_some_and(|(b, _)| dist_sq >= b) {
            continue;
        }
        if validator(thing)? {
            best = Some((dist_sq, thing.id));
        }
    }
    Ok(best.map(|(_, id)| id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Job;
    use crate::spatial::{GridMap, ThingGroup, ThingRequest};
    use crate::work::provider::ProviderDef;
    use ahash::AHashMap;

    /// Offers every accepted thing/cell with a fixed priority table
    struct Probe {
        def: ProviderDef,
        cells: Vec<Cell>,
        priorities: AHashMap<Cell, f32>,
        supplied: Option<Vec<ThingId>>,
        fail_on: Option<Cell>,
    }

    impl Probe {
        fn new(def: ProviderDef) -> Self {
            Self {
                def,
                cells: Vec::new(),
                priorities: AHashMap::new(),
                supplied: None,
                fail_on: None,
            }
        }

        fn priority_at(&self, cell: Cell) -> f32 {
            self.priorities.get(&cell).copied().unwrap_or(0.0)
        }
    }

    impl TaskProvider for Probe {
        fn def(&self) -> &ProviderDef {
            &self.def
        }

        fn potential_things(&self, _: &Agent, _: &dyn WorkMap) -> Result<Option<Vec<ThingId>>> {
            Ok(self.supplied.clone())
        }

        fn has_task_on_thing(&self, _: &Agent, _: &dyn WorkMap, thing: &Thing) -> Result<bool> {
            if self.fail_on == Some(thing.position) {
                return Err(DispatchError::fault(&self.def.name, "probe failure"));
            }
            Ok(true)
        }

        fn potential_cells(&self, _: &Agent, _: &dyn WorkMap) -> Result<Vec<Cell>> {
            Ok(self.cells.clone())
        }

        fn has_task_on_cell(&self, _: &Agent, _: &dyn WorkMap, _: Cell) -> Result<bool> {
            Ok(true)
        }

        fn priority_of(&self, _: &Agent, _: &dyn WorkMap, target: &Target) -> Result<f32> {
            Ok(target.cell().map(|c| self.priority_at(c)).unwrap_or(0.0))
        }

        fn task_on_cell(&self, _: &Agent, _: &dyn WorkMap, cell: Cell) -> Result<Option<Job>> {
            Ok(Some(Job::new("probe", Target::Cell(cell))))
        }
    }

    fn haulables() -> ProviderDef {
        ProviderDef::new("probe", "test").scanning_things(ThingRequest::Group(ThingGroup::Haulable))
    }

    fn agent_at(x: i32, y: i32) -> Agent {
        Agent::new("Ada", Cell::new(x, y))
    }

    #[test]
    fn test_nearest_thing_wins() {
        let mut map = GridMap::new(20, 20);
        map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(9, 0));
        let near = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(2, 0));
        map.things_mut().spawn("wall", ThingGroup::Building, Cell::new(1, 0));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let found = scanner.scan_things(&Probe::new(haulables()), &agent_at(0, 0), &map);
        assert_eq!(found.found(), Some(near));
    }

    #[test]
    fn test_forbidden_thing_never_selected() {
        let mut map = GridMap::new(20, 20);
        let near = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(1, 0));
        let far = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(8, 0));
        map.things_mut().get_mut(near).unwrap().forbidden = true;

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let provider = Probe::new(haulables().prioritized());
        let found = scanner.scan_things(&provider, &agent_at(0, 0), &map);
        assert_eq!(found.found(), Some(far));
    }

    #[test]
    fn test_unreachable_thing_skipped_unless_allowed() {
        let mut map = GridMap::new(20, 20);
        for y in 0..20 {
            map.block(Cell::new(5, y));
        }
        let behind_wall = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(7, 0));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let agent = agent_at(0, 0);

        let strict = Probe::new(haulables());
        assert!(scanner.scan_things(&strict, &agent, &map).found().is_none());

        let lenient = Probe::new(haulables().allowing_unreachable());
        assert_eq!(scanner.scan_things(&lenient, &agent, &map).found(), Some(behind_wall));
    }

    #[test]
    fn test_prioritized_reachable_uses_path_distance() {
        // The straight-line nearer thing sits behind a wall with a long detour
        let mut map = GridMap::new(20, 20);
        for y in 0..19 {
            map.block(Cell::new(3, y));
        }
        let behind = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(5, 0));
        let open = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(0, 7));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let agent = agent_at(0, 0);

        let by_path = Probe::new(haulables().prioritized());
        assert_eq!(scanner.scan_things(&by_path, &agent, &map).found(), Some(open));

        let by_line = Probe::new(haulables().prioritized().allowing_unreachable());
        assert_eq!(scanner.scan_things(&by_line, &agent, &map).found(), Some(behind));
    }

    #[test]
    fn test_supplied_things_used_as_is() {
        let mut map = GridMap::new(20, 20);
        map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(1, 0));
        let supplied = map.things_mut().spawn("wall", ThingGroup::Building, Cell::new(6, 0));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let mut provider = Probe::new(haulables());
        provider.supplied = Some(vec![supplied]);
        let found = scanner.scan_things(&provider, &agent_at(0, 0), &map);
        assert_eq!(found.found(), Some(supplied));
    }

    #[test]
    fn test_thing_fault_reported() {
        let mut map = GridMap::new(20, 20);
        map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(1, 0));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let mut provider = Probe::new(haulables());
        provider.fail_on = Some(Cell::new(1, 0));
        let outcome = scanner.scan_things(&provider, &agent_at(0, 0), &map);
        assert!(matches!(outcome, ScanOutcome::Faulted(DispatchError::ProviderFault { .. })));
    }

    #[test]
    fn test_prioritized_cells_prefer_priority_then_distance() {
        let map = GridMap::new(20, 20);
        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);

        let mut provider = Probe::new(ProviderDef::new("probe", "test").scanning_cells().prioritized());
        provider.cells = vec![Cell::new(6, 0), Cell::new(2, 0), Cell::new(9, 0), Cell::new(4, 0)];
        provider.priorities.insert(Cell::new(9, 0), 5.0);
        provider.priorities.insert(Cell::new(4, 0), 5.0);

        let found = scanner.scan_cells(&provider, &agent_at(0, 0), &map);
        assert_eq!(found.found(), Some(Cell::new(4, 0)));
    }

    #[test]
    fn test_cell_exact_tie_keeps_first() {
        let map = GridMap::new(20, 20);
        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);

        let mut provider = Probe::new(ProviderDef::new("probe", "test").scanning_cells().prioritized());
        provider.cells = vec![Cell::new(5, 3), Cell::new(3, 5), Cell::new(5, 5)];

        let found = scanner.scan_cells(&provider, &agent_at(4, 4), &map);
        assert_eq!(found.found(), Some(Cell::new(5, 3)));
    }

    #[test]
    fn test_non_prioritized_cells_nearest_and_allowed() {
        let mut map = GridMap::new(20, 20);
        map.forbid_cell(Cell::new(1, 0));
        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);

        let mut provider = Probe::new(ProviderDef::new("probe", "test").scanning_cells());
        provider.cells = vec![Cell::new(7, 0), Cell::new(1, 0), Cell::new(3, 0)];

        let found = scanner.scan_cells(&provider, &agent_at(0, 0), &map);
        assert_eq!(found.found(), Some(Cell::new(3, 0)));
    }

    #[test]
    fn test_scan_provider_prefers_thing() {
        let mut map = GridMap::new(20, 20);
        let rock = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(9, 9));
        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);

        let mut provider = Probe::new(haulables().scanning_cells());
        provider.cells = vec![Cell::new(1, 0)];
        let candidate = scanner.scan_provider(&provider, &agent_at(0, 0), &map).found().unwrap();
        assert_eq!(candidate.value, Target::Thing(rock, Cell::new(9, 9)));
        assert_eq!(candidate.priority, 0.0);
        assert_eq!(candidate.distance, 162.0);
    }

    #[test]
    fn test_scan_provider_reports_priority() {
        let map = GridMap::new(20, 20);
        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);

        let mut provider = Probe::new(ProviderDef::new("probe", "test").scanning_cells().prioritized());
        provider.cells = vec![Cell::new(3, 4), Cell::new(1, 0)];
        provider.priorities.insert(Cell::new(3, 4), 2.5);

        let candidate = scanner.scan_provider(&provider, &agent_at(0, 0), &map).found().unwrap();
        assert_eq!(candidate.value, Target::Cell(Cell::new(3, 4)));
        assert_eq!(candidate.priority, 2.5);
        assert_eq!(candidate.distance, 25.0);
    }

    #[test]
    fn test_candidate_comparison() {
        let near = Candidate { value: 1, priority: 3.0, distance: 1.0 };
        let far = Candidate { value: 2, priority: 3.0, distance: 25.0 };
        let urgent = Candidate { value: 3, priority: 4.0, distance: 99.0 };
        assert!(near.beats(&far));
        assert!(!far.beats(&near));
        assert!(urgent.beats(&near));
        assert!(!near.beats(&near));
    }

    #[test]
    fn test_thing_exact_tie_keeps_first_by_line() {
        let mut map = GridMap::new(20, 20);
        let first = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(7, 4));
        map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(1, 4));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let provider = Probe::new(haulables().prioritized().allowing_unreachable());
        let found = scanner.scan_things(&provider, &agent_at(4, 4), &map);
        assert_eq!(found.found(), Some(first));
    }

    #[test]
    fn test_thing_exact_tie_keeps_first_by_path() {
        let mut map = GridMap::new(20, 20);
        let first = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(4, 8));
        map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(4, 0));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let provider = Probe::new(haulables().prioritized());
        let found = scanner.scan_things(&provider, &agent_at(4, 4), &map);
        assert_eq!(found.found(), Some(first));
    }

    #[test]
    fn test_targeted_lookups() {
        let mut map = GridMap::new(20, 20);
        map.things_mut().spawn("wall", ThingGroup::Building, Cell::new(3, 3));
        let rock = map.things_mut().spawn("rock", ThingGroup::Haulable, Cell::new(3, 3));
        map.forbid_cell(Cell::new(4, 4));

        let config = DispatchConfig::default();
        let scanner = CandidateScanner::new(&config);
        let provider = Probe::new(haulables());
        let agent = agent_at(0, 0);

        let thing = scanner.thing_at_cell(&provider, &agent, &map, Cell::new(3, 3)).unwrap();
        assert_eq!(thing.map(|t| t.id), Some(rock));
        assert!(scanner.cell_at(&provider, &agent, &map, Cell::new(3, 3)).unwrap());
        assert!(!scanner.cell_at(&provider, &agent, &map, Cell::new(4, 4)).unwrap());
    }
}
