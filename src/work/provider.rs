//! Task providers: content-defined rules that produce or find work

use crate::core::error::Result;
use crate::core::types::{Cell, ThingId};
use crate::entity::{Agent, Capacity, Job, Target, TaskTag, WorkTag};
use crate::spatial::{Danger, PathEndMode, Thing, ThingRequest, WorkMap};
use serde::Deserialize;

fn default_max_danger() -> Danger {
    Danger::Deadly
}

/// Immutable descriptor of a provider, usually loaded from content files
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDef {
    pub name: String,
    /// Implementation to build, resolved by a `ProviderFactory`
    pub kind: String,
    pub category: String,
    /// Precedence bucket inside a work list; lower is evaluated first
    #[serde(default)]
    pub tier: i32,
    #[serde(default)]
    pub tag: TaskTag,
    #[serde(default)]
    pub scan_things: bool,
    #[serde(default)]
    pub scan_cells: bool,
    /// Weighted best-of scan instead of nearest-first
    #[serde(default)]
    pub prioritized: bool,
    #[serde(default)]
    pub allow_unreachable: bool,
    #[serde(default)]
    pub non_members_can_do: bool,
    /// Included in the emergency work list
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub work_tags: Vec<WorkTag>,
    #[serde(default)]
    pub required_capacities: Vec<Capacity>,
    #[serde(default)]
    pub thing_request: ThingRequest,
    #[serde(default)]
    pub path_end_mode: PathEndMode,
    #[serde(default = "default_max_danger")]
    pub max_danger: Danger,
    /// Designation the provider works on, for designation-driven kinds
    #[serde(default)]
    pub designation: Option<String>,
}

impl ProviderDef {
    /// A non-scanning def at tier 0; `kind` defaults to the name
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: name.clone(),
            name,
            category: category.into(),
            tier: 0,
            tag: TaskTag::default(),
            scan_things: false,
            scan_cells: false,
            prioritized: false,
            allow_unreachable: false,
            non_members_can_do: false,
            emergency: false,
            work_tags: Vec::new(),
            required_capacities: Vec::new(),
            thing_request: ThingRequest::Nothing,
            path_end_mode: PathEndMode::default(),
            max_danger: default_max_danger(),
            designation: None,
        }
    }

    pub fn with_tier(mut self, tier: i32) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_tag(mut self, tag: TaskTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn scanning_things(mut self, request: ThingRequest) -> Self {
        self.scan_things = true;
        self.thing_request = request;
        self
    }

    pub fn scanning_cells(mut self) -> Self {
        self.scan_cells = true;
        self
    }

    pub fn prioritized(mut self) -> Self {
        self.prioritized = true;
        self
    }

    pub fn allowing_unreachable(mut self) -> Self {
        self.allow_unreachable = true;
        self
    }
}

/// Capability interface every provider implements
///
/// A provider either hands out a job directly through `non_scan_task`, or
/// declares thing and/or cell scans in its def and answers the per-candidate
/// hooks. Every default is the "offers nothing" answer.
pub trait TaskProvider {
    fn def(&self) -> &ProviderDef;

    fn should_skip(&self, _agent: &Agent, _map: &dyn WorkMap) -> bool {
        false
    }

    /// First required capacity the agent lacks
    fn missing_required_capacity(&self, agent: &Agent) -> Option<Capacity> {
        self.def()
            .required_capacities
            .iter()
            .copied()
            .find(|&c| !agent.is_capable_of(c))
    }

    /// A job needing no target search
    fn non_scan_task(&self, _agent: &Agent, _map: &dyn WorkMap) -> Result<Option<Job>> {
        Ok(None)
    }

    /// Finite candidate set; `None` falls back to the registry filtered by `thing_request`
    fn potential_things(&self, _agent: &Agent, _map: &dyn WorkMap) -> Result<Option<Vec<ThingId>>> {
        Ok(None)
    }

    fn thing_request(&self) -> &ThingRequest {
        &self.def().thing_request
    }

    fn has_task_on_thing(&self, _agent: &Agent, _map: &dyn WorkMap, _thing: &Thing) -> Result<bool> {
        Ok(false)
    }

    fn potential_cells(&self, _agent: &Agent, _map: &dyn WorkMap) -> Result<Vec<Cell>> {
        Ok(Vec::new())
    }

    fn has_task_on_cell(&self, _agent: &Agent, _map: &dyn WorkMap, _cell: Cell) -> Result<bool> {
        Ok(false)
    }

    /// Weight used by prioritized scans; higher wins
    fn priority_of(&self, _agent: &Agent, _map: &dyn WorkMap, _target: &Target) -> Result<f32> {
        Ok(0.0)
    }

    fn task_on_thing(&self, _agent: &Agent, _map: &dyn WorkMap, _thing: &Thing) -> Result<Option<Job>> {
        Ok(None)
    }

    fn task_on_cell(&self, _agent: &Agent, _map: &dyn WorkMap, _cell: Cell) -> Result<Option<Job>> {
        Ok(None)
    }

    fn max_path_danger(&self, _agent: &Agent) -> Danger {
        self.def().max_danger
    }

    fn path_end_mode(&self) -> PathEndMode {
        self.def().path_end_mode
    }

    fn prioritized(&self) -> bool {
        self.def().prioritized
    }

    fn allow_unreachable(&self) -> bool {
        self.def().allow_unreachable
    }
}

/// Whether `agent` may take work from `provider` at all
pub fn can_use(agent: &Agent, provider: &dyn TaskProvider, map: &dyn WorkMap) -> bool {
    let def = provider.def();
    (def.non_members_can_do || agent.faction_member)
        && !agent.tags_disabled(&def.work_tags)
        && !provider.should_skip(agent, map)
        && provider.missing_required_capacity(agent).is_none()
}
