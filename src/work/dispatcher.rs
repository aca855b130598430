//! Work dispatch - picks the single best task for an agent
//!
//! Providers are evaluated in the agent's list order, which groups them by
//! work category and then by tier. Every provider of a group is evaluated and
//! a candidate replaces the current best only if it has a higher priority, or
//! the same priority and a shorter distance. The first group that yields a
//! candidate ends the scan, so a lower-ranked category never competes with a
//! higher one. Non-scanning tasks return immediately. A faulting provider is
//! logged and skipped.

use crate::core::config::{config, DispatchConfig};
use crate::core::error::{DispatchError, Result};
use crate::core::types::{Cell, ProviderId};
use crate::entity::{Agent, Job, Target, Task, TimeAssignment};
use crate::spatial::WorkMap;
use crate::work::diagnostics::WarnOnce;
use crate::work::provider::{can_use, TaskProvider};
use crate::work::registry::ProviderRegistry;
use crate::work::scanner::{Candidate, CandidateScanner, ScanOutcome};

/// Urgency of working right now, for the scheduler choosing between behaviours
///
/// Zero for agents with no work enabled.
pub fn work_urgency(agent: &Agent) -> f32 {
    if !agent.work_settings.ever_works() {
        return 0.0;
    }
    match agent.time_assignment {
        TimeAssignment::Anything => 5.5,
        TimeAssignment::Work => 9.0,
        TimeAssignment::Sleep | TimeAssignment::Joy => 2.0,
    }
}

pub struct Dispatcher {
    registry: ProviderRegistry,
    config: DispatchConfig,
    warnings: WarnOnce,
}

impl Dispatcher {
    /// Dispatcher using the global config
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_config(registry, config().clone())
    }

    pub fn with_config(registry: ProviderRegistry, config: DispatchConfig) -> Self {
        let warnings = WarnOnce::new(config.warn_once_capacity);
        Self {
            registry,
            config,
            warnings,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn warnings(&self) -> &WarnOnce {
        &self.warnings
    }

    /// Recompute the agent's work lists from its priorities
    pub fn refresh_work_settings(&self, agent: &mut Agent) {
        self.registry.rebuild_work_settings(&mut agent.work_settings);
    }

    /// Select at most one task for `agent`
    ///
    /// In emergency mode a pending forced-task override is tried first; if
    /// nothing at its cell qualifies the override is cleared and the normal
    /// emergency list runs in the same call.
    pub fn dispatch(&mut self, agent: &mut Agent, map: &dyn WorkMap, emergency: bool) -> Option<Task> {
        if emergency && agent.forced.is_some() {
            if let Some(task) = self.dispatch_forced(agent, map) {
                return Some(task);
            }
        }

        let scanner = CandidateScanner::new(&self.config);
        let list = if emergency {
            &agent.work_settings.emergency
        } else {
            &agent.work_settings.normal
        };

        // (category, tier) of the group being evaluated
        let mut current_group: Option<(&str, i32)> = None;
        let mut best: Option<(ProviderId, Candidate<Target>)> = None;

        for &id in list {
            let Some(provider) = self.registry.get(id) else {
                tracing::warn!(agent = %agent, provider = id.0, "Work list references unknown provider");
                continue;
            };
            let group = (provider.def().category.as_str(), provider.def().tier);
            if current_group != Some(group) && best.is_some() {
                break;
            }
            if !can_use(agent, provider, map) {
                continue;
            }

            match evaluate(&scanner, provider, agent, map) {
                Ok(Evaluation::Immediate(job)) => {
                    tracing::debug!(agent = %agent, provider = %provider.def().name, "Non-scan task");
                    return Some(Task::new(id, provider.def().tag, job));
                }
                Ok(Evaluation::Candidate(candidate)) => {
                    if best.as_ref().map_or(true, |(_, b)| candidate.beats(b)) {
                        best = Some((id, candidate));
                    }
                }
                Ok(Evaluation::Nothing) => {}
                Err(err) => log_fault(agent, provider, &err),
            }
            current_group = Some(group);
        }

        let (id, target) = best.map(|(id, candidate)| (id, candidate.value))?;
        let provider = self.registry.get(id)?;
        agent.last_given_category = Some(provider.def().category.clone());

        match resolve(provider, agent, map, target) {
            Ok(Some(job)) => {
                tracing::debug!(
                    agent = %agent,
                    provider = %provider.def().name,
                    target = %target,
                    "Dispatched task"
                );
                Some(Task::new(id, provider.def().tag, job))
            }
            Ok(None) => {
                let detail = target.to_string();
                self.warnings.warn(
                    &provider.def().name,
                    &detail,
                    format_args!(
                        "{} provided target {} but yielded no actual task for agent {}. \
                         The has-task and task-on checks may not be synchronized.",
                        provider.def().name,
                        detail,
                        agent
                    ),
                );
                None
            }
            Err(err) => {
                log_fault(agent, provider, &err);
                None
            }
        }
    }

    fn dispatch_forced(&self, agent: &mut Agent, map: &dyn WorkMap) -> Option<Task> {
        let forced = agent.forced.clone()?;
        let scanner = CandidateScanner::new(&self.config);

        let ids = match self.registry.category_providers(&forced.category) {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!(agent = %agent, error = %err, "Dropping forced work");
                agent.forced = None;
                return None;
            }
        };

        for &id in ids {
            let Some(provider) = self.registry.get(id) else {
                continue;
            };
            if !can_use(agent, provider, map) {
                continue;
            }
            match resolve_targeted(&scanner, provider, agent, map, forced.cell) {
                Ok(Some(job)) => {
                    agent.last_given_category = Some(forced.category.clone());
                    tracing::debug!(
                        agent = %agent,
                        provider = %provider.def().name,
                        cell = %forced.cell,
                        "Forced task"
                    );
                    return Some(Task::new(id, provider.def().tag, job).as_forced());
                }
                Ok(None) => {}
                Err(err) => log_fault(agent, provider, &err),
            }
        }

        tracing::debug!(agent = %agent, cell = %forced.cell, "Forced work exhausted");
        agent.forced = None;
        None
    }
}

/// What a single provider offered during the scan
enum Evaluation {
    Immediate(Job),
    Candidate(Candidate<Target>),
    Nothing,
}

fn evaluate(
    scanner: &CandidateScanner<'_>,
    provider: &dyn TaskProvider,
    agent: &Agent,
    map: &dyn WorkMap,
) -> Result<Evaluation> {
    if let Some(job) = provider.non_scan_task(agent, map)? {
        return Ok(Evaluation::Immediate(job));
    }
    match scanner.scan_provider(provider, agent, map) {
        ScanOutcome::Found(candidate) => Ok(Evaluation::Candidate(candidate)),
        ScanOutcome::NotFound => Ok(Evaluation::Nothing),
        ScanOutcome::Faulted(err) => Err(err),
    }
}

/// Ask the provider to turn its candidate into a concrete job
fn resolve(
    provider: &dyn TaskProvider,
    agent: &Agent,
    map: &dyn WorkMap,
    target: Target,
) -> Result<Option<Job>> {
    match target {
        Target::Thing(id, _) => {
            let thing = map.things().get(id).ok_or_else(|| {
                DispatchError::fault(&provider.def().name, format!("thing #{} vanished", id.0))
            })?;
            provider.task_on_thing(agent, map, thing)
        }
        Target::Cell(cell) => provider.task_on_cell(agent, map, cell),
        Target::None => Ok(None),
    }
}

/// Resolution restricted to a single cell, for forced work
fn resolve_targeted(
    scanner: &CandidateScanner<'_>,
    provider: &dyn TaskProvider,
    agent: &Agent,
    map: &dyn WorkMap,
    cell: Cell,
) -> Result<Option<Job>> {
    if let Some(job) = provider.non_scan_task(agent, map)? {
        return Ok(Some(job));
    }
    let def = provider.def();
    if def.scan_things {
        if let Some(thing) = scanner.thing_at_cell(provider, agent, map, cell)? {
            return provider.task_on_thing(agent, map, thing);
        }
    }
    if def.scan_cells && scanner.cell_at(provider, agent, map, cell)? {
        return provider.task_on_cell(agent, map, cell);
    }
    Ok(None)
}

fn log_fault(agent: &Agent, provider: &dyn TaskProvider, err: &DispatchError) {
    tracing::error!(
        agent = %agent,
        provider = %provider.def().name,
        error = %err,
        "{} faulted in provider {}",
        agent,
        provider.def().name
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::TaskTag;
    use crate::spatial::GridMap;
    use crate::work::provider::ProviderDef;

    struct Idle(ProviderDef);

    impl TaskProvider for Idle {
        fn def(&self) -> &ProviderDef {
            &self.0
        }

        fn non_scan_task(&self, _: &Agent, _: &dyn WorkMap) -> Result<Option<Job>> {
            Ok(Some(Job::new("idle", Target::None)))
        }
    }

    fn single_provider_dispatcher(def: ProviderDef) -> (Dispatcher, Agent) {
        let mut registry = ProviderRegistry::new();
        registry.add_category("misc", 0);
        registry.register(Box::new(Idle(def))).unwrap();

        let dispatcher = Dispatcher::with_config(registry, DispatchConfig::default());
        let mut agent = Agent::new("Ada", Cell::new(0, 0));
        agent.work_settings.set_priority("misc", 1);
        dispatcher.refresh_work_settings(&mut agent);
        (dispatcher, agent)
    }

    #[test]
    fn test_empty_list_gives_no_task() {
        let mut dispatcher = Dispatcher::with_config(ProviderRegistry::new(), DispatchConfig::default());
        let mut agent = Agent::new("Ada", Cell::new(0, 0));
        let map = GridMap::new(4, 4);
        assert!(dispatcher.dispatch(&mut agent, &map, false).is_none());
        assert!(dispatcher.dispatch(&mut agent, &map, true).is_none());
    }

    #[test]
    fn test_single_non_scan_provider() {
        let (mut dispatcher, mut agent) =
            single_provider_dispatcher(ProviderDef::new("idle", "misc").with_tag(TaskTag::Idle));
        let map = GridMap::new(4, 4);

        let task = dispatcher.dispatch(&mut agent, &map, false).unwrap();
        assert_eq!(task.tag, TaskTag::Idle);
        assert_eq!(task.job.kind, "idle");
        assert!(!task.forced);
    }

    #[test]
    fn test_ineligible_provider_skipped() {
        let mut def = ProviderDef::new("idle", "misc");
        def.work_tags = vec![crate::entity::WorkTag::Social];
        let (mut dispatcher, mut agent) = single_provider_dispatcher(def);
        agent.disabled_tags.insert(crate::entity::WorkTag::Social);

        let map = GridMap::new(4, 4);
        assert!(dispatcher.dispatch(&mut agent, &map, false).is_none());
    }

    #[test]
    fn test_work_urgency_table() {
        let mut agent = Agent::new("Ada", Cell::new(0, 0));
        assert_eq!(work_urgency(&agent), 0.0);

        agent.work_settings.set_priority("misc", 1);
        assert_eq!(work_urgency(&agent), 5.5);
        agent.time_assignment = TimeAssignment::Work;
        assert_eq!(work_urgency(&agent), 9.0);
        agent.time_assignment = TimeAssignment::Sleep;
        assert_eq!(work_urgency(&agent), 2.0);
        agent.time_assignment = TimeAssignment::Joy;
        assert_eq!(work_urgency(&agent), 2.0);
    }
}
