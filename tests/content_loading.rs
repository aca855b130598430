//! Shipped work content loads and dispatches end to end

use std::path::PathBuf;

use work_dispatch::core::config::DispatchConfig;
use work_dispatch::core::error::DispatchError;
use work_dispatch::core::types::Cell;
use work_dispatch::entity::{Agent, Target, TaskTag};
use work_dispatch::spatial::{GridMap, ThingGroup};
use work_dispatch::work::givers::builtin_factory;
use work_dispatch::work::{Dispatcher, ProviderRegistry};

fn content_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/work_content.toml")
}

fn shipped_dispatcher() -> Dispatcher {
    let mut registry = ProviderRegistry::new();
    registry.load_file(&content_path(), &builtin_factory()).unwrap();
    Dispatcher::with_config(registry, DispatchConfig::default())
}

fn worker(dispatcher: &Dispatcher, position: Cell) -> Agent {
    let mut agent = Agent::new("Ada", position);
    for category in ["construction", "hauling", "misc"] {
        agent.work_settings.set_priority(category, 1);
    }
    dispatcher.refresh_work_settings(&mut agent);
    agent
}

fn names(dispatcher: &Dispatcher, ids: &[work_dispatch::core::types::ProviderId]) -> Vec<String> {
    ids.iter()
        .filter_map(|&id| dispatcher.registry().get(id))
        .map(|p| p.def().name.clone())
        .collect()
}

#[test]
fn test_shipped_content_loads() {
    let dispatcher = shipped_dispatcher();
    assert_eq!(dispatcher.registry().len(), 4);

    let construction = dispatcher.registry().category_providers("construction").unwrap();
    assert_eq!(names(&dispatcher, construction), ["repair_buildings", "clear_marked"]);
}

#[test]
fn test_work_lists_follow_natural_priority() {
    let dispatcher = shipped_dispatcher();
    let agent = worker(&dispatcher, Cell::new(0, 0));

    assert_eq!(
        names(&dispatcher, &agent.work_settings.normal),
        ["repair_buildings", "clear_marked", "haul_to_storage", "return_to_area"]
    );
    assert_eq!(names(&dispatcher, &agent.work_settings.emergency), ["return_to_area"]);
}

#[test]
fn test_haul_dispatched_to_storage() {
    let mut dispatcher = shipped_dispatcher();
    let mut agent = worker(&dispatcher, Cell::new(0, 0));
    let mut map = GridMap::new(12, 12);
    map.designate("storage", Cell::new(9, 9));
    let stone = map.things_mut().spawn("stone", ThingGroup::Haulable, Cell::new(2, 2));

    let task = dispatcher.dispatch(&mut agent, &map, false).unwrap();
    assert_eq!(task.tag, TaskTag::Hauling);
    assert_eq!(task.job.target, Target::Thing(stone, Cell::new(2, 2)));
    assert_eq!(task.job.destination, Some(Cell::new(9, 9)));
    assert_eq!(agent.last_given_category.as_deref(), Some("hauling"));
}

#[test]
fn test_construction_outranks_hauling() {
    let mut dispatcher = shipped_dispatcher();
    let mut agent = worker(&dispatcher, Cell::new(0, 0));
    let mut map = GridMap::new(12, 12);
    map.designate("storage", Cell::new(9, 9));
    map.things_mut().spawn("stone", ThingGroup::Haulable, Cell::new(1, 1));
    let wall = map.things_mut().spawn("barricade", ThingGroup::Building, Cell::new(8, 2));
    if let Some(thing) = map.things_mut().get_mut(wall) {
        thing.health = 0.5;
    }

    let task = dispatcher.dispatch(&mut agent, &map, false).unwrap();
    assert_eq!(task.tag, TaskTag::Construction);
    assert_eq!(task.job.target.thing(), Some(wall));
}

#[test]
fn test_emergency_returns_agent_to_area() {
    let mut dispatcher = shipped_dispatcher();
    let mut agent = worker(&dispatcher, Cell::new(10, 10));
    agent.allowed_area = Some([Cell::new(1, 1), Cell::new(2, 1)].into_iter().collect());
    let map = GridMap::new(12, 12);

    let task = dispatcher.dispatch(&mut agent, &map, true).unwrap();
    assert_eq!(task.tag, TaskTag::Idle);
    assert_eq!(task.job.target, Target::Cell(Cell::new(2, 1)));
}

#[test]
fn test_unknown_kind_rejected() {
    let mut registry = ProviderRegistry::new();
    let err = registry
        .load_toml(
            r#"
            [[category]]
            name = "misc"

            [[provider]]
            name = "dance"
            kind = "interpretive_dance"
            category = "misc"
            "#,
            &builtin_factory(),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnknownKind(_)));
}
