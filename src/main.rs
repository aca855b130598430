//! Work Sim - Entry Point
//!
//! Builds a small seeded colony map, loads work content, and runs dispatch
//! for every agent each tick. Dispatched jobs complete instantly so the map
//! drains over time.

use work_dispatch::core::config::{set_config, DispatchConfig};
use work_dispatch::core::error::Result;
use work_dispatch::core::types::Cell;
use work_dispatch::entity::{Agent, Target, Task};
use work_dispatch::spatial::{GridMap, ThingGroup, WorkMap};
use work_dispatch::work::givers::builtin_factory;
use work_dispatch::work::{work_urgency, Dispatcher, ProviderRegistry};

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

/// Headless work dispatch simulation
#[derive(Parser, Debug)]
#[command(name = "work-sim")]
#[command(about = "Run priority work dispatch over a seeded colony map")]
struct Args {
    /// Work content file (categories and providers)
    #[arg(long, default_value = "data/work_content.toml")]
    content: PathBuf,

    /// Optional dispatch config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 20)]
    ticks: u32,

    /// Number of agents
    #[arg(long, default_value_t = 3)]
    agents: u32,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct Summary {
    ticks: u32,
    tasks: Vec<TaskRecord>,
    idle_dispatches: u32,
    warnings_emitted: u64,
    warnings_suppressed: u64,
}

#[derive(Serialize)]
struct TaskRecord {
    tick: u32,
    agent: String,
    provider: String,
    task: Task,
}

const MAP_SIZE: i32 = 32;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "work_dispatch=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Some(path) = &args.config {
        let loaded = DispatchConfig::load(path)?;
        if set_config(loaded).is_err() {
            tracing::warn!("Dispatch config already set - ignoring {}", path.display());
        }
    }

    let mut registry = ProviderRegistry::new();
    let ids = registry.load_file(&args.content, &builtin_factory())?;
    tracing::info!("Loaded {} providers from {}", ids.len(), args.content.display());

    let mut dispatcher = Dispatcher::new(registry);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut map = build_map(&mut rng);
    let mut agents = spawn_agents(&dispatcher, &mut rng, args.agents);

    // Player-forced work on the first clearing cell, if any
    if let (Some(agent), Some(&cell)) = (agents.first_mut(), map.designated_cells("clear").first()) {
        agent.force_work("construction", cell);
    }

    let mut summary = Summary {
        ticks: args.ticks,
        tasks: Vec::new(),
        idle_dispatches: 0,
        warnings_emitted: 0,
        warnings_suppressed: 0,
    };

    for tick in 0..args.ticks {
        for agent in agents.iter_mut() {
            if work_urgency(agent) <= 0.0 {
                continue;
            }
            let task = dispatcher
                .dispatch(agent, &map, true)
                .or_else(|| dispatcher.dispatch(agent, &map, false));

            let Some(task) = task else {
                summary.idle_dispatches += 1;
                continue;
            };

            let provider = dispatcher
                .registry()
                .get(task.provider)
                .map(|p| p.def().name.clone())
                .unwrap_or_default();
            if !args.json {
                println!(
                    "[tick {:>3}] {:<8} {:<18} {} {}",
                    tick,
                    agent.name,
                    provider,
                    task.job.kind,
                    task.job.target
                );
            }
            complete(&mut map, agent, &task);
            summary.tasks.push(TaskRecord {
                tick,
                agent: agent.name.clone(),
                provider,
                task,
            });
        }
    }

    summary.warnings_emitted = dispatcher.warnings().emitted();
    summary.warnings_suppressed = dispatcher.warnings().suppressed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "\n{} tasks dispatched, {} idle dispatches over {} ticks",
            summary.tasks.len(),
            summary.idle_dispatches,
            summary.ticks
        );
    }

    Ok(())
}

fn build_map(rng: &mut ChaCha8Rng) -> GridMap {
    let mut map = GridMap::new(MAP_SIZE, MAP_SIZE);

    // Storage block in one corner
    for x in 0..4 {
        for y in 0..4 {
            map.designate("storage", Cell::new(x, y));
        }
    }

    // A wall with a single gap
    for y in 0..MAP_SIZE - 1 {
        map.block(Cell::new(MAP_SIZE / 2, y));
    }

    // A strip to clear beside the wall
    for y in 4..10 {
        map.designate("clear", Cell::new(MAP_SIZE / 2 - 1, y));
    }

    for _ in 0..12 {
        let cell = random_open_cell(&map, rng);
        map.things_mut().spawn("stone", ThingGroup::Haulable, cell);
    }
    for _ in 0..4 {
        let cell = random_open_cell(&map, rng);
        let id = map.things_mut().spawn("barricade", ThingGroup::Building, cell);
        if let Some(thing) = map.things_mut().get_mut(id) {
            thing.health = rng.gen_range(0.2..0.9);
        }
    }

    map
}

fn random_open_cell(map: &GridMap, rng: &mut ChaCha8Rng) -> Cell {
    loop {
        let cell = Cell::new(rng.gen_range(4..MAP_SIZE), rng.gen_range(0..MAP_SIZE));
        if map.is_passable(cell) {
            return cell;
        }
    }
}

fn spawn_agents(dispatcher: &Dispatcher, rng: &mut ChaCha8Rng, count: u32) -> Vec<Agent> {
    let names = ["Ada", "Brom", "Cela", "Dov", "Esk", "Fenn"];
    (0..count)
        .map(|i| {
            let name = names[i as usize % names.len()];
            let position = Cell::new(rng.gen_range(0..MAP_SIZE / 2), rng.gen_range(0..MAP_SIZE));
            let mut agent = Agent::new(name, position);
            agent.work_settings.set_priority("construction", rng.gen_range(1..=3));
            agent.work_settings.set_priority("hauling", rng.gen_range(1..=3));
            agent.work_settings.set_priority("misc", 4);
            dispatcher.refresh_work_settings(&mut agent);
            agent
        })
        .collect()
}

/// Apply a task's effect immediately
fn complete(map: &mut GridMap, agent: &mut Agent, task: &Task) {
    match (task.job.kind.as_str(), task.job.target) {
        ("haul", Target::Thing(id, _)) => {
            if let Some(dest) = task.job.destination {
                map.things_mut().set_position(id, dest);
                agent.position = dest;
            }
        }
        ("clear", Target::Cell(cell)) => {
            map.undesignate("clear", cell);
            agent.position = cell;
        }
        ("repair", Target::Thing(id, cell)) => {
            if let Some(thing) = map.things_mut().get_mut(id) {
                thing.health = 1.0;
            }
            agent.position = cell;
        }
        (_, target) => {
            if let Some(cell) = target.cell() {
                agent.position = cell;
            }
        }
    }
}
