//! Spatial queries: things, reachability, and designations

pub mod grid_map;
pub mod map;
pub mod things;

pub use grid_map::GridMap;
pub use map::{Danger, PathEndMode, TraverseParms, WorkMap};
pub use things::{Thing, ThingGroup, ThingRegistry, ThingRequest};
