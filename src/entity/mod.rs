//! Agent-side data: the requester and the tasks it receives

pub mod agent;
pub mod tasks;

pub use agent::{Agent, Capacity, ForcedWork, TimeAssignment, WorkSettings, WorkTag};
pub use tasks::{Job, Target, Task, TaskTag};
