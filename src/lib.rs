//! Work Dispatch - priority-tiered task assignment for simulated agents

pub mod core;
pub mod entity;
pub mod spatial;
pub mod work;
