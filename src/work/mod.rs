//! Priority work dispatch
//!
//! - `provider`: the capability interface content rules implement
//! - `registry`: categories, providers, and per-agent work lists
//! - `scanner`: nearest/best candidate search for one provider
//! - `dispatcher`: tiered evaluation producing at most one task
//! - `givers`: built-in providers

pub mod diagnostics;
pub mod dispatcher;
pub mod givers;
pub mod provider;
pub mod registry;
pub mod scanner;

pub use diagnostics::WarnOnce;
pub use dispatcher::{work_urgency, Dispatcher};
pub use provider::{can_use, ProviderDef, TaskProvider};
pub use registry::{ProviderFactory, ProviderRegistry, WorkCategory};
pub use scanner::{Candidate, CandidateScanner, ScanOutcome};
