//! Providers shipped with the crate and the factory that builds them

pub mod clear;
pub mod haul;
pub mod repair;
pub mod return_area;

pub use clear::ClearDesignated;
pub use haul::HaulToStorage;
pub use repair::RepairDamaged;
pub use return_area::ReturnToArea;

use crate::work::provider::TaskProvider;
use crate::work::registry::ProviderFactory;

/// Factory knowing every built-in `kind`
pub fn builtin_factory() -> ProviderFactory {
    let mut factory = ProviderFactory::new();
    factory.register("haul_to_storage", |def| {
        Box::new(HaulToStorage::new(def)) as Box<dyn TaskProvider>
    });
    factory.register("clear_designated", |def| {
        Box::new(ClearDesignated::new(def)) as Box<dyn TaskProvider>
    });
    factory.register("repair_damaged", |def| {
        Box::new(RepairDamaged::new(def)) as Box<dyn TaskProvider>
    });
    factory.register("return_to_area", |def| {
        Box::new(ReturnToArea::new(def)) as Box<dyn TaskProvider>
    });
    factory
}
