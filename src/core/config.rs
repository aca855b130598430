//! Dispatch configuration with documented constants
//!
//! All search limits are collected here. They can be overridden from a TOML
//! file; missing keys keep their defaults.

use crate::core::error::{DispatchError, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration for candidate scanning and diagnostics
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    // === THING SCANS ===
    /// Straight-line search limit for thing scans that allow unreachable targets
    pub global_search_distance: f32,

    /// Search limit for thing scans that require a path to the target
    ///
    /// Applied to path cost when prioritized, straight-line otherwise.
    pub reachable_search_distance: f32,

    /// Radius of the first ring pass in the nearby-first registry search
    ///
    /// Things inside this radius are examined before the ring search widens.
    /// Larger = fewer ring steps, more things checked per step.
    pub local_search_radius: f32,

    // === CELL SCANS ===
    /// Starting best squared distance for cell scans
    ///
    /// In non-prioritized mode a cell at or beyond this squared distance is
    /// never selected.
    pub cell_scan_distance_squared: f32,

    // === DIAGNOSTICS ===
    /// Number of distinct warning keys remembered for once-only logging
    pub warn_once_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            global_search_distance: 99999.0,
            reachable_search_distance: 9999.0,
            local_search_radius: 24.0,
            cell_scan_distance_squared: 99999.0,
            warn_once_capacity: 4096,
        }
    }
}

impl DispatchConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DispatchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let positive = |x: f32| x.is_finite() && x > 0.0;
        if !positive(self.global_search_distance)
            || !positive(self.reachable_search_distance)
            || !positive(self.cell_scan_distance_squared)
        {
            return Err(DispatchError::InvalidConfig(
                "search distances must be positive".into(),
            ));
        }

        if !positive(self.local_search_radius)
            || self.local_search_radius > self.reachable_search_distance
        {
            return Err(DispatchError::InvalidConfig(format!(
                "local_search_radius ({}) must be in (0, reachable_search_distance ({})]",
                self.local_search_radius, self.reachable_search_distance
            )));
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<DispatchConfig> = OnceLock::new();

/// Get the global dispatch config (initializes with defaults if not set)
pub fn config() -> &'static DispatchConfig {
    CONFIG.get_or_init(DispatchConfig::default)
}

/// Set the global dispatch config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: DispatchConfig) -> std::result::Result<(), DispatchConfig> {
    CONFIG.set(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DispatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DispatchConfig::from_toml_str("local_search_radius = 8.0").unwrap();
        assert_eq!(config.local_search_radius, 8.0);
        assert_eq!(config.reachable_search_distance, 9999.0);
    }

    #[test]
    fn test_rejects_local_radius_beyond_reach() {
        let result = DispatchConfig::from_toml_str(
            "reachable_search_distance = 10.0\nlocal_search_radius = 20.0",
        );
        assert!(matches!(result, Err(DispatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_nan_and_infinite_distances() {
        let mut config = DispatchConfig::default();
        config.reachable_search_distance = f32::NAN;
        assert!(matches!(config.validate(), Err(DispatchError::InvalidConfig(_))));

        let mut config = DispatchConfig::default();
        config.global_search_distance = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = DispatchConfig::default();
        config.local_search_radius = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_distance() {
        let result = DispatchConfig::from_toml_str("global_search_distance = -1.0");
        assert!(result.is_err());
    }
}
