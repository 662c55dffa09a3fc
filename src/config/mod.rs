// src/config/mod.rs
// Configuration: file values, environment overrides, resolved settings

pub mod env;
pub mod file;

use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub use env::{EnvOverrides, parse_bool};
pub use file::{HeraldConfig, RotationSection};

use crate::delivery::DisplayMode;
use crate::error::{HeraldError, Result};

/// Delay before a new scheduler's first firing
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Interval between subsequent firings
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3);

/// Timing and presentation of the rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    pub initial_delay: Duration,
    pub period: Duration,
    pub display: DisplayMode,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            period: DEFAULT_PERIOD,
            display: DisplayMode::default(),
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            return Err(HeraldError::Config("rotation period must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Fully resolved settings: defaults < config file < environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rotation: RotationConfig,
    pub debug: bool,
    pub show_non_informing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rotation: RotationConfig::default(),
            debug: false,
            show_non_informing: true,
        }
    }
}

impl Settings {
    /// Load from the given config file (or the default location) and the
    /// process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => HeraldConfig::load_from(p),
            None => HeraldConfig::load(),
        };
        Self::resolve(&file, &EnvOverrides::from_env())
    }

    /// Merge file values and environment overrides on top of the defaults
    pub fn resolve(file: &HeraldConfig, env: &EnvOverrides) -> Result<Self> {
        let defaults = Self::default();

        let initial_delay = env
            .initial_delay_ms
            .or(file.rotation.initial_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.rotation.initial_delay);

        let period = env
            .period_ms
            .or(file.rotation.period_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.rotation.period);

        let display = match env.display.as_deref().or(file.rotation.display.as_deref()) {
            Some(raw) => DisplayMode::parse(raw).unwrap_or_else(|| {
                warn!(value = raw, "Unknown display mode, using default");
                defaults.rotation.display
            }),
            None => defaults.rotation.display,
        };

        let settings = Self {
            rotation: RotationConfig {
                initial_delay,
                period,
                display,
            },
            debug: env.debug.unwrap_or(file.debug),
            show_non_informing: env
                .show_non_informing
                .or(file.show_non_informing)
                .unwrap_or(defaults.show_non_informing),
        };
        settings.rotation.validate()?;
        Ok(settings)
    }
}
