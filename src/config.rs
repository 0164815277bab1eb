//! Configuration loading
//!
//! Settings come from a TOML file, `<config dir>/film-meter/config.toml`
//! unless a path is given explicitly. Every key is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::exposure::calculator::DEFAULT_TOLERANCE;
use crate::exposure::settings::{validate_aperture, validate_iso, DEFAULT_APERTURE, DEFAULT_ISO};
use crate::exposure::{ExposureCalculator, MatchPolicy};
use crate::meter::{DEFAULT_SAMPLE_INTERVAL, MAX_SAMPLE_INTERVAL};

/// User configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeterConfig {
    /// Milliseconds between two samples while metering
    pub sample_interval_ms: u64,
    /// Relative error a shutter speed may have and still match
    pub tolerance: f64,
    pub match_policy: MatchPolicy,
    pub default_iso: u32,
    pub default_aperture: f64,
    /// Shot log database; the platform data directory when unset
    pub database_path: Option<PathBuf>,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
            tolerance: DEFAULT_TOLERANCE,
            match_policy: MatchPolicy::default(),
            default_iso: DEFAULT_ISO,
            default_aperture: DEFAULT_APERTURE,
            database_path: None,
        }
    }
}

impl MeterConfig {
    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse or validate is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_interval_ms = MAX_SAMPLE_INTERVAL.as_millis() as u64;
        if self.sample_interval_ms == 0 || self.sample_interval_ms > max_interval_ms {
            return Err(ConfigError::Invalid(format!(
                "sample_interval_ms must be between 1 and {}, got {}",
                max_interval_ms, self.sample_interval_ms
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        validate_iso(self.default_iso).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        validate_aperture(self.default_aperture)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn calculator(&self) -> ExposureCalculator {
        ExposureCalculator::new(self.match_policy, self.tolerance)
    }
}

/// `<config dir>/film-meter/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("film-meter").join("config.toml"))
}
