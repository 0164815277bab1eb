/// Exposure settings and the values offered to the user

use serde::{Deserialize, Serialize};

use super::shutter::ShutterSpeed;
use crate::error::SettingsError;

/// ISO speeds offered for selection
pub const ISO_VALUES: [u32; 9] = [25, 50, 100, 200, 400, 800, 1600, 3200, 6400];

/// Apertures (f-numbers) offered for selection
pub const APERTURE_VALUES: [f64; 9] = [1.4, 2.0, 2.8, 4.0, 5.6, 8.0, 11.0, 16.0, 22.0];

pub const DEFAULT_ISO: u32 = 400;
pub const DEFAULT_APERTURE: f64 = 5.6;

/// ISO, aperture and shutter speed for one exposure
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ExposureSettings {
    pub iso: u32,
    pub aperture: f64,
    pub shutter: ShutterSpeed,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            iso: DEFAULT_ISO,
            aperture: DEFAULT_APERTURE,
            shutter: ShutterSpeed::fallback(),
        }
    }
}

impl ExposureSettings {
    /// Check ISO and aperture against the selectable values
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_iso(self.iso)?;
        validate_aperture(self.aperture)?;
        Ok(())
    }

    /// Short one-line summary, e.g. "ISO 400 · f/5.6 · 1/60s"
    pub fn summary(&self) -> String {
        format!("ISO {} · f/{} · {}s", self.iso, self.aperture, self.shutter)
    }
}

pub fn validate_iso(iso: u32) -> Result<u32, SettingsError> {
    if ISO_VALUES.contains(&iso) {
        Ok(iso)
    } else {
        Err(SettingsError::Iso(iso))
    }
}

pub fn validate_aperture(aperture: f64) -> Result<f64, SettingsError> {
    // f-numbers are written with one decimal, compare with a small epsilon
    APERTURE_VALUES
        .iter()
        .copied()
        .find(|value| (value - aperture).abs() < 1e-6)
        .ok_or(SettingsError::Aperture(aperture))
}

/// Reject zero, negative and non-finite values
pub fn require_positive(name: &'static str, value: f64) -> Result<f64, SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SettingsError::NotPositive { name, value })
    }
}
