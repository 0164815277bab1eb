/// Exposure math
///
/// This module handles:
/// - The standard shutter speed table (shutter.rs)
/// - Brightness to EV estimation (ev.rs)
/// - EV/aperture/ISO to shutter speed matching (calculator.rs)
/// - Selectable ISO and aperture values (settings.rs)

pub mod calculator;
pub mod ev;
pub mod settings;
pub mod shutter;

pub use calculator::{ideal_exposure_time, shutter_for, ExposureCalculator, MatchPolicy};
pub use ev::{estimate_ev, Ev};
pub use settings::ExposureSettings;
pub use shutter::{seconds_for, ShutterSpeed};
