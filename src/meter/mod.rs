/// Light metering
///
/// This module handles:
/// - Frame capabilities and sources (source.rs)
/// - The periodic sampling session (session.rs)
/// - The meter state: ISO, aperture, manual and measured EV (this file)

pub mod session;
pub mod source;

pub use session::{
    clamp_interval, MeteringSession, SamplerTask, SessionState, DEFAULT_SAMPLE_INTERVAL,
    MAX_SAMPLE_INTERVAL, MIN_SAMPLE_INTERVAL,
};
pub use source::{
    load_frame, meter_frame, meter_image, FrameCapability, FrameSource, SnapshotCapability,
    SnapshotSource,
};

use std::path::Path;

use crate::error::{SampleError, SettingsError};
use crate::exposure::settings::{require_positive, DEFAULT_APERTURE, DEFAULT_ISO};
use crate::exposure::{Ev, ExposureCalculator, ExposureSettings, ShutterSpeed};
use crate::state::ShotDraft;

/// EV shown before anything is measured or entered
pub const DEFAULT_EV: f64 = 13.0;

/// Manual EV moves in half stops
pub const MANUAL_EV_STEP: f64 = 0.5;

/// Where the current EV came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvSource {
    Manual,
    Measured,
}

/// Meter state: user settings plus the EV they are applied to
#[derive(Debug, Clone, PartialEq)]
pub struct LightMeter {
    iso: u32,
    aperture: f64,
    manual_ev: Ev,
    measured_ev: Option<Ev>,
    calculator: ExposureCalculator,
}

impl Default for LightMeter {
    fn default() -> Self {
        Self::new(ExposureCalculator::default())
    }
}

impl LightMeter {
    pub fn new(calculator: ExposureCalculator) -> Self {
        Self {
            iso: DEFAULT_ISO,
            aperture: DEFAULT_APERTURE,
            manual_ev: Ev::new(DEFAULT_EV),
            measured_ev: None,
            calculator,
        }
    }

    pub fn iso(&self) -> u32 {
        self.iso
    }

    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    pub fn set_iso(&mut self, iso: u32) -> Result<(), SettingsError> {
        require_positive("ISO", iso as f64)?;
        self.iso = iso;
        Ok(())
    }

    pub fn set_aperture(&mut self, aperture: f64) -> Result<(), SettingsError> {
        self.aperture = require_positive("aperture", aperture)?;
        Ok(())
    }

    /// Dial in an EV by hand. Snaps to half stops and replaces any measurement.
    pub fn set_manual_ev(&mut self, ev: f64) {
        let snapped = (ev / MANUAL_EV_STEP).round() * MANUAL_EV_STEP;
        self.manual_ev = Ev::new(snapped);
        self.measured_ev = None;
    }

    /// Take a reading published by a metering session
    pub fn record_measurement(&mut self, ev: Option<Ev>) {
        if ev.is_some() {
            self.measured_ev = ev;
        }
    }

    /// Meter a still image and take it as the measured EV.
    /// Returns the average luminance of the image.
    pub fn meter_still(&mut self, path: &Path) -> Result<f64, SampleError> {
        let (luminance, ev) = meter_image(path)?;
        self.record_measurement(Some(ev));
        Ok(luminance)
    }

    pub fn manual_ev(&self) -> Ev {
        self.manual_ev
    }

    pub fn measured_ev(&self) -> Option<Ev> {
        self.measured_ev
    }

    pub fn ev_source(&self) -> EvSource {
        if self.measured_ev.is_some() {
            EvSource::Measured
        } else {
            EvSource::Manual
        }
    }

    pub fn is_measured(&self) -> bool {
        self.ev_source() == EvSource::Measured
    }

    /// Measured EV if there is one, else the manual value
    pub fn current_ev(&self) -> Ev {
        self.measured_ev.unwrap_or(self.manual_ev)
    }

    pub fn recommended_shutter(&self) -> ShutterSpeed {
        self.calculator
            .shutter_for(self.current_ev(), self.aperture, self.iso as f64)
    }

    pub fn settings(&self) -> ExposureSettings {
        ExposureSettings {
            iso: self.iso,
            aperture: self.aperture,
            shutter: self.recommended_shutter(),
        }
    }

    /// A new-shot draft prefilled with the current settings
    pub fn draft_for_shot(&self) -> ShotDraft {
        ShotDraft::with_settings(self.settings())
    }

    /// Label for the EV readout
    pub fn ev_label(&self) -> &'static str {
        match self.ev_source() {
            EvSource::Measured => "Measured EV",
            EvSource::Manual => "EV (Exposure Value)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::MatchPolicy;

    #[test]
    fn test_defaults() {
        let meter = LightMeter::default();
        assert_eq!(meter.iso(), 400);
        assert_eq!(meter.aperture(), 5.6);
        assert_eq!(meter.current_ev().value(), 13.0);
        assert_eq!(meter.ev_source(), EvSource::Manual);
        assert_eq!(meter.recommended_shutter().token(), "1/60");
    }

    #[test]
    fn test_measurement_overrides_manual() {
        let mut meter = LightMeter::default();
        meter.record_measurement(Some(Ev::new(15.0)));

        assert!(meter.is_measured());
        assert_eq!(meter.current_ev().value(), 15.0);
        assert_eq!(meter.ev_label(), "Measured EV");
        assert_eq!(meter.manual_ev().value(), 13.0);

        // An empty publication does not wipe the last reading
        meter.record_measurement(None);
        assert_eq!(meter.current_ev().value(), 15.0);
    }

    #[test]
    fn test_manual_ev_clears_measurement() {
        let mut meter = LightMeter::default();
        meter.record_measurement(Some(Ev::new(15.0)));

        meter.set_manual_ev(8.2);

        assert_eq!(meter.ev_source(), EvSource::Manual);
        assert_eq!(meter.current_ev().value(), 8.0);
    }

    #[test]
    fn test_manual_ev_is_clamped() {
        let mut meter = LightMeter::default();
        meter.set_manual_ev(25.0);
        assert_eq!(meter.current_ev().value(), 20.0);
        meter.set_manual_ev(-3.0);
        assert_eq!(meter.current_ev().value(), 0.0);
    }

    #[test]
    fn test_rejects_non_positive_settings() {
        let mut meter = LightMeter::default();
        assert!(meter.set_iso(0).is_err());
        assert!(meter.set_aperture(-2.8).is_err());
        assert!(meter.set_aperture(f64::NAN).is_err());
        assert_eq!(meter.iso(), 400);
        assert_eq!(meter.aperture(), 5.6);

        // Values outside the dial are fine for the math
        meter.set_iso(64).unwrap();
        meter.set_aperture(3.5).unwrap();
        assert_eq!(meter.iso(), 64);
    }

    #[test]
    fn test_draft_for_shot_carries_settings() {
        let mut meter = LightMeter::default();
        meter.set_iso(100).unwrap();
        meter.set_aperture(16.0).unwrap();
        meter.set_manual_ev(15.0);

        let draft = meter.draft_for_shot();
        assert_eq!(draft.iso, 100);
        assert_eq!(draft.aperture, 16.0);
        assert_eq!(draft.shutter.token(), "1/125");
        assert!(draft.camera.is_empty());
    }

    #[test]
    fn test_meter_still_logs_measured_ev() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let mut meter = LightMeter::default();
        let luminance = meter.meter_still(&path).unwrap();

        assert!((luminance - 1.0).abs() < 1e-9);
        assert!(meter.is_measured());
        let expected = 100f64.log2() + 5.0;
        assert!((meter.current_ev().value() - expected).abs() < 1e-9);
        assert_eq!(meter.draft_for_shot().shutter, meter.recommended_shutter());
    }

    #[test]
    fn test_meter_still_failure_keeps_manual_ev() {
        let mut meter = LightMeter::default();
        assert!(meter.meter_still(Path::new("/nonexistent/scene.png")).is_err());
        assert_eq!(meter.ev_source(), EvSource::Manual);
        assert_eq!(meter.current_ev().value(), 13.0);
    }

    #[test]
    fn test_uses_configured_policy() {
        let calculator = ExposureCalculator::new(MatchPolicy::Nearest, 0.9);
        let mut meter = LightMeter::new(calculator);
        meter.set_iso(100).unwrap();
        meter.set_aperture(2.0).unwrap();
        meter.record_measurement(Some(Ev::new((4.0f64 / 0.0155).log2())));

        assert_eq!(meter.recommended_shutter().token(), "1/60");
    }
}
