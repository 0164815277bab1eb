/// EV + aperture + ISO -> shutter speed
///
/// The reciprocity relation gives an ideal exposure time, which is then
/// matched against the standard shutter table.

use serde::{Deserialize, Serialize};

use super::ev::Ev;
use super::shutter::ShutterSpeed;

/// Relative error a table speed may have and still count as a match
pub const DEFAULT_TOLERANCE: f64 = 0.3;

/// How a computed exposure time is matched to the shutter table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Scan fastest to slowest and take the first speed within tolerance.
    /// When two speeds qualify the faster one wins.
    #[default]
    FirstWithinTolerance,
    /// Take the speed with the smallest relative error, if it is within tolerance
    Nearest,
}

/// Shutter speed matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureCalculator {
    pub policy: MatchPolicy,
    pub tolerance: f64,
}

impl Default for ExposureCalculator {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Ideal exposure time in seconds: `t = N^2 / 2^(EV - log2(ISO / 100))`
///
/// EV is referenced to ISO 100, so higher ISO lowers the effective EV
/// needed and shortens the time.
pub fn ideal_exposure_time(ev: Ev, aperture: f64, iso: f64) -> f64 {
    let effective_ev = ev.value() - (iso / 100.0).log2();
    (aperture * aperture) / 2f64.powf(effective_ev)
}

impl ExposureCalculator {
    pub fn new(policy: MatchPolicy, tolerance: f64) -> Self {
        Self { policy, tolerance }
    }

    /// Pick a standard shutter speed for the given exposure
    ///
    /// Always returns a table entry. If nothing is within tolerance (or the
    /// inputs produce a meaningless time) the result is 1/125, a usable
    /// middle speed rather than the numerically closest one.
    pub fn shutter_for(&self, ev: Ev, aperture: f64, iso: f64) -> ShutterSpeed {
        let ideal = ideal_exposure_time(ev, aperture, iso);
        if !ideal.is_finite() || ideal <= 0.0 {
            return ShutterSpeed::fallback();
        }

        let relative_error = |speed: &ShutterSpeed| (speed.seconds() - ideal).abs() / ideal;
        let speeds = ShutterSpeed::all().iter();

        let matched = match self.policy {
            MatchPolicy::FirstWithinTolerance => {
                speeds.copied().find(|speed| relative_error(speed) < self.tolerance)
            }
            MatchPolicy::Nearest => speeds
                .map(|speed| (relative_error(speed), *speed))
                .filter(|(error, _)| *error < self.tolerance)
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, speed)| speed),
        };

        matched.unwrap_or_else(ShutterSpeed::fallback)
    }
}

/// Shutter speed for EV/aperture/ISO with the default matcher
pub fn shutter_for(ev: Ev, aperture: f64, iso: f64) -> ShutterSpeed {
    ExposureCalculator::default().shutter_for(ev, aperture, iso)
}
