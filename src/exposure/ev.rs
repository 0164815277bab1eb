/// Exposure values and the brightness-to-EV estimator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest EV the meter reports
pub const EV_MIN: f64 = 0.0;
/// Highest EV the meter reports
pub const EV_MAX: f64 = 20.0;

/// An exposure value, always finite and inside [EV_MIN, EV_MAX]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Ev(f64);

impl Ev {
    /// Clamp any number into the EV range. NaN maps to the floor.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(EV_MIN);
        }
        Self(value.clamp(EV_MIN, EV_MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Ev {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Ev> for f64 {
    fn from(ev: Ev) -> Self {
        ev.0
    }
}

impl fmt::Display for Ev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Estimate scene EV from average normalized luminance
///
/// `EV = log2(L * 100) + 5`, clamped to the meter range. A black frame
/// (L <= 0) would be negative infinity and lands on 0 instead.
pub fn estimate_ev(luminance: f64) -> Ev {
    if luminance.is_nan() || luminance <= 0.0 {
        return Ev::new(EV_MIN);
    }
    Ev::new((luminance * 100.0).log2() + 5.0)
}
