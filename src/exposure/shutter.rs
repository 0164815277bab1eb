/// Standard shutter speed table
///
/// The table runs fastest to slowest, 1/8000s to 8s, in full stops.
/// Tokens are the strings photographers read off a dial ("1/125", "2").

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ShutterError;

/// One entry of the shutter table
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(into = "String")]
pub struct ShutterSpeed {
    token: &'static str,
    seconds: f64,
}

/// All standard speeds, fastest first
pub const SHUTTER_SPEEDS: [ShutterSpeed; 17] = [
    ShutterSpeed { token: "1/8000", seconds: 1.0 / 8000.0 },
    ShutterSpeed { token: "1/4000", seconds: 1.0 / 4000.0 },
    ShutterSpeed { token: "1/2000", seconds: 1.0 / 2000.0 },
    ShutterSpeed { token: "1/1000", seconds: 1.0 / 1000.0 },
    ShutterSpeed { token: "1/500", seconds: 1.0 / 500.0 },
    ShutterSpeed { token: "1/250", seconds: 1.0 / 250.0 },
    ShutterSpeed { token: "1/125", seconds: 1.0 / 125.0 },
    ShutterSpeed { token: "1/60", seconds: 1.0 / 60.0 },
    ShutterSpeed { token: "1/30", seconds: 1.0 / 30.0 },
    ShutterSpeed { token: "1/15", seconds: 1.0 / 15.0 },
    ShutterSpeed { token: "1/8", seconds: 1.0 / 8.0 },
    ShutterSpeed { token: "1/4", seconds: 1.0 / 4.0 },
    ShutterSpeed { token: "1/2", seconds: 1.0 / 2.0 },
    ShutterSpeed { token: "1", seconds: 1.0 },
    ShutterSpeed { token: "2", seconds: 2.0 },
    ShutterSpeed { token: "4", seconds: 4.0 },
    ShutterSpeed { token: "8", seconds: 8.0 },
];

/// Index of the speed used when nothing in the table is close enough
const FALLBACK_INDEX: usize = 6;

/// Convert a shutter token to seconds
///
/// Fractional tokens use the reciprocal of the denominator ("1/125" -> 0.008),
/// anything else is read as whole or decimal seconds ("2" -> 2.0).
pub fn seconds_for(token: &str) -> Result<f64, ShutterError> {
    let trimmed = token.trim();

    let value = match trimmed.split_once('/') {
        Some((_, denominator)) => denominator
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| 1.0 / d),
        None => trimmed
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s > 0.0),
    };

    value.ok_or_else(|| ShutterError::Malformed(token.to_string()))
}

impl ShutterSpeed {
    /// Look up a token in the table
    pub fn parse(token: &str) -> Result<Self, ShutterError> {
        let trimmed = token.trim();
        // Malformed input gets the more specific error
        seconds_for(trimmed)?;

        SHUTTER_SPEEDS
            .iter()
            .find(|speed| speed.token == trimmed)
            .copied()
            .ok_or_else(|| ShutterError::Unknown(trimmed.to_string()))
    }

    /// The whole table, fastest first
    pub fn all() -> &'static [ShutterSpeed] {
        &SHUTTER_SPEEDS
    }

    /// The speed returned when no table entry matches (1/125)
    pub fn fallback() -> Self {
        SHUTTER_SPEEDS[FALLBACK_INDEX]
    }

    pub fn token(&self) -> &'static str {
        self.token
    }

    /// Exposure time in seconds
    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

impl Default for ShutterSpeed {
    fn default() -> Self {
        Self::fallback()
    }
}

impl PartialEq for ShutterSpeed {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for ShutterSpeed {}

impl Hash for ShutterSpeed {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

impl fmt::Display for ShutterSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token)
    }
}

impl std::str::FromStr for ShutterSpeed {
    type Err = ShutterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Tokens borrow from the table, not from the input, so any `'de` works
impl<'de> Deserialize<'de> for ShutterSpeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}

impl From<ShutterSpeed> for String {
    fn from(speed: ShutterSpeed) -> Self {
        speed.token.to_string()
    }
}
