/// Shared data structures for the shot log
///
/// These structs represent the records that flow between
/// the log store and whatever is showing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exposure::{Ev, ExposureSettings, ShutterSpeed};

/// One logged exposure
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShotLog {
    /// Unique, increasing ID (creation time in milliseconds)
    pub id: i64,
    /// When the shot was logged
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub camera: String,
    #[serde(default)]
    pub lens: String,
    /// Film stock
    #[serde(default)]
    pub film: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    pub iso: u32,
    pub aperture: f64,
    pub shutter: ShutterSpeed,
    /// EV at the time the shot was logged
    pub ev: Ev,
}

impl ShotLog {
    pub fn settings(&self) -> ExposureSettings {
        ExposureSettings {
            iso: self.iso,
            aperture: self.aperture,
            shutter: self.shutter,
        }
    }

    /// Camera name, or a placeholder when none was entered
    pub fn title(&self) -> &str {
        if self.camera.trim().is_empty() {
            "Camera"
        } else {
            &self.camera
        }
    }

    /// e.g. "ISO 400 · f/5.6 · 1/60s · EV 13.0"
    pub fn summary(&self) -> String {
        format!("{} · EV {}", self.settings().summary(), self.ev)
    }
}

/// Changes to apply to an existing shot log. `None` keeps the current value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ShotLogPatch {
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub film: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub iso: Option<u32>,
    pub aperture: Option<f64>,
    pub shutter: Option<ShutterSpeed>,
    pub ev: Option<Ev>,
}

impl ShotLogPatch {
    /// True when applying the patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, log: &mut ShotLog) {
        if let Some(camera) = &self.camera {
            log.camera = camera.clone();
        }
        if let Some(lens) = &self.lens {
            log.lens = lens.clone();
        }
        if let Some(film) = &self.film {
            log.film = film.clone();
        }
        if let Some(location) = &self.location {
            log.location = location.clone();
        }
        if let Some(notes) = &self.notes {
            log.notes = notes.clone();
        }
        if let Some(iso) = self.iso {
            log.iso = iso;
        }
        if let Some(aperture) = self.aperture {
            log.aperture = aperture;
        }
        if let Some(shutter) = self.shutter {
            log.shutter = shutter;
        }
        if let Some(ev) = self.ev {
            log.ev = ev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_log() -> ShotLog {
        ShotLog {
            id: 1_700_000_000_000,
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            camera: "Nikon FM2".to_string(),
            lens: "50mm f/1.8".to_string(),
            film: "HP5+".to_string(),
            location: String::new(),
            notes: String::new(),
            iso: 400,
            aperture: 5.6,
            shutter: ShutterSpeed::parse("1/60").unwrap(),
            ev: Ev::new(13.0),
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample_log()).unwrap();
        assert_eq!(json["id"], 1_700_000_000_000i64);
        assert_eq!(json["shutter"], "1/60");
        assert_eq!(json["film"], "HP5+");
        assert_eq!(json["ev"], 13.0);
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn test_missing_text_fields_default_to_empty() {
        let json = r#"{
            "id": 5,
            "timestamp": "2024-05-01T10:00:00Z",
            "iso": 100,
            "aperture": 8,
            "shutter": "1/250",
            "ev": 14.5
        }"#;
        let log: ShotLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.camera, "");
        assert_eq!(log.title(), "Camera");
        assert_eq!(log.aperture, 8.0);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut log = sample_log();
        let patch = ShotLogPatch {
            notes: Some("backlit, +1 stop".to_string()),
            film: Some("Tri-X".to_string()),
            ..Default::default()
        };
        patch.apply(&mut log);

        assert_eq!(log.notes, "backlit, +1 stop");
        assert_eq!(log.film, "Tri-X");
        assert_eq!(log.camera, "Nikon FM2");
        assert_eq!(log.iso, 400);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ShotLogPatch::default().is_empty());
        let patch = ShotLogPatch {
            iso: Some(800),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_summary() {
        assert_eq!(sample_log().summary(), "ISO 400 · f/5.6 · 1/60s · EV 13.0");
    }
}
