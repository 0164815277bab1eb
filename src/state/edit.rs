/// Drafts and edit buffers for shot logs
///
/// A `ShotDraft` is the "new entry" form. A `LogEditor` is a transient copy
/// of an existing log; nothing reaches the store until the caller turns it
/// into a patch and saves it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data::{ShotLog, ShotLogPatch};
use crate::exposure::settings::{DEFAULT_APERTURE, DEFAULT_ISO};
use crate::exposure::{Ev, ExposureSettings, ShutterSpeed};

/// A shot log that has not been saved yet
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShotDraft {
    pub camera: String,
    pub lens: String,
    pub film: String,
    pub location: String,
    pub notes: String,
    pub iso: u32,
    pub aperture: f64,
    pub shutter: ShutterSpeed,
}

impl Default for ShotDraft {
    /// Blank text, ISO 400, f/5.6, 1/125
    fn default() -> Self {
        Self {
            camera: String::new(),
            lens: String::new(),
            film: String::new(),
            location: String::new(),
            notes: String::new(),
            iso: DEFAULT_ISO,
            aperture: DEFAULT_APERTURE,
            shutter: ShutterSpeed::fallback(),
        }
    }
}

impl ShotDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// A blank draft carrying the given exposure settings
    pub fn with_settings(settings: ExposureSettings) -> Self {
        let mut draft = Self::default();
        draft.apply_settings(settings);
        draft
    }

    pub fn apply_settings(&mut self, settings: ExposureSettings) {
        self.iso = settings.iso;
        self.aperture = settings.aperture;
        self.shutter = settings.shutter;
    }

    /// Check if nothing has been typed or changed
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Clear the form back to its defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Turn the draft into a record
    pub fn into_log(self, id: i64, timestamp: DateTime<Utc>, ev: Ev) -> ShotLog {
        ShotLog {
            id,
            timestamp,
            camera: self.camera,
            lens: self.lens,
            film: self.film,
            location: self.location,
            notes: self.notes,
            iso: self.iso,
            aperture: self.aperture,
            shutter: self.shutter,
            ev,
        }
    }
}

/// In-progress edit of an existing shot log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEditor {
    original: ShotLog,
    /// The working copy; mutate freely
    pub draft: ShotLog,
}

impl LogEditor {
    pub fn begin(log: &ShotLog) -> Self {
        Self {
            original: log.clone(),
            draft: log.clone(),
        }
    }

    /// ID of the log being edited
    pub fn id(&self) -> i64 {
        self.original.id
    }

    pub fn is_dirty(&self) -> bool {
        self.original != self.draft
    }

    /// Patch carrying every field that differs from the original
    pub fn into_patch(self) -> ShotLogPatch {
        let Self { original, draft } = self;

        fn changed<T: PartialEq>(before: &T, after: T) -> Option<T> {
            (*before != after).then_some(after)
        }

        ShotLogPatch {
            camera: changed(&original.camera, draft.camera),
            lens: changed(&original.lens, draft.lens),
            film: changed(&original.film, draft.film),
            location: changed(&original.location, draft.location),
            notes: changed(&original.notes, draft.notes),
            iso: changed(&original.iso, draft.iso),
            aperture: changed(&original.aperture, draft.aperture),
            shutter: changed(&original.shutter, draft.shutter),
            ev: changed(&original.ev, draft.ev),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_blank() {
        let draft = ShotDraft::default();
        assert!(draft.is_blank());
        assert_eq!(draft.iso, 400);
        assert_eq!(draft.aperture, 5.6);
        assert_eq!(draft.shutter.token(), "1/125");
    }

    #[test]
    fn test_reset() {
        let mut draft = ShotDraft::new();
        draft.camera = "Pentax K1000".to_string();
        draft.iso = 100;
        assert!(!draft.is_blank());

        draft.reset();

        assert!(draft.is_blank());
    }

    #[test]
    fn test_with_settings() {
        let settings = ExposureSettings {
            iso: 1600,
            aperture: 2.0,
            shutter: ShutterSpeed::parse("1/30").unwrap(),
        };
        let draft = ShotDraft::with_settings(settings);
        assert_eq!(draft.iso, 1600);
        assert_eq!(draft.shutter.token(), "1/30");
        assert_eq!(draft.camera, "");
    }

    #[test]
    fn test_into_log() {
        let mut draft = ShotDraft::new();
        draft.film = "Portra 400".to_string();
        let now = Utc::now();

        let log = draft.into_log(42, now, Ev::new(11.5));

        assert_eq!(log.id, 42);
        assert_eq!(log.timestamp, now);
        assert_eq!(log.film, "Portra 400");
        assert_eq!(log.ev.value(), 11.5);
    }

    #[test]
    fn test_editor_patch_contains_only_changes() {
        let log = ShotDraft::new().into_log(7, Utc::now(), Ev::new(12.0));
        let mut editor = LogEditor::begin(&log);
        assert!(!editor.is_dirty());

        editor.draft.notes = "cloudy".to_string();
        editor.draft.lens = "35mm".to_string();
        assert!(editor.is_dirty());
        assert_eq!(editor.id(), 7);

        let patch = editor.into_patch();
        assert_eq!(patch.notes.as_deref(), Some("cloudy"));
        assert_eq!(patch.lens.as_deref(), Some("35mm"));
        assert!(patch.camera.is_none());
        assert!(patch.ev.is_none());
    }

    #[test]
    fn test_untouched_editor_gives_empty_patch() {
        let log = ShotDraft::new().into_log(7, Utc::now(), Ev::new(12.0));
        assert!(LogEditor::begin(&log).into_patch().is_empty());
    }
}
