//! film-meter: a light meter and film shot log.
//!
//! Frames from a camera (or any frame source) are reduced to an average
//! luminance, turned into an exposure value and matched to a standard
//! shutter speed for the chosen ISO and aperture. Shots are logged to a
//! small on-device store.

pub mod color;
pub mod config;
pub mod error;
pub mod exposure;
pub mod meter;
pub mod state;

pub use color::{average_luminance, PixelBuffer};
pub use config::MeterConfig;
pub use exposure::{estimate_ev, shutter_for, Ev, ExposureCalculator, MatchPolicy, ShutterSpeed};
pub use meter::{LightMeter, MeteringSession, SessionState};
pub use state::{LogStore, SaveStatus, ShotDraft, ShotLog, ShotLogPatch};
