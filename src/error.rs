/// Error types for the meter, the exposure math and the shot log
///
/// Each concern gets its own enum so callers can tell a denied camera
/// apart from a corrupt log without string matching.

use std::path::PathBuf;
use thiserror::Error;

/// The frame capability could not hand out a live frame source
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The user or the platform refused access to the device
    #[error("camera access denied: {0}")]
    Denied(String),

    /// No device (or no readable snapshot) is available
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

impl AcquisitionError {
    /// Message suitable for showing to the user as-is
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Denied(_) => "Please allow camera access to use the light meter",
            Self::Unavailable(_) => "No camera is available to measure light",
        }
    }
}

/// A frame could not be reduced to a luminance value
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("frame buffer holds {actual} bytes, expected {expected} for RGBA {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A shutter token could not be parsed or is not in the table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShutterError {
    #[error("malformed shutter speed '{0}'")]
    Malformed(String),

    #[error("'{0}' is not a standard shutter speed")]
    Unknown(String),
}

/// A user-supplied exposure setting is out of range
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("ISO {0} is not one of the supported values")]
    Iso(u32),

    #[error("f/{0} is not one of the supported apertures")]
    Aperture(f64),

    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}

/// Reading or writing the shot log slot failed
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine a data directory")]
    NoDataDir,
}

/// The configuration file exists but cannot be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
