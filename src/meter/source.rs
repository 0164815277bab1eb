/// Frame sources for the metering session
///
/// A `FrameCapability` is the device-facing side: it grants (or refuses)
/// a live `FrameSource`. The session only ever needs "give me the current
/// frame" and "let go of the device".

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::color::{average_luminance, PixelBuffer};
use crate::error::{AcquisitionError, SampleError};
use crate::exposure::{estimate_ev, Ev};

/// A live feed of frames, exclusively owned by whoever acquired it
pub trait FrameSource: Send {
    /// The latest frame, or `None` if the feed has nothing to show yet
    fn current_frame(&mut self) -> Option<PixelBuffer>;

    /// Give the underlying device back. Called exactly once.
    fn release(&mut self);
}

/// Grants access to a frame source
#[allow(async_fn_in_trait)]
pub trait FrameCapability {
    type Source: FrameSource + 'static;

    async fn acquire(&self) -> Result<Self::Source, AcquisitionError>;
}

/// Run one frame through the luminance sampler and EV estimator
pub fn meter_frame(frame: &PixelBuffer) -> Result<Ev, SampleError> {
    let luminance = average_luminance(frame)?;
    Ok(estimate_ev(luminance))
}

/// Decode an image file into an RGBA frame
pub fn load_frame(path: &Path) -> Result<PixelBuffer, SampleError> {
    let image = image::open(path).map_err(|source| SampleError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PixelBuffer::from(image.into_rgba8()))
}

/// Meter a still image: returns (average luminance, EV)
pub fn meter_image(path: &Path) -> Result<(f64, Ev), SampleError> {
    let frame = load_frame(path)?;
    let luminance = average_luminance(&frame)?;
    Ok((luminance, estimate_ev(luminance)))
}

/// Capability backed by an image file that something else keeps overwriting
/// (a webcam snapshot, a doorbell camera still)
#[derive(Debug, Clone)]
pub struct SnapshotCapability {
    path: PathBuf,
}

impl SnapshotCapability {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameCapability for SnapshotCapability {
    type Source = SnapshotSource;

    async fn acquire(&self) -> Result<SnapshotSource, AcquisitionError> {
        let path = self.path.clone();

        // Decoding is CPU-bound, keep it off the event loop
        let decoded = tokio::task::spawn_blocking(move || load_frame(&path))
            .await
            .map_err(|e| AcquisitionError::Unavailable(format!("task join error: {}", e)))?;

        match decoded {
            Ok(frame) => {
                info!(
                    path = %self.path.display(),
                    width = frame.width,
                    height = frame.height,
                    "snapshot source acquired"
                );
                Ok(SnapshotSource {
                    path: self.path.clone(),
                    released: false,
                })
            }
            Err(e) => Err(AcquisitionError::Unavailable(e.to_string())),
        }
    }
}

/// Re-reads the snapshot file on every pull
#[derive(Debug)]
pub struct SnapshotSource {
    path: PathBuf,
    released: bool,
}

impl FrameSource for SnapshotSource {
    fn current_frame(&mut self) -> Option<PixelBuffer> {
        if self.released {
            return None;
        }
        match load_frame(&self.path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                // Writers replace the file non-atomically now and then
                debug!(error = %e, "snapshot frame unavailable");
                None
            }
        }
    }

    fn release(&mut self) {
        self.released = true;
        debug!(path = %self.path.display(), "snapshot source released");
    }
}
