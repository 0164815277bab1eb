/// Metering session: Idle <-> Active lifecycle around a live frame source
///
/// While active, a sampler task pulls a frame every interval, reduces it to
/// an EV and publishes it on a watch channel. The task owns the frame
/// source through a lease that the `SamplerTask` handle can also take back.
/// There is exactly one way to cancel: dropping the `SamplerTask`, which
/// releases the device synchronously and then aborts the task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::source::{meter_frame, FrameCapability, FrameSource};
use crate::error::AcquisitionError;
use crate::exposure::Ev;

/// Default time between two samples
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest allowed time between two samples
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Longest allowed time between two samples
pub const MAX_SAMPLE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Lifecycle state of a metering session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

/// Publishes the measured EV; `None` means nothing measured (manual mode)
pub type ReadingSender = Arc<watch::Sender<Option<Ev>>>;

/// Holds a frame source and releases it when dropped
struct SourceLease<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> Drop for SourceLease<S> {
    fn drop(&mut self) {
        self.source.release();
    }
}

/// Lease shared between the sampler task and its handle. `None` once released.
type SharedLease<S> = Arc<Mutex<Option<SourceLease<S>>>>;

fn lock_lease<S: FrameSource>(lease: &SharedLease<S>) -> MutexGuard<'_, Option<SourceLease<S>>> {
    // A panic inside `current_frame` must not keep the device held
    lease.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The periodic sampling task. Dropping it releases the source and cancels the task.
pub struct SamplerTask {
    handle: JoinHandle<()>,
    release: Box<dyn FnMut() + Send>,
}

impl SamplerTask {
    /// Start sampling `source` every `period`, first sample one period from now
    pub fn spawn<S: FrameSource + 'static>(
        source: S,
        period: Duration,
        reading: ReadingSender,
    ) -> Self {
        let period = clamp_interval(period);
        let lease: SharedLease<S> = Arc::new(Mutex::new(Some(SourceLease { source })));
        let task_lease = Arc::clone(&lease);

        let handle = tokio::spawn(async move {
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tick.tick().await;

                let frame = {
                    let mut guard = lock_lease(&task_lease);
                    match guard.as_mut() {
                        Some(lease) => lease.source.current_frame(),
                        None => break,
                    }
                };

                let Some(frame) = frame else {
                    debug!("no frame available, skipping sample");
                    continue;
                };

                match meter_frame(&frame) {
                    Ok(ev) => {
                        debug!(ev = ev.value(), "sampled frame");
                        reading.send_replace(Some(ev));
                    }
                    Err(e) => debug!(error = %e, "frame could not be metered"),
                }
            }
        });

        let release = Box::new(move || {
            // Dropping the lease calls `release` on the source
            lock_lease(&lease).take();
        });

        Self { handle, release }
    }
}

impl Drop for SamplerTask {
    fn drop(&mut self) {
        (self.release)();
        self.handle.abort();
    }
}

/// Keep a sample period inside [`MIN_SAMPLE_INTERVAL`, `MAX_SAMPLE_INTERVAL`]
pub fn clamp_interval(period: Duration) -> Duration {
    period.clamp(MIN_SAMPLE_INTERVAL, MAX_SAMPLE_INTERVAL)
}

/// Measures light from a frame capability on a fixed cadence
pub struct MeteringSession<C: FrameCapability> {
    capability: C,
    period: Duration,
    reading: ReadingSender,
    sampler: Option<SamplerTask>,
}

impl<C: FrameCapability> MeteringSession<C> {
    pub fn new(capability: C) -> Self {
        Self::with_interval(capability, DEFAULT_SAMPLE_INTERVAL)
    }

    /// Session sampling every `period`, clamped to the allowed range
    pub fn with_interval(capability: C, period: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            capability,
            period: clamp_interval(period),
            reading: Arc::new(sender),
            sampler: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.sampler.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Acquire a frame source and begin sampling
    ///
    /// If acquisition fails the session stays idle and the error is
    /// returned for the caller to show. Starting an active session does
    /// nothing.
    pub async fn start(&mut self) -> Result<(), AcquisitionError> {
        if self.sampler.is_some() {
            debug!("metering session already active");
            return Ok(());
        }

        let source = self.capability.acquire().await.map_err(|e| {
            warn!(error = %e, "failed to acquire frame source");
            e
        })?;

        self.sampler = Some(SamplerTask::spawn(
            source,
            self.period,
            Arc::clone(&self.reading),
        ));
        info!(interval_ms = self.period.as_millis() as u64, "metering started");
        Ok(())
    }

    /// Stop sampling and release the frame source before returning.
    /// Does nothing when idle.
    pub fn stop(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            drop(sampler);
            info!("metering stopped");
        }
    }

    /// Last measured EV, if any
    pub fn measured_ev(&self) -> Option<Ev> {
        *self.reading.borrow()
    }

    /// Forget the measured EV so a manual value becomes current again
    pub fn clear_measurement(&self) {
        self.reading.send_replace(None);
    }

    /// Receive every published measurement
    pub fn subscribe(&self) -> watch::Receiver<Option<Ev>> {
        self.reading.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.period
    }
}

impl<C: FrameCapability> Drop for MeteringSession<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
