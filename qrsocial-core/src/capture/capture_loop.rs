//! Cancellable per-frame capture loop.
//!
//! The loop is a plain task: every tick checks the `active` flag first,
//! reads one frame, tries to decode it, then yields to the runtime before
//! the next tick. [`CaptureLoop::stop`] clears the flag and releases the
//! track synchronously, whether or not a tick is in flight. Both stop and a
//! successful decode go through the same release path, and only the caller
//! that flips `active` performs the release, so the track is stopped exactly
//! once and a decode that loses the race to `stop` is discarded.
//!
//! The track lock is held across `read_frame`. A stop issued from inside
//! `read_frame` on the reading thread only clears the flag; the tick then
//! releases the track as soon as the read returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use tracing::{debug, info, instrument, trace, warn};

use super::{Camera, CaptureError, CapturedFrame, DecodedToken, FacingMode, TokenDecoder, VideoTrack};

/// About one display refresh at 60 Hz.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub facing: FacingMode,
    /// Pause between ticks. Zero yields to the runtime without sleeping.
    pub tick_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// How a capture run ended, short of a device failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Decoded(DecodedToken),
    /// `stop()` was called, or the loop had already emitted its token.
    Stopped,
}

struct Shared {
    active: AtomicBool,
    track: Mutex<Option<Box<dyn VideoTrack>>>,
    /// Thread currently inside `read_frame`, if any.
    reader: Mutex<Option<ThreadId>>,
}

impl Shared {
    fn lock_track(&self) -> MutexGuard<'_, Option<Box<dyn VideoTrack>>> {
        self.track.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_reader(&self, reader: Option<ThreadId>) {
        *self.reader.lock().unwrap_or_else(PoisonError::into_inner) = reader;
    }

    fn reading_on_this_thread(&self) -> bool {
        *self.reader.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }

    /// Deactivate and release the track. Returns `true` only for the one
    /// caller that actually performed the transition.
    fn release(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        // This thread already holds the track lock for the read.
        if self.reading_on_this_thread() {
            debug!("Stop requested from inside a frame read");
            return true;
        }
        if let Some(mut track) = self.lock_track().take() {
            track.stop();
            debug!("Camera track released");
        }
        true
    }
}

/// Cloneable handle that can stop a running [`CaptureLoop`] from elsewhere.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Stop the loop and release the camera. Idempotent.
    pub fn stop(&self) {
        if self.shared.release() {
            info!("Capture stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }
}

pub struct CaptureLoop {
    shared: Arc<Shared>,
    decoder: Box<dyn TokenDecoder>,
    config: CaptureConfig,
    ticks: u64,
}

impl CaptureLoop {
    /// Acquire the camera and arm the loop. Ticks start with [`run`](Self::run).
    #[instrument(level = "debug", skip(camera, decoder), fields(facing = %config.facing))]
    pub fn start(
        camera: &dyn Camera,
        config: CaptureConfig,
        decoder: Box<dyn TokenDecoder>,
    ) -> Result<Self, CaptureError> {
        let track = camera.open(config.facing).map_err(|e| {
            warn!(error = %e, "Camera acquisition failed");
            e
        })?;

        info!("Camera acquired");
        Ok(Self {
            shared: Arc::new(Shared {
                active: AtomicBool::new(true),
                track: Mutex::new(Some(track)),
                reader: Mutex::new(None),
            }),
            decoder,
            config,
            ticks: 0,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Stop the loop and release the camera. Idempotent.
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Number of ticks that sampled the camera.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick until a token is decoded, the loop is stopped, or the device fails.
    ///
    /// A device failure releases the camera and is terminal; so is a decoded
    /// token. Running a finished loop returns [`CaptureOutcome::Stopped`].
    pub async fn run(&mut self) -> Result<CaptureOutcome, CaptureError> {
        let mut frame = CapturedFrame::default();
        loop {
            if let Some(outcome) = self.tick(&mut frame)? {
                return Ok(outcome);
            }
            self.pause().await;
        }
    }

    fn tick(&mut self, frame: &mut CapturedFrame) -> Result<Option<CaptureOutcome>, CaptureError> {
        if !self.shared.active.load(Ordering::Acquire) {
            return Ok(Some(CaptureOutcome::Stopped));
        }

        {
            let mut guard = self.shared.lock_track();
            let Some(track) = guard.as_mut() else {
                return Ok(Some(CaptureOutcome::Stopped));
            };
            let (width, height) = match track.resolution() {
                Some((w, h)) if w > 0 && h > 0 => (w, h),
                _ => {
                    trace!("Camera has no frame yet");
                    return Ok(None);
                }
            };

            self.ticks += 1;
            self.shared.set_reader(Some(thread::current().id()));
            let read = track.read_frame(frame.prepare(width, height));
            self.shared.set_reader(None);

            // Stopped mid-read, either from inside the read or by a caller
            // now waiting on the lock.
            if !self.shared.active.load(Ordering::Acquire) {
                if let Some(mut track) = guard.take() {
                    track.stop();
                    debug!("Camera track released after read");
                }
                return Ok(Some(CaptureOutcome::Stopped));
            }
            drop(guard);

            if let Err(e) = read {
                warn!(error = %e, ticks = self.ticks, "Camera failed during capture");
                return if self.shared.release() {
                    Err(e)
                } else {
                    Ok(Some(CaptureOutcome::Stopped))
                };
            }
        }

        // Decoding runs without the track lock so a stop issued meanwhile
        // can release the device immediately.
        match self.decoder.decode(frame) {
            Some(token) => {
                if self.shared.release() {
                    info!(ticks = self.ticks, "QR code decoded");
                    Ok(Some(CaptureOutcome::Decoded(token)))
                } else {
                    debug!("Code decoded after stop, discarding");
                    Ok(Some(CaptureOutcome::Stopped))
                }
            }
            None => Ok(None),
        }
    }

    async fn pause(&self) {
        if self.config.tick_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.config.tick_interval).await;
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.shared.release() {
            debug!("Capture loop dropped while active");
        }
    }
}

impl std::fmt::Debug for CaptureLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLoop")
            .field("active", &self.is_active())
            .field("ticks", &self.ticks)
            .field("config", &self.config)
            .finish()
    }
}
