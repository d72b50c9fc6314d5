//! Scripted camera and decoder for tests.
//!
//! [`MockCamera`] counts device acquisitions and releases so tests can check
//! that a capture loop stops its track exactly once. [`MockDecoder`] reports
//! a token on a chosen tick.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{
    CaptureError, CapturedFrame, Camera, DecodedToken, FacingMode, TokenDecoder, VideoTrack,
    BYTES_PER_PIXEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    Live,
    Denied,
    Unavailable,
}

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicUsize,
    releases: AtomicUsize,
    frames: AtomicUsize,
}

/// Camera producing solid-grey frames.
#[derive(Debug, Clone)]
pub struct MockCamera {
    availability: Availability,
    resolution: (u32, u32),
    fail_after: Option<usize>,
    counters: Arc<Counters>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            availability: Availability::Live,
            resolution: (64, 48),
            fail_after: None,
            counters: Arc::default(),
        }
    }

    /// Camera whose permission prompt is always refused.
    pub fn denied() -> Self {
        Self {
            availability: Availability::Denied,
            ..Self::new()
        }
    }

    /// Host without a camera.
    pub fn unavailable() -> Self {
        Self {
            availability: Availability::Unavailable,
            ..Self::new()
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    /// Disconnect after `frames` successful reads.
    pub fn fail_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    /// Number of `stop()` calls seen by tracks from this camera.
    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    pub fn frames_read(&self) -> usize {
        self.counters.frames.load(Ordering::SeqCst)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for MockCamera {
    fn open(&self, _facing: FacingMode) -> Result<Box<dyn VideoTrack>, CaptureError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        match self.availability {
            Availability::Denied => Err(CaptureError::PermissionDenied(
                "mock camera refused access".into(),
            )),
            Availability::Unavailable => {
                Err(CaptureError::DeviceUnavailable("no mock camera attached".into()))
            }
            Availability::Live => Ok(Box::new(MockTrack {
                resolution: self.resolution,
                fail_after: self.fail_after,
                counters: self.counters.clone(),
                stopped: false,
            })),
        }
    }
}

struct MockTrack {
    resolution: (u32, u32),
    fail_after: Option<usize>,
    counters: Arc<Counters>,
    stopped: bool,
}

impl VideoTrack for MockTrack {
    fn resolution(&self) -> Option<(u32, u32)> {
        (!self.stopped).then_some(self.resolution)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), CaptureError> {
        if self.stopped {
            return Err(CaptureError::DeviceUnavailable("track stopped".into()));
        }
        let (width, height) = self.resolution;
        if buf.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return Err(CaptureError::DeviceUnavailable("frame buffer size mismatch".into()));
        }

        let read = self.counters.frames.load(Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| read >= limit) {
            return Err(CaptureError::DeviceUnavailable("mock camera disconnected".into()));
        }

        self.counters.frames.fetch_add(1, Ordering::SeqCst);
        buf.fill(0x80);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;
type FrameCheck = Box<dyn Fn(&CapturedFrame) -> bool + Send + Sync>;

/// Decoder that reports `token` from the `n`th call onward.
pub struct MockDecoder {
    token: Option<String>,
    succeed_on: usize,
    calls: AtomicUsize,
    hook: Option<Hook>,
    frame_check: Option<FrameCheck>,
}

impl MockDecoder {
    /// Never finds a code.
    pub fn never() -> Self {
        Self {
            token: None,
            succeed_on: usize::MAX,
            calls: AtomicUsize::new(0),
            hook: None,
            frame_check: None,
        }
    }

    /// Finds `token` on the `n`th call (1-based) and every call after.
    pub fn on_call(n: usize, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            succeed_on: n.max(1),
            ..Self::never()
        }
    }

    /// Run `hook` inside every decode call, before the result is produced.
    pub fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Only report the token for frames that satisfy `check`.
    pub fn with_frame_check(
        mut self,
        check: impl Fn(&CapturedFrame) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.frame_check = Some(Box::new(check));
        self
    }
}

impl TokenDecoder for MockDecoder {
    fn decode(&self, frame: &CapturedFrame) -> Option<DecodedToken> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = &self.hook {
            hook();
        }
        if call < self.succeed_on {
            return None;
        }
        if self.frame_check.as_ref().is_some_and(|check| !check(frame)) {
            return None;
        }
        self.token.as_deref().map(DecodedToken::new)
    }
}

impl std::fmt::Debug for MockDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDecoder")
            .field("token", &self.token)
            .field("succeed_on", &self.succeed_on)
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}
