//! Camera capture and QR decoding.
//!
//! A [`Camera`] hands out a [`VideoTrack`] for a facing-mode hint. The
//! [`CaptureLoop`] owns that track and samples it once per tick, copying each
//! frame into an RGBA [`CapturedFrame`] and passing it to a [`TokenDecoder`].
//! The first decoded token stops the loop and is returned exactly once.
//!
//! ## Cameras
//!
//! - [`ImageSequenceCamera`] - still images in a directory, cycled as a feed
//! - [`MockCamera`] - scripted camera for tests
//!
//! ## Decoders
//!
//! - [`QrDecoder`] - QR detection on the luma channel
//! - [`MockDecoder`] - scripted decoder for tests

mod capture_loop;
#[cfg(feature = "qr")]
mod decoder;
#[cfg(feature = "qr")]
mod image_sequence;
mod mock;

pub use capture_loop::{CaptureConfig, CaptureLoop, CaptureOutcome, StopHandle};
#[cfg(feature = "qr")]
pub use decoder::QrDecoder;
#[cfg(feature = "qr")]
pub use image_sequence::ImageSequenceCamera;
pub use mock::{MockCamera, MockDecoder};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Bytes per pixel in a [`CapturedFrame`] (RGBA).
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
}

/// Which camera the host should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FacingMode {
    /// Rear camera, pointed away from the user. Used for scanning invitations.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment"),
            Self::User => f.write_str("user"),
        }
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(Self::Environment),
            "user" | "front" => Ok(Self::User),
            other => Err(format!("unknown facing mode '{other}'")),
        }
    }
}

/// Source of camera tracks.
pub trait Camera {
    /// Acquire exclusive access to a capture device.
    fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoTrack>, CaptureError>;
}

/// A live video track owned by a capture loop.
pub trait VideoTrack: Send {
    /// Native resolution of the frame the next `read_frame` will copy, or
    /// `None` while the feed is not producing frames yet.
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Copy the current frame into `buf` as RGBA, exactly
    /// `width * height * BYTES_PER_PIXEL` bytes.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), CaptureError>;

    /// Stop the track and release the device.
    fn stop(&mut self);
}

/// Turns a frame into a token, if the frame contains one.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, frame: &CapturedFrame) -> Option<DecodedToken>;
}

/// RGBA pixel buffer sized to the native resolution of the last frame read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl CapturedFrame {
    /// Wrap an RGBA buffer. Returns `None` if the length does not match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == frame_len(width, height)).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// ITU-R BT.601 luma of the pixel at (`x`, `y`), or `None` outside the
    /// frame.
    pub fn luma(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let rgb = self.pixels.get(offset..offset + 3)?;
        let [r, g, b] = [rgb[0], rgb[1], rgb[2]].map(u32::from);
        Some(((299 * r + 587 * g + 114 * b) / 1000) as u8)
    }

    /// Resize the buffer for a `width` x `height` frame and hand it out for
    /// filling. Keeps the allocation when the resolution does not change.
    pub(crate) fn prepare(&mut self, width: u32, height: u32) -> &mut [u8] {
        self.width = width;
        self.height = height;
        self.pixels.resize(frame_len(width, height), 0);
        &mut self.pixels
    }
}

fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Text decoded from an optical code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedToken(String);

impl DecodedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_mode_parse() {
        assert_eq!("environment".parse(), Ok(FacingMode::Environment));
        assert_eq!("Rear".parse(), Ok(FacingMode::Environment));
        assert_eq!("user".parse(), Ok(FacingMode::User));
        assert!("sideways".parse::<FacingMode>().is_err());
        assert_eq!(FacingMode::default().to_string(), "environment");
    }

    #[test]
    fn test_frame_from_rgba_checks_length() {
        assert!(CapturedFrame::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(CapturedFrame::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_frame_prepare_resizes() {
        let mut frame = CapturedFrame::default();
        assert!(frame.is_empty());
        assert_eq!(frame.prepare(4, 3).len(), 48);
        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(frame.prepare(1, 1).len(), 4);
    }

    #[test]
    fn test_luma() {
        let mut pixels = vec![255, 255, 255, 255];
        pixels.extend_from_slice(&[0, 0, 0, 255]);
        let frame = CapturedFrame::from_rgba(2, 1, pixels).unwrap();
        assert_eq!(frame.luma(0, 0), Some(255));
        assert_eq!(frame.luma(1, 0), Some(0));
    }

    #[test]
    fn test_luma_out_of_frame() {
        let frame = CapturedFrame::from_rgba(2, 1, vec![128; 8]).unwrap();
        assert_eq!(frame.luma(1, 0), Some(128));
        assert_eq!(frame.luma(2, 0), None);
        assert_eq!(frame.luma(0, 1), None);
        assert_eq!(frame.luma(u32::MAX, u32::MAX), None);
        assert_eq!(CapturedFrame::default().luma(0, 0), None);
    }
}
