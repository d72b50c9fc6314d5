//! Camera backed by a directory of still images.
//!
//! Frames are the directory's image files in file-name order, replayed in a
//! loop. Files that fail to decode are skipped with a warning.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, warn};

use super::{Camera, CaptureError, FacingMode, VideoTrack};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct ImageSequenceCamera {
    dir: PathBuf,
}

impl ImageSequenceCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn frame_paths(&self) -> Result<Vec<PathBuf>, CaptureError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            let reason = format!("{}: {e}", self.dir.display());
            match e.kind() {
                ErrorKind::PermissionDenied => CaptureError::PermissionDenied(reason),
                _ => CaptureError::DeviceUnavailable(reason),
            }
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_frame_file(path))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl Camera for ImageSequenceCamera {
    fn open(&self, facing: FacingMode) -> Result<Box<dyn VideoTrack>, CaptureError> {
        let frames: Vec<RgbaImage> = self
            .frame_paths()?
            .iter()
            .filter_map(|path| match image::open(path) {
                Ok(img) => Some(img.to_rgba8()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable frame");
                    None
                }
            })
            .collect();

        if frames.is_empty() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "no readable frames in {}",
                self.dir.display()
            )));
        }

        debug!(
            dir = %self.dir.display(),
            frames = frames.len(),
            %facing,
            "Image sequence opened"
        );
        Ok(Box::new(ImageSequenceTrack { frames, cursor: 0 }))
    }
}

struct ImageSequenceTrack {
    frames: Vec<RgbaImage>,
    cursor: usize,
}

impl VideoTrack for ImageSequenceTrack {
    fn resolution(&self) -> Option<(u32, u32)> {
        self.frames.get(self.cursor).map(RgbaImage::dimensions)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), CaptureError> {
        let frame = self
            .frames
            .get(self.cursor)
            .ok_or_else(|| CaptureError::DeviceUnavailable("track stopped".into()))?;

        let raw = frame.as_raw();
        if raw.len() != buf.len() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "frame buffer is {} bytes, expected {}",
                buf.len(),
                raw.len()
            )));
        }
        buf.copy_from_slice(raw);

        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(())
    }

    fn stop(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }
}
