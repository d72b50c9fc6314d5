//! QR decoding via `rqrr`.

use tracing::trace;

use super::{CapturedFrame, DecodedToken, TokenDecoder};

/// Finds QR codes in a frame and returns the first one that decodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl TokenDecoder for QrDecoder {
    fn decode(&self, frame: &CapturedFrame) -> Option<DecodedToken> {
        if frame.is_empty() {
            return None;
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width() as usize,
            frame.height() as usize,
            |x, y| frame.luma(x as u32, y as u32).unwrap_or(u8::MAX),
        );

        let grids = prepared.detect_grids();
        trace!(candidates = grids.len(), "QR grid detection");

        grids.iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(DecodedToken::new(content)),
            Err(e) => {
                trace!(error = %e, "QR grid failed to decode");
                None
            }
        })
    }
}
