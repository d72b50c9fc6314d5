//! Exit codes following sysexits.h conventions.
//!
//! Scripts wrapping the CLI (kiosk launchers, door-check stations) can tell
//! "not on the list" apart from "camera missing" without parsing stderr.

use qrsocial_core::{AuthError, CaptureError, DatasetError, SessionError, StoreError};
use tokio::time::error::Elapsed;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all), including a cancelled scan.
pub const GENERAL_ERROR: i32 = 1;

/// No guest matches the credential.
/// Maps to EX_DATAERR from sysexits.h.
pub const NO_MATCH: i32 = 65;

/// Guest dataset missing, unreachable or malformed.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Camera unavailable or access denied.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const CAMERA_UNAVAILABLE: i32 = 69;

/// Session file could not be read or written.
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Scan timed out without decoding a code.
/// Maps to EX_TEMPFAIL from sysexits.h.
pub const TIMED_OUT: i32 = 75;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        // Classify by the first typed error found in the chain
        let code = err.chain().find_map(classify).unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}

fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    if let Some(err) = cause.downcast_ref::<AuthError>() {
        return Some(match err {
            AuthError::NoMatch => NO_MATCH,
            AuthError::Dataset(_) => INPUT_ERROR,
            AuthError::Capture(_) => CAMERA_UNAVAILABLE,
            AuthError::Session(_) => IO_ERROR,
            AuthError::Cancelled => GENERAL_ERROR,
        });
    }

    if cause.is::<DatasetError>() {
        Some(INPUT_ERROR)
    } else if cause.is::<CaptureError>() {
        Some(CAMERA_UNAVAILABLE)
    } else if cause.is::<SessionError>() || cause.is::<StoreError>() {
        Some(IO_ERROR)
    } else if cause.is::<Elapsed>() {
        Some(TIMED_OUT)
    } else {
        None
    }
}
