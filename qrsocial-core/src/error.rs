use thiserror::Error;

use crate::capture::CaptureError;
use crate::dataset::DatasetError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("No guest matches the supplied credentials")]
    NoMatch,

    #[error("Capture was stopped before a code was decoded")]
    Cancelled,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    /// True when the failure means "this person is not on the guest list".
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
