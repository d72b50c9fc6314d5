//! QR Social Core - guest authentication for event sites
//!
//! Guests prove who they are by scanning the QR code printed on their
//! invitation, or by typing their full name. Either credential is resolved
//! against the event's guest list, normalized into a [`SessionUser`], and
//! kept in a durable session that survives restarts.
//!
//! # Features
//!
//! - Cancellable camera capture loop with exactly-once token emission
//! - Guest lookup by QR token or by full name, with a reserved test account
//! - Guest lists over HTTP, from a file, or from a static snapshot
//! - Session store with explicit `Unresolved` / `Anonymous` / `Authenticated`
//!   states, published on a watch channel
//! - Built-in demo accounts for local testing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qrsocial_core::{
//!     AuthService, CaptureConfig, CaptureLoop, FileDatasetSource, FileStore,
//!     ImageSequenceCamera, QrDecoder,
//! };
//!
//! # async fn example() -> qrsocial_core::Result<()> {
//! let source = Arc::new(FileDatasetSource::new("public/invitados.json"));
//! let store = Arc::new(FileStore::new(".qrsocial/session.json"));
//! let mut auth = AuthService::new(source, store);
//!
//! // Restore whoever was logged in last time
//! auth.hydrate_session();
//!
//! // Scan frames until a code decodes, then log that guest in
//! let camera = ImageSequenceCamera::new("frames/");
//! let mut capture = CaptureLoop::start(&camera, CaptureConfig::default(), Box::new(QrDecoder::new()))?;
//! let user = auth.scan_and_login(&mut capture).await?;
//! println!("Welcome, {}", user.full_name());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod dataset;
pub mod error;
pub mod guest;
pub mod matcher;
pub mod normalize;
pub mod service;
pub mod session;
pub mod storage;

// Re-export main types for convenience
pub use capture::{
    Camera, CaptureConfig, CaptureError, CaptureLoop, CaptureOutcome, CapturedFrame,
    DecodedToken, FacingMode, MockCamera, MockDecoder, StopHandle, TokenDecoder, VideoTrack,
};
pub use dataset::{
    DatasetError, DatasetSource, DatasetSourceConfig, DatasetSourceFactory, FileDatasetSource,
    StaticDatasetSource,
};
pub use error::{AuthError, Result};
pub use guest::{GuestDataset, GuestRecord};
pub use matcher::{match_by_name, match_by_token, GuestResolver};
pub use normalize::{normalize, DEFAULT_AVATAR_URL};
pub use service::AuthService;
pub use session::{
    wait_hydrated, Preset, Role, SessionError, SessionState, SessionStore, SessionUser,
    SESSION_KEY,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError};

// Network-dependent exports
#[cfg(feature = "http")]
pub use dataset::{HttpDatasetConfig, HttpDatasetSource};

// Frame decoding exports
#[cfg(feature = "qr")]
pub use capture::{ImageSequenceCamera, QrDecoder};
