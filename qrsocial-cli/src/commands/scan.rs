//! Scan command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use qrsocial_core::{
    AuthError, AuthService, CaptureConfig, CaptureLoop, ImageSequenceCamera, QrDecoder,
    SessionUser,
};
use tracing::{info, warn};

use super::print_user;

pub async fn execute(
    auth: &mut AuthService,
    frames: PathBuf,
    config: CaptureConfig,
    timeout_secs: Option<u64>,
    json: bool,
) -> Result<()> {
    auth.hydrate_session();

    let camera = ImageSequenceCamera::new(&frames);
    let mut capture = CaptureLoop::start(&camera, config, Box::new(QrDecoder::new()))
        .with_context(|| format!("Failed to open camera feed {}", frames.display()))?;
    let stop = capture.stop_handle();

    if !json {
        eprintln!("{}", "Scanning for an invitation code... (Ctrl+C to cancel)".dimmed());
    }

    let user = tokio::select! {
        result = scan_until_decoded(auth, &mut capture, timeout_secs) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Scan interrupted");
            stop.stop();
            return Err(AuthError::Cancelled).context("Scan cancelled");
        }
    };

    info!(user_id = %user.id, "Logged in from scan");
    if !json {
        println!("{} {}", "Welcome,".green(), user.display_name.green().bold());
    }
    print_user(&user, json)
}

async fn scan_until_decoded(
    auth: &mut AuthService,
    capture: &mut CaptureLoop,
    timeout_secs: Option<u64>,
) -> Result<SessionUser> {
    let attempt = auth.scan_and_login(capture);
    match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), attempt)
            .await
            .with_context(|| format!("No code decoded within {secs}s"))?
            .context("QR login failed"),
        None => attempt.await.context("QR login failed"),
    }
}
