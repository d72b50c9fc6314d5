//! Logout command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use qrsocial_core::AuthService;

pub fn execute(auth: &mut AuthService) -> Result<()> {
    let previous = auth.hydrate_session();
    auth.logout().context("Failed to clear session")?;

    match previous.user() {
        Some(user) => println!("{} {}", "Logged out".green(), user.full_name()),
        None => println!("{}", "No active session".dimmed()),
    }
    Ok(())
}
