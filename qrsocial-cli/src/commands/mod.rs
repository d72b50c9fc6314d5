//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod scan;
pub mod whoami;

use anyhow::{Context, Result};
use colored::Colorize;
use qrsocial_core::{Role, SessionUser};

/// Print `user` as pretty JSON or as a short human-readable card.
pub fn print_user(user: &SessionUser, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(user).context("Failed to serialize user")?;
        println!("{out}");
        return Ok(());
    }

    let role = match user.role {
        Role::Guest => user.role.as_str().normal(),
        Role::Admin => user.role.as_str().yellow(),
        Role::SuperAdmin => user.role.as_str().magenta().bold(),
    };

    println!("{}", user.full_name().bold());
    println!("   {} {}", "Id:".dimmed(), user.id);
    println!("   {} {}", "Role:".dimmed(), role);
    println!("   {} {}", "Relation:".dimmed(), user.relation_label);
    println!("   {} {}", "Avatar:".dimmed(), user.avatar_url);
    if !user.bio.is_empty() {
        println!("   {} {}", "Bio:".dimmed(), user.bio);
    }
    Ok(())
}
