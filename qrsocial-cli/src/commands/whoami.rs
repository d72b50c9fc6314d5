//! Whoami command implementation.

use anyhow::Result;
use colored::Colorize;
use qrsocial_core::{AuthService, SessionState};

use super::print_user;

pub fn execute(auth: &mut AuthService, json: bool) -> Result<()> {
    match auth.hydrate_session() {
        SessionState::Authenticated(user) => print_user(&user, json),
        _ if json => {
            println!("null");
            Ok(())
        }
        _ => {
            println!("{}", "anonymous".dimmed());
            Ok(())
        }
    }
}
