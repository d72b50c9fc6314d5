//! Login command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use qrsocial_core::AuthService;
use tracing::info;

use super::print_user;
use crate::LoginMethod;

pub async fn execute(auth: &mut AuthService, method: LoginMethod, json: bool) -> Result<()> {
    auth.hydrate_session();

    let user = match method {
        LoginMethod::Token { token } => auth
            .login_with_token(&token)
            .await
            .context("QR login failed")?,
        LoginMethod::Name { name } => {
            let name = name.join(" ");
            auth.login_with_name(&name)
                .await
                .context("Name login failed")?
        }
        LoginMethod::Preset { preset } => auth
            .login_as_preset(preset)
            .with_context(|| format!("Failed to log in as {preset}"))?,
    };

    info!(user_id = %user.id, role = %user.role, "Logged in");

    if !json {
        println!("{} {}", "Welcome,".green(), user.display_name.green().bold());
    }
    print_user(&user, json)
}
