//! QR Social CLI - guest login from the terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use qrsocial_core::{AuthService, DatasetSourceFactory, FacingMode, FileStore, Preset};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;
mod exit_codes;

use config::Config;
use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error or cancelled scan
  65  No guest matches the credential
  66  Guest dataset missing or malformed
  69  Camera unavailable or permission denied
  74  Session file could not be read or written
  75  Scan timed out";

#[derive(Parser)]
#[command(name = "qrsocial")]
#[command(author, version, about = "Guest login by invitation QR code", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Guest dataset URL or path [env: QRSOCIAL_DATASET]
    #[arg(long, global = true, value_name = "SRC")]
    dataset: Option<String>,

    /// Session file [env: QRSOCIAL_SESSION_FILE]
    #[arg(long, global = true, value_name = "PATH")]
    session_file: Option<PathBuf>,

    /// Print the user as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is logged in
    Whoami,

    /// Log in with a credential
    Login {
        #[command(subcommand)]
        method: LoginMethod,
    },

    /// Scan camera frames for an invitation QR code and log that guest in
    Scan {
        /// Directory of still frames to use as the camera feed
        #[arg(long, value_name = "DIR")]
        frames: PathBuf,

        /// Preferred camera
        #[arg(long, default_value = "environment")]
        facing: FacingMode,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// End the current session
    Logout,
}

#[derive(Subcommand)]
pub enum LoginMethod {
    /// Log in with the text encoded in an invitation QR code
    Token {
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Log in with a guest's full name
    Name {
        #[arg(value_name = "NAME", required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Log in as a demo account (guest, admin, super-admin)
    Preset {
        #[arg(value_name = "PRESET")]
        preset: Preset,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("qrsocial=debug,qrsocial_core=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_service(config: &Config) -> Result<AuthService> {
    let source = DatasetSourceFactory::create(config.dataset_source())
        .with_context(|| format!("Failed to open guest dataset {}", config.dataset))?;
    let store = FileStore::new(&config.session_file);

    Ok(AuthService::new(source, std::sync::Arc::new(store)).surface_dataset_errors(true))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(dataset) = cli.dataset {
        config.dataset = dataset;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }

    let mut auth = build_service(&config)?;

    match cli.command {
        Commands::Whoami => commands::whoami::execute(&mut auth, cli.json),
        Commands::Login { method } => commands::login::execute(&mut auth, method, cli.json).await,
        Commands::Scan {
            frames,
            facing,
            timeout,
        } => {
            let capture = config.capture(facing);
            commands::scan::execute(&mut auth, frames, capture, timeout, cli.json).await
        }
        Commands::Logout => commands::logout::execute(&mut auth),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
