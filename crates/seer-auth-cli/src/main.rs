//! seer-auth - log in to the Seer cloud API from the command line.
//!
//! Keeps the session cookie under `~/.seerpy` so other tools (and later runs)
//! can reuse it without prompting again.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use seer_auth_core::{Config, Environment, PromptHint, SessionAuthenticator, VerifyResult};

const USAGE: &str = "\
Usage: seer-auth [COMMAND] [OPTIONS]

Commands:
  login     Authenticate, reusing the saved session when still valid (default)
  status    Check whether the saved session is still accepted
  logout    Remove the saved session

Options:
  --dev              Use the development deployment
  --api-url <URL>    API base URL (default depends on the environment)
  --email <EMAIL>    Email address to log in with
  -h, --help         Print this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Login,
    Status,
    Logout,
}

#[derive(Debug)]
struct Args {
    command: Command,
    development: bool,
    api_url: Option<String>,
    email: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<Args>> {
    let mut parsed = Args {
        command: Command::Login,
        development: false,
        api_url: None,
        email: None,
    };
    let mut command_seen = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--dev" => parsed.development = true,
            "--api-url" => {
                parsed.api_url = Some(args.next().context("--api-url needs a value")?);
            }
            "--email" => {
                parsed.email = Some(args.next().context("--email needs a value")?);
            }
            "login" | "status" | "logout" if !command_seen => {
                command_seen = true;
                parsed.command = match arg.as_str() {
                    "status" => Command::Status,
                    "logout" => Command::Logout,
                    _ => Command::Login,
                };
            }
            other => bail!("unexpected argument '{}'\n\n{}", other, USAGE),
        }
    }

    Ok(Some(parsed))
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    let mut config = config.with_env_overrides()?;
    if args.development {
        config.environment = Some(Environment::Development);
    }
    if args.api_url.is_some() {
        config.api_url = args.api_url.clone();
    }
    if args.email.is_some() {
        config.email = args.email.clone();
    }

    let environment = config.environment();
    let api_url = config.api_url();
    info!(%environment, %api_url, command = ?args.command, "seer-auth starting");

    let hint = Arc::new(PromptHint::new());
    let mut auth = SessionAuthenticator::with_defaults(&api_url, environment, hint)?;

    match args.command {
        Command::Login => {
            auth.authenticate(config.email.clone(), Config::password_from_env())
                .await?;
            Ok(())
        }
        Command::Status => {
            let saved = auth.restore().clone();
            match auth.verify(&saved).await {
                VerifyResult::Active => {
                    println!("Logged in ({})", environment);
                    Ok(())
                }
                VerifyResult::Inactive => bail!("not logged in ({})", environment),
                VerifyResult::Unreachable => bail!("could not reach {}", api_url),
            }
        }
        Command::Logout => {
            auth.destroy_session(environment);
            println!("Logged out ({})", environment);
            Ok(())
        }
    }
}
