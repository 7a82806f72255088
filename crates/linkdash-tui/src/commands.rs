//! Headless commands run from flags instead of the interactive UI.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use linkdash_core::auth::open_store;
use linkdash_core::{ApiClient, ApiError, Config, Session};

use crate::utils::format_expiry;

pub const USAGE: &str = "\
Usage: linkdash [COMMAND]

With no command, starts the interactive dashboard.

Commands:
  --login     Log in and store the session token
  --logout    Clear the stored session token
  --list      Print all links as JSON
  --status    Show whether a session is stored and when it expires
  --help      Show this message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Interactive,
    Login,
    Logout,
    List,
    Status,
    Help,
}

impl Command {
    /// Parse the first argument after the program name.
    pub fn from_args(args: &[String]) -> Result<Self> {
        match args.get(1).map(String::as_str) {
            None => Ok(Command::Interactive),
            Some("--login") => Ok(Command::Login),
            Some("--logout") => Ok(Command::Logout),
            Some("--list") => Ok(Command::List),
            Some("--status") => Ok(Command::Status),
            Some("--help") | Some("-h") => Ok(Command::Help),
            Some(other) => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        }
    }
}

fn open_session(config: &Config) -> Result<Session> {
    let store = open_store(config.token_store, &config.data_dir()?);
    let mut session = Session::new(store);
    session.load().context("Failed to read stored session")?;
    Ok(session)
}

pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Interactive => Ok(()),
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::Login => login(config).await,
        Command::Logout => logout(config),
        Command::List => list(config).await,
        Command::Status => status(config),
    }
}

async fn login(config: &Config) -> Result<()> {
    let password = match std::env::var("LINKDASH_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let api = ApiClient::from_config(config)?;
    let token = api
        .login(&password)
        .await
        .map_err(|e| match e {
            e @ (ApiError::Unauthorized(_) | ApiError::Rejected { .. }) => {
                anyhow::anyhow!(e.user_message("Incorrect password"))
            }
            other => anyhow::Error::new(other).context("Login failed"),
        })?;

    let mut session = open_session(config)?;
    session.start(token)?;
    info!("Headless login complete");
    println!(
        "Logged in ({}).",
        format_expiry(session.expires_at(), Utc::now())
    );
    Ok(())
}

fn logout(config: &Config) -> Result<()> {
    let mut session = open_session(config)?;
    session.clear()?;
    println!("Logged out.");
    Ok(())
}

async fn list(config: &Config) -> Result<()> {
    let mut session = open_session(config)?;
    let Some(token) = session.token().map(str::to_string) else {
        bail!("Not logged in, run `linkdash --login` first");
    };
    if !session.is_valid() {
        session.clear()?;
        bail!("Session expired, run `linkdash --login` first");
    }

    let api = ApiClient::from_config(config)?.with_token(token);
    match api.list_links().await {
        Ok(links) => {
            println!("{}", serde_json::to_string_pretty(&links)?);
            Ok(())
        }
        Err(e) if e.is_auth_failure() => {
            warn!(error = %e, "Stored session rejected");
            session.clear()?;
            bail!("Session rejected by the server, run `linkdash --login` again");
        }
        Err(e) => Err(e).context("Failed to fetch links"),
    }
}

fn status(config: &Config) -> Result<()> {
    let session = open_session(config)?;
    if session.token().is_none() {
        println!("Not logged in.");
    } else if !session.is_valid() {
        println!("Session expired.");
    } else {
        println!(
            "Logged in ({}), token store: {:?}.",
            format_expiry(session.expires_at(), Utc::now()),
            session.store().kind()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_from_args() {
        assert_eq!(Command::from_args(&args(&["linkdash"])).unwrap(), Command::Interactive);
        assert_eq!(Command::from_args(&args(&["linkdash", "--login"])).unwrap(), Command::Login);
        assert_eq!(Command::from_args(&args(&["linkdash", "--logout"])).unwrap(), Command::Logout);
        assert_eq!(Command::from_args(&args(&["linkdash", "--list"])).unwrap(), Command::List);
        assert_eq!(Command::from_args(&args(&["linkdash", "--status"])).unwrap(), Command::Status);
        assert_eq!(Command::from_args(&args(&["linkdash", "-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_unknown_argument_shows_usage() {
        let err = Command::from_args(&args(&["linkdash", "--frobnicate"])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--frobnicate"));
        assert!(message.contains("Usage: linkdash"));
    }
}
