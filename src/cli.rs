//! Command-line interface definition and dispatch for zephyr.
//!
//! Uses [`clap`] for argument parsing with derive macros.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::auth::AuthStore;
use crate::chat::{self, ChatArgs};
use crate::config::Config;

/// Top-level CLI structure for zephyr.
///
/// Parsed from command-line arguments via [`clap::Parser`]. Contains a single
/// required subcommand that determines which action zephyr performs.
#[derive(Parser)]
#[command(name = "zephyr", about = "A terminal agent for the signed streaming chat endpoint")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the zephyr CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Optional first prompt; read interactively when omitted
        prompt: Vec<String>,
        /// Bearer token, overriding stored credentials
        #[arg(long)]
        token: Option<String>,
        /// Cookie header sent alongside the token
        #[arg(long)]
        cookie: Option<String>,
        /// Persist the resolved credentials for later sessions
        #[arg(long)]
        save_auth: bool,
    },
    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `auth` command.
#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a bearer token (and optional cookie) for later sessions
    Save {
        token: String,
        #[arg(long)]
        cookie: Option<String>,
    },
    /// Show whether credentials are stored
    Show,
    /// Remove stored credentials
    Clear,
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current config
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

fn mask(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}…", prefix)
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Chat {
            prompt,
            token,
            cookie,
            save_auth,
        } => {
            let config = Config::load()?;
            chat::run_chat(
                config,
                ChatArgs {
                    prompt,
                    token,
                    cookie,
                    save_auth,
                },
            )
            .await
        }
        Commands::Auth { action } => {
            match action {
                AuthAction::Save { token, cookie } => {
                    AuthStore {
                        token: Some(token),
                        cookie,
                    }
                    .save()?;
                    println!("credentials saved to {:?}", Config::auth_path()?);
                }
                AuthAction::Show => {
                    let store = AuthStore::load();
                    match &store.token {
                        Some(token) if store.has_auth() => {
                            println!("token: {}", mask(token));
                            println!(
                                "cookie: {}",
                                if store.cookie.is_some() { "set" } else { "none" }
                            );
                        }
                        _ => println!("{}", "no credentials stored.".dimmed()),
                    }
                }
                AuthAction::Clear => {
                    AuthStore::clear()?;
                    println!("credentials cleared.");
                }
            }
            Ok(())
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => {
                    let config = Config::load()?;
                    println!("{}", toml::to_string_pretty(&config)?);
                }
            }
            Ok(())
        }
    }
}
