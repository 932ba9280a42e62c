//! Entry point for zephyr, a terminal agent for a signed streaming chat endpoint.
//!
//! This binary loads environment variables, parses CLI arguments via [`cli`],
//! and dispatches to the appropriate subcommand handler.

mod agent;
mod auth;
mod chat;
mod cli;
mod client;
mod config;
mod constants;
mod output;
mod protocol;
mod signature;
mod state;
mod tools;

use anyhow::Result;

/// Runs the zephyr CLI.
///
/// Loads `.env` files (silently ignored if absent), parses command-line
/// arguments into a [`cli::Cli`] struct, and dispatches the chosen
/// subcommand via [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    cli::run(cli).await
}
