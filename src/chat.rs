//! Interactive chat REPL for zephyr.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). The remote endpoint reconstructs
//! conversation history from the threaded message ids, so each turn sends
//! only the new prompt.

use anyhow::{bail, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agent::Agent;
use crate::auth::AuthStore;
use crate::client::ChatClient;
use crate::config::Config;
use crate::output::{Renderer, StdoutRenderer};
use crate::state::ConversationState;
use crate::tools::ToolRegistry;

/// Arguments forwarded from the `chat` subcommand.
pub struct ChatArgs {
    pub prompt: Vec<String>,
    pub token: Option<String>,
    pub cookie: Option<String>,
    pub save_auth: bool,
}

/// Phrases that end the session from the prompt line.
fn is_quit(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit")
}

/// Runs the interactive chat REPL.
///
/// Resolves credentials (flags first, then the stored credential file),
/// opens the remote conversation with the first prompt, and enters a
/// readline loop where each input runs one agent turn.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, stays in REPL
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/zephyr/chat_history.txt`
pub async fn run_chat(config: Config, args: ChatArgs) -> Result<()> {
    let stored = AuthStore::load();
    let Some(token) = args.token.or(stored.token) else {
        bail!("no credential found; pass --token or run `zephyr auth save <token>`");
    };
    let cookie = args.cookie.or(stored.cookie);

    if args.save_auth {
        AuthStore {
            token: Some(token.clone()),
            cookie: cookie.clone(),
        }
        .save()?;
        println!("{}", "credentials saved.".dimmed());
    }

    let client = ChatClient::new(&token, cookie.as_deref(), config.base_url())?;

    let mut state = ConversationState::new(&config.model);
    state.set_user(
        config.user.name(),
        config.user.language(),
        config.user.timezone(),
    );
    state.set_features(config.features());
    // The hint carries its own leading separator.
    let system_prompt = match &config.system_prompt {
        Some(p) => format!("{}{}", p, crate::constants::TOOL_SYSTEM_HINT),
        None => crate::constants::TOOL_SYSTEM_HINT.trim_start().to_string(),
    };
    state.set_system_prompt(Some(system_prompt));

    let tools = ToolRegistry::with_builtins(&config.tools);
    let mut agent = Agent::new(client, state, tools, config.tools.max_iterations());
    let mut renderer = StdoutRenderer::new(
        config.runtime.show_thinking(),
        config.runtime.thinking_color(),
    );

    println!(
        "{} [model: {}] (Ctrl+D to exit)",
        "zephyr chat".bold().cyan(),
        config.model.yellow(),
    );
    println!();

    // Set up readline with persistent history
    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(crate::constants::HISTORY_FILENAME);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    // First prompt comes from the command line when given.
    let first = if args.prompt.is_empty() {
        loop {
            match rl.readline(&format!("{} ", ">".green().bold())) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if is_quit(&line) {
                        return Ok(());
                    }
                    break line;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "goodbye.".dimmed());
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    } else {
        args.prompt.join(" ")
    };

    let _ = rl.add_history_entry(&first);
    println!();
    agent.open_conversation(&mut renderer, &first).await?;
    println!();

    loop {
        let readline = rl.readline(&format!("{} ", ">".green().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if is_quit(&line) {
                    break;
                }

                let _ = rl.add_history_entry(&line);
                println!();

                if let Err(e) = agent.run_user_turn(&mut renderer, &line).await {
                    // Keep the session alive so the user can retry.
                    renderer.render_error(&e.to_string());
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    // Save readline history
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}
