//! Shell tool — executes commands requested via `<shell>` tags.
//!
//! Accepts either a `<shell>command</shell>` tag or a ```` ```shell ````
//! fenced block. Commands run locally through `sh -c` or inside a docker
//! container, with a timeout; a timeout is a failed invocation, not a crash.

use std::io::{self, BufRead, Write};
use std::sync::LazyLock;
use std::time::Duration;

use colored::Colorize;
use regex::Regex;

use super::{Tool, ToolInvocation};
use crate::config::ToolsConfig;
use crate::constants::SHELL_DEFAULT_TIMEOUT_SECS;

static SHELL_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<shell>(.*?)</shell>").expect("valid shell tag pattern"));
static SHELL_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```shell\s*(.*?)\s*```").expect("valid shell fence pattern")
});

/// Runs `command` through `sh -c` with a timeout.
///
/// Returns `(exit_code, stdout, stderr)`; spawn failures and timeouts come
/// back as `Err` with a message the caller folds into a failed invocation.
pub(super) async fn run_sh(command: &str, timeout_secs: u64) -> Result<(i32, String, String), String> {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    // A timed-out command must stop executing, not just stop being awaited.
    cmd.kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| format!("failed to spawn command: {}", e))?;

    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
        .await
        .map_err(|_| format!("Command timed out after {} seconds", timeout_secs))?
        .map_err(|e| format!("failed to collect command output: {}", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Ok((output.status.code().unwrap_or(-1), stdout, stderr))
}

/// Wraps `command` for execution inside a docker container.
pub(super) fn docker_wrap(container: &str, command: &str) -> String {
    let escaped = command.replace('"', "\\\"");
    format!("docker exec {} sh -c \"{}\"", container, escaped)
}

/// Tool that executes shell commands, locally or inside a docker container,
/// with optional interactive confirmation.
pub struct ShellTool {
    auto_approve: bool,
    timeout_secs: u64,
    use_docker: bool,
    container_name: Option<String>,
}

impl ShellTool {
    pub fn new(
        auto_approve: bool,
        timeout_secs: u64,
        use_docker: bool,
        container_name: Option<String>,
    ) -> Self {
        Self {
            auto_approve,
            timeout_secs,
            use_docker,
            container_name,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            config.shell.auto_approve.unwrap_or(false),
            config.shell.timeout.unwrap_or(SHELL_DEFAULT_TIMEOUT_SECS),
            config.use_docker(),
            config.container_name(),
        )
    }

    fn mode(&self) -> &'static str {
        if self.use_docker {
            "docker"
        } else {
            "local"
        }
    }

    /// Asks the user before running. Anything but y/yes rejects.
    fn confirm(&self, request: &str) -> bool {
        println!();
        println!(
            "{}",
            format!("[tool] assistant requested {} shell command:", self.mode()).dimmed()
        );
        println!("{}", request);
        print!("Execute this command ({})? [y/N]: ", self.mode());
        io::stdout().flush().ok();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

#[async_trait::async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute shell commands (local or docker) with user confirmation"
    }

    fn can_handle(&self, message: &str) -> bool {
        SHELL_TAG_RE.is_match(message) || SHELL_FENCE_RE.is_match(message)
    }

    fn extract_request(&self, message: &str) -> Option<String> {
        SHELL_TAG_RE
            .captures(message)
            .or_else(|| SHELL_FENCE_RE.captures(message))
            .map(|c| c[1].trim().to_string())
            .filter(|cmd| !cmd.is_empty())
    }

    async fn execute(&self, request: &str) -> ToolInvocation {
        if !self.auto_approve && !self.confirm(request) {
            return ToolInvocation::failure(self.name(), request, "user rejected command");
        }

        let command = if self.use_docker {
            let Some(container) = &self.container_name else {
                return ToolInvocation::failure(
                    self.name(),
                    request,
                    "docker container name not specified",
                );
            };
            docker_wrap(container, request)
        } else {
            request.to_string()
        };

        match run_sh(&command, self.timeout_secs).await {
            Ok((exit_code, stdout, stderr)) => {
                let invocation = if exit_code == 0 {
                    ToolInvocation::success(
                        self.name(),
                        request,
                        if stdout.is_empty() {
                            "(empty)".to_string()
                        } else {
                            stdout
                        },
                    )
                } else {
                    let mut failed = ToolInvocation::failure(self.name(), request, stderr);
                    failed.output = if stdout.is_empty() {
                        "(empty)".to_string()
                    } else {
                        stdout
                    };
                    failed
                };
                invocation
                    .with_metadata("exit_code", exit_code.to_string())
                    .with_metadata("execution_mode", self.mode())
            }
            Err(err) => ToolInvocation::failure(self.name(), request, err),
        }
    }
}
