//! Struct definitions and serde defaults for zephyr configuration.

use serde::{Deserialize, Serialize};

use crate::state::FeatureFlags;

/// Root configuration for zephyr, deserialized from `config.toml`.
///
/// Fields use serde defaults so zephyr can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Model identifier sent with every conversation and completion payload.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the chat endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Optional system prompt; the tool-usage hint is appended at startup.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Identity values substituted into per-turn template variables.
    #[serde(default)]
    pub user: UserConfig,
    /// Feature-flag overrides for the per-turn feature snapshot.
    #[serde(default)]
    pub features: Option<FeatureFlags>,
    /// Display settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            system_prompt: None,
            user: UserConfig::default(),
            features: None,
            runtime: RuntimeConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(crate::constants::DEFAULT_BASE_URL)
    }

    pub fn features(&self) -> FeatureFlags {
        self.features.clone().unwrap_or_default()
    }
}

/// Identity values carried in the completion payload's variables map.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct UserConfig {
    pub name: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
}

impl UserConfig {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("User")
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or("en-US")
    }

    pub fn timezone(&self) -> &str {
        self.timezone.as_deref().unwrap_or("UTC")
    }
}

/// Display settings for streamed output.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Whether intermediate thinking deltas are printed.
    pub show_thinking: Option<bool>,
    /// Color for thinking deltas; only `"gray"` dims, anything else is plain.
    pub thinking_color: Option<String>,
}

impl RuntimeConfig {
    pub fn show_thinking(&self) -> bool {
        self.show_thinking.unwrap_or(true)
    }

    pub fn thinking_color(&self) -> &str {
        self.thinking_color.as_deref().unwrap_or("gray")
    }
}

/// Tool settings: iteration cap, active set, and shell execution options.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Maximum consecutive tool iterations per human turn.
    pub max_iterations: Option<usize>,
    /// Explicit active set; when present it replaces the default set.
    pub enabled: Option<Vec<String>>,
    #[serde(default)]
    pub shell: ShellConfig,
}

impl ToolsConfig {
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
            .unwrap_or(crate::constants::DEFAULT_MAX_TOOL_ITERATIONS)
    }

    pub fn use_docker(&self) -> bool {
        self.shell.use_docker.unwrap_or(false)
    }

    /// Container name for docker-mode tools; `None` when docker is off.
    pub fn container_name(&self) -> Option<String> {
        if !self.use_docker() {
            return None;
        }
        Some(
            self.shell
                .container_name
                .clone()
                .unwrap_or_else(|| crate::constants::DEFAULT_CONTAINER_NAME.to_string()),
        )
    }
}

/// Shell execution options, shared with the file tools for docker mode.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ShellConfig {
    /// Skip the interactive confirmation prompt. Dangerous.
    pub auto_approve: Option<bool>,
    /// Command timeout in seconds.
    pub timeout: Option<u64>,
    /// Execute inside a docker container instead of the local shell.
    pub use_docker: Option<bool>,
    /// Container name for docker execution.
    pub container_name: Option<String>,
}
