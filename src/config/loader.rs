//! File loading and merging for zephyr configuration.

use anyhow::{Context, Result};
use std::fs;

use super::types::{default_model, Config, RuntimeConfig, ShellConfig, ToolsConfig};

impl Config {
    /// Loads the global config from `~/.config/zephyr/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = format!(
                r#"model = "{}"

[user]
name = "User"
language = "en-US"
timezone = "UTC"

[features]
preview_mode = true
enable_thinking = false

[runtime]
show_thinking = true
thinking_color = "gray"

[tools]
max_iterations = {}

[tools.shell]
auto_approve = false
use_docker = false
"#,
                default_model(),
                crate::constants::DEFAULT_MAX_TOOL_ITERATIONS
            );
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Look for zephyr.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                let contents = fs::read_to_string(&candidate)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(Some(config));
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            base_url: project.base_url.or(global.base_url),
            system_prompt: project.system_prompt.or(global.system_prompt),
            user: super::types::UserConfig {
                name: project.user.name.or(global.user.name),
                language: project.user.language.or(global.user.language),
                timezone: project.user.timezone.or(global.user.timezone),
            },
            features: project.features.or(global.features),
            runtime: RuntimeConfig {
                show_thinking: project
                    .runtime
                    .show_thinking
                    .or(global.runtime.show_thinking),
                thinking_color: project
                    .runtime
                    .thinking_color
                    .or(global.runtime.thinking_color),
            },
            tools: ToolsConfig {
                max_iterations: project
                    .tools
                    .max_iterations
                    .or(global.tools.max_iterations),
                enabled: project.tools.enabled.or(global.tools.enabled),
                shell: ShellConfig {
                    auto_approve: project
                        .tools
                        .shell
                        .auto_approve
                        .or(global.tools.shell.auto_approve),
                    timeout: project.tools.shell.timeout.or(global.tools.shell.timeout),
                    use_docker: project
                        .tools
                        .shell
                        .use_docker
                        .or(global.tools.shell.use_docker),
                    container_name: project
                        .tools
                        .shell
                        .container_name
                        .or(global.tools.shell.container_name),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_values_win_on_merge() {
        let global = Config {
            system_prompt: Some("global prompt".to_string()),
            tools: ToolsConfig {
                max_iterations: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };
        let project = Config {
            model: "other-model".to_string(),
            tools: ToolsConfig {
                shell: ShellConfig {
                    auto_approve: Some(true),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = Config::merge(global, project);
        assert_eq!(merged.model, "other-model");
        assert_eq!(merged.system_prompt.as_deref(), Some("global prompt"));
        assert_eq!(merged.tools.max_iterations(), 5);
        assert_eq!(merged.tools.shell.auto_approve, Some(true));
    }

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model, crate::constants::DEFAULT_MODEL);
        assert_eq!(config.base_url(), crate::constants::DEFAULT_BASE_URL);
        assert_eq!(config.user.name(), "User");
        assert!(config.runtime.show_thinking());
        assert_eq!(
            config.tools.max_iterations(),
            crate::constants::DEFAULT_MAX_TOOL_ITERATIONS
        );
        assert!(config.tools.container_name().is_none());
    }

    #[test]
    fn docker_mode_defaults_container_name() {
        let config: Config = toml::from_str(
            r#"
[tools.shell]
use_docker = true
"#,
        )
        .unwrap();
        assert_eq!(
            config.tools.container_name().as_deref(),
            Some(crate::constants::DEFAULT_CONTAINER_NAME)
        );
    }
}
