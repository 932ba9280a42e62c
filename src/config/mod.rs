//! Configuration types and path resolution for zephyr.
//!
//! Zephyr stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/zephyr/config.toml` on Linux); a `zephyr.toml` in the
//! project tree overrides the global file field by field.

mod loader;
mod paths;
mod types;

pub use types::Config;
#[allow(unused_imports)]
pub use types::{RuntimeConfig, ShellConfig, ToolsConfig, UserConfig};

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }
        Ok(config)
    }
}
