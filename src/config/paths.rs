//! XDG path resolution for zephyr configuration and cache directories.

use anyhow::Result;
use std::path::PathBuf;

use super::types::Config;

impl Config {
    /// Returns the platform-specific configuration directory for zephyr.
    ///
    /// Returns `~/.config/zephyr/` on Linux (`XDG_CONFIG_HOME/zephyr`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's config directory cannot be determined.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// Returns the platform-specific cache directory for zephyr.
    ///
    /// Returns `~/.cache/zephyr/` on Linux (`XDG_CACHE_HOME/zephyr`).
    /// Used for storing readline history and other ephemeral data.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's cache directory cannot be determined.
    pub fn cache_dir() -> Result<PathBuf> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// Returns the full path to the zephyr configuration file.
    ///
    /// Returns `~/.config/zephyr/config.toml` on Linux.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Config::config_dir`] fails.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(crate::constants::CONFIG_FILENAME))
    }

    /// Returns the full path to the stored credential file.
    ///
    /// Returns `~/.config/zephyr/auth.json` on Linux.
    pub fn auth_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(crate::constants::AUTH_FILENAME))
    }
}
