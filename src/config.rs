//! Application-level configuration loading, including the quiz option target.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CHART_QUIZ_BACK_CONFIG_PATH";
/// Target option count used when the configuration file provides none.
const DEFAULT_MIN_REQUIRED_OPTIONS: u32 = 4;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    min_required_options: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        min_required_options = app_config.min_required_options,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Total option count (real + fixed + decoy) every quiz question targets.
    ///
    /// The value is validated by the decoy engine at the start of each run; a
    /// configuration file may legitimately set it to zero and the run aborts
    /// with a configuration error instead of silently emptying option lists.
    pub fn min_required_options(&self) -> u32 {
        self.min_required_options
    }

    #[cfg(test)]
    /// Build a configuration directly, bypassing the file lookup.
    pub fn with_min_required_options(min_required_options: u32) -> Self {
        Self {
            min_required_options,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_required_options: DEFAULT_MIN_REQUIRED_OPTIONS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    min_required_options: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            min_required_options: value
                .min_required_options
                .unwrap_or(DEFAULT_MIN_REQUIRED_OPTIONS),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
