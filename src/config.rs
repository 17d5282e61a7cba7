use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tour::StepCatalog;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub tour: TourConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Guided tour configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TourConfig {
    /// Milliseconds to wait on the right route before showing the overlay (default: 400)
    #[serde(default = "default_mount_delay_ms")]
    pub mount_delay_ms: u64,
    /// Start the tour on boot when it has not been completed yet (default: true)
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    /// TOML catalog replacing the built-in dashboard tour
    #[serde(default)]
    pub catalog_path: Option<String>,
}

fn default_mount_delay_ms() -> u64 {
    400
}

fn default_auto_start() -> bool {
    true
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            mount_delay_ms: default_mount_delay_ms(),
            auto_start: default_auto_start(),
            catalog_path: None,
        }
    }
}

impl TourConfig {
    pub fn mount_delay(&self) -> Duration {
        Duration::from_millis(self.mount_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PathsConfig {
    /// Directory holding persisted state and logs
    #[serde(default = "default_state_path")]
    pub state: String,
}

fn default_state_path() -> String {
    ".devpulse".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: default_state_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether the server logs to a file (false = stderr)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApiConfig {
    /// Port the REST API listens on (default: 7010)
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_port() -> u16 {
    7010
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".devpulse/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so devpulse works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/devpulse/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("devpulse").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with DEVPULSE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("DEVPULSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .devpulse/config.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::project_config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// The configured tour catalog, falling back to the built-in one
    pub fn tour_catalog(&self) -> Result<StepCatalog> {
        match &self.tour.catalog_path {
            Some(path) => StepCatalog::load(path.as_ref())
                .with_context(|| format!("Failed to load tour catalog from {path}")),
            None => Ok(StepCatalog::dashboard()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tour: TourConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
        }
    }
}
