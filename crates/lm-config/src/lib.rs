//! Configuration management for the `lm` renderer.
//!
//! Parses `lm.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [renderer]
//! pipeline = "auto"        # "auto" | "fallback"
//! max_input_bytes = 262144
//! ```

use std::path::{Path, PathBuf};

use lm_renderer::PipelineMode;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the rendering pipeline.
    pub pipeline: Option<PipelineMode>,
    /// Override the input size limit.
    pub max_input_bytes: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "lm.toml";

/// Default input size limit (256 KiB).
const DEFAULT_MAX_INPUT_BYTES: usize = 256 * 1024;

/// Upper bound for `renderer.max_input_bytes` (16 MiB).
const MAX_INPUT_BYTES_LIMIT: usize = 16 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Renderer configuration.
    pub renderer: RendererConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Renderer configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Pipeline the renderer tries first.
    pub pipeline: PipelineMode,
    /// Largest markdown input accepted, in bytes.
    pub max_input_bytes: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineMode::Auto,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `lm.toml` in current directory and parents,
    /// and falls back to defaults when none is found.
    ///
    /// CLI settings are applied after loading and validated with the rest,
    /// so CLI arguments take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or the resulting values are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(pipeline) = settings.pipeline {
            self.renderer.pipeline = pipeline;
        }
        if let Some(max_input_bytes) = settings.max_input_bytes {
            self.renderer.max_input_bytes = max_input_bytes;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.renderer.max_input_bytes;
        if max == 0 {
            return Err(ConfigError::Validation(
                "renderer.max_input_bytes must be greater than 0".to_owned(),
            ));
        }
        if max > MAX_INPUT_BYTES_LIMIT {
            return Err(ConfigError::Validation(format!(
                "renderer.max_input_bytes cannot exceed {MAX_INPUT_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}
