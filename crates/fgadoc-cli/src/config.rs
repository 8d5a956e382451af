//! Configuration management for the fgadoc binary.
//!
//! Configuration is layered:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables with the `FGADOC_` prefix (override)
//!
//! Command-line flags are applied last, by the binary.
//!
//! # Example
//!
//! ```yaml
//! logging:
//!   level: debug
//!   json: false
//!   spans: false
//!
//! document:
//!   mod_file_path: ./model/fga.mod
//!   output: json
//! ```

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "FGADOC";

/// fgadoc configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CliConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Document input and output settings
    #[serde(default)]
    pub document: DocumentSettings,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,

    /// Also log span enter and exit
    #[serde(default)]
    pub spans: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            spans: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Rendering of the resolved model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Canonical JSON document
    #[default]
    Json,
    /// DSL text of the validated model
    Dsl,
    /// Depth-bounded native object, pretty-printed
    Native,
}

/// Where the model comes from and how it is printed.
///
/// Each source is a file path. Exactly one of them must be set once
/// command-line flags have been applied; the domain layer enforces that.
///
/// Environment variables: `FGADOC_DOCUMENT__DSL`, `FGADOC_DOCUMENT__JSON`,
/// `FGADOC_DOCUMENT__MODEL`, `FGADOC_DOCUMENT__MOD_FILE_PATH`,
/// `FGADOC_DOCUMENT__OUTPUT`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DocumentSettings {
    /// DSL file
    #[serde(default)]
    pub dsl: Option<PathBuf>,

    /// JSON model file
    #[serde(default)]
    pub json: Option<PathBuf>,

    /// Native model object, as a JSON file
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// `fga.mod` descriptor of a modular model
    #[serde(default)]
    pub mod_file_path: Option<PathBuf>,

    #[serde(default)]
    pub output: OutputFormat,
}

impl DocumentSettings {
    fn has_source(&self) -> bool {
        self.dsl.is_some()
            || self.json.is_some()
            || self.model.is_some()
            || self.mod_file_path.is_some()
    }

    /// Applies command-line settings on top of these.
    ///
    /// Sources are replaced as a group: once any source is given on the
    /// command line, none of the configured sources apply.
    pub fn overridden_by(self, cli: DocumentSettings, output: Option<OutputFormat>) -> Self {
        let output = output.unwrap_or(self.output);
        let sources = if cli.has_source() { cli } else { self };
        Self { output, ..sources }
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl CliConfig {
    /// Loads a YAML file with `FGADOC_` environment overrides.
    ///
    /// `__` separates nested keys, so `FGADOC_LOGGING__LEVEL=debug`
    /// overrides `logging.level`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&CliConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let cli_config: CliConfig = config.try_deserialize()?;
        cli_config.validate()?;

        Ok(cli_config)
    }

    /// Loads defaults with `FGADOC_` environment overrides only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&CliConfig::default())?)
            .add_source(environment())
            .build()?;

        let cli_config: CliConfig = config.try_deserialize()?;
        cli_config.validate()?;

        Ok(cli_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        let empty_paths: Vec<&str> = [
            ("document.dsl", &self.document.dsl),
            ("document.json", &self.document.json),
            ("document.model", &self.document.model),
            ("document.mod_file_path", &self.document.mod_file_path),
        ]
        .into_iter()
        .filter(|(_, path)| path.as_ref().is_some_and(|p| p.as_os_str().is_empty()))
        .map(|(key, _)| key)
        .collect();
        if !empty_paths.is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: format!("{} must not be empty", empty_paths.join(", ")),
            });
        }

        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
