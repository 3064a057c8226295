//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `panelforge.toml` in the working directory unless `--config`
//! names another file. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::Path;

use panelforge_app::compiler::CompileOptions;
use panelforge_domain::electrical::NOMINAL_VOLTAGE;
use serde::Deserialize;

/// File read when no `--config` is given.
pub const DEFAULT_PATH: &str = "panelforge.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Electrical assumptions shared by assignment and compilation.
    pub electrical: ElectricalConfig,
    /// Defaults for the compiled document.
    pub project: ProjectConfig,
    /// Output formatting.
    pub output: OutputConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ElectricalConfig {
    /// Supply voltage used to turn declared power into current.
    pub nominal_voltage: f64,
}

/// Names and versions written where the snapshot is silent.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub tech_area: String,
    pub tech_room: String,
    pub board_name: String,
    pub software_version: String,
    pub timezone_id: String,
    pub logic_server_hsnet: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent the written document.
    pub pretty: bool,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `path`, or from `panelforge.toml` when none
    /// is given, then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is missing, if the
    /// file is malformed, or if the resulting values are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path, true)?,
            None => Self::from_file(Path::new(DEFAULT_PATH), false)?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("PANELFORGE_VOLTAGE")
            && let Ok(voltage) = val.parse()
        {
            self.electrical.nominal_voltage = voltage;
        }
        if let Some(val) = var("PANELFORGE_PRETTY")
            && let Ok(pretty) = val.parse()
        {
            self.output.pretty = pretty;
        }
        if let Some(val) = var("PANELFORGE_SOFTWARE_VERSION") {
            self.project.software_version = val;
        }
        if let Some(val) = var("PANELFORGE_TIMEZONE") {
            self.project.timezone_id = val;
        }
        if let Some(val) = var("PANELFORGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let voltage = self.electrical.nominal_voltage;
        if !voltage.is_finite() || voltage <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "nominal_voltage must be positive, got {voltage}"
            )));
        }
        if !(1..=254).contains(&self.project.logic_server_hsnet) {
            return Err(ConfigError::Validation(
                "logic_server_hsnet must be within 1..=254".to_string(),
            ));
        }
        if self.project.timezone_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "timezone_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Compile options derived from the `[project]` and `[electrical]` sections.
    #[must_use]
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            voltage: self.electrical.nominal_voltage,
            tech_area: self.project.tech_area.clone(),
            tech_room: self.project.tech_room.clone(),
            board_name: self.project.board_name.clone(),
            software_version: self.project.software_version.clone(),
            timezone_id: self.project.timezone_id.clone(),
            logic_server_hsnet: self.project.logic_server_hsnet,
            timestamp: None,
        }
    }
}

impl Default for ElectricalConfig {
    fn default() -> Self {
        Self {
            nominal_voltage: NOMINAL_VOLTAGE,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let defaults = CompileOptions::default();
        Self {
            tech_area: defaults.tech_area,
            tech_room: defaults.tech_room,
            board_name: defaults.board_name,
            software_version: defaults.software_version,
            timezone_id: defaults.timezone_id,
            logic_server_hsnet: defaults.logic_server_hsnet,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "panelforge=info,panelforge_app=info,panelforge_adapter_json=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
