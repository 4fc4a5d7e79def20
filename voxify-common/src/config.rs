//! Configuration loading and config file resolution
//!
//! Resolution follows the same priority order for every value:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line and environment values arrive together as [`ConfigOverrides`]
//! (the binary's argument parser reads both); this module layers them on top
//! of the TOML file, which itself falls back to [`CompiledDefaults`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VOXIFY_CONFIG";

/// Config file name searched for in the platform config directories
pub const CONFIG_FILE_NAME: &str = "voxify.toml";

/// Compiled-in defaults used when neither the TOML file nor an override
/// provides a value.
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_address: String,
    pub gate_model: PathBuf,
    pub fusion_model: PathBuf,
    pub fusion_sample_rate: u32,
    pub gate_sample_rate: u32,
    pub time_frames: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the current platform. Model paths are relative to the
    /// working directory, as the model artifacts ship next to the binary.
    pub fn for_current_platform() -> Self {
        Self {
            bind_address: "127.0.0.1:5730".to_string(),
            gate_model: PathBuf::from("model").join("respiratory_detector.onnx"),
            fusion_model: PathBuf::from("model").join("cnn_fusion_2d.onnx"),
            fusion_sample_rate: 8000,
            gate_sample_rate: 16000,
            time_frames: 2579,
            log_level: "info".to_string(),
        }
    }
}

/// Paths of the two pretrained model artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    /// Binary respiratory / non-respiratory gate model
    pub gate: PathBuf,
    /// Six-class multi-input fusion model
    pub fusion: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            gate: defaults.gate_model,
            fusion: defaults.fusion_model,
        }
    }
}

/// Signal pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Sample rate the fusion path resamples to (Hz)
    pub fusion_sample_rate: u32,
    /// Sample rate the gate path resamples to (Hz)
    pub gate_sample_rate: u32,
    /// Time frames every fusion input tensor is padded or truncated to
    pub time_frames: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            fusion_sample_rate: defaults.fusion_sample_rate,
            gate_sample_rate: defaults.gate_sample_rate,
            time_frames: defaults.time_frames,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: CompiledDefaults::for_current_platform().log_level,
        }
    }
}

/// Contents of `voxify.toml`
///
/// Every section is optional; missing fields take compiled defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP listen address (`host:port`)
    pub bind_address: String,
    /// Directory request paths must resolve into; unrestricted when unset
    pub audio_root: Option<PathBuf>,
    pub models: ModelPaths,
    pub pipeline: PipelineSettings,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: CompiledDefaults::for_current_platform().bind_address,
            audio_root: None,
            models: ModelPaths::default(),
            pipeline: PipelineSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub audio_root: Option<PathBuf>,
    pub gate_model: Option<PathBuf>,
    pub fusion_model: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Layer command-line / environment overrides on top of this config
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(bind) = overrides.bind_address {
            self.bind_address = bind;
        }
        if let Some(root) = overrides.audio_root {
            self.audio_root = Some(root);
        }
        if let Some(gate) = overrides.gate_model {
            self.models.gate = gate;
        }
        if let Some(fusion) = overrides.fusion_model {
            self.models.fusion = fusion;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.fusion_sample_rate == 0 {
            return Err(Error::Config("pipeline.fusion_sample_rate must be > 0".to_string()));
        }
        if self.pipeline.gate_sample_rate == 0 {
            return Err(Error::Config("pipeline.gate_sample_rate must be > 0".to_string()));
        }
        if self.pipeline.time_frames == 0 {
            return Err(Error::Config("pipeline.time_frames must be > 0".to_string()));
        }
        if self.bind_address.trim().is_empty() {
            return Err(Error::Config("bind_address must not be empty".to_string()));
        }
        if self
            .audio_root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            return Err(Error::Config("audio_root must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Priority: explicit path → `VOXIFY_CONFIG` → platform config directory.
/// Returns `None` when no candidate exists; an explicit path is returned even
/// if missing so the caller can report it.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    platform_config_file()
}

/// Find an existing config file in the platform locations
fn platform_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("voxify").join(CONFIG_FILE_NAME));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/voxify").join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    TomlConfig::from_toml_str(&content)
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// This file was named but does not exist; compiled defaults in use
    MissingFile(PathBuf),
    /// No config file anywhere; compiled defaults in use
    Defaults,
}

/// Load the config file if there is one, reporting where values came from
///
/// A missing file is not an error. A file that exists but does not parse is.
/// Nothing is logged, so callers can use this before tracing is set up.
pub fn load_with_source(path: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    match path {
        Some(path) if path.exists() => {
            let config = load_toml_config(path)?;
            Ok((config, ConfigSource::File(path.to_path_buf())))
        }
        Some(path) => Ok((
            TomlConfig::default(),
            ConfigSource::MissingFile(path.to_path_buf()),
        )),
        None => Ok((TomlConfig::default(), ConfigSource::Defaults)),
    }
}

/// Log where the configuration came from
pub fn log_source(source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => debug!(path = %path.display(), "Loaded config file"),
        ConfigSource::MissingFile(path) => warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        ),
        ConfigSource::Defaults => warn!("No config file found, using compiled defaults"),
    }
}

/// Load the config file if there is one, otherwise fall back to defaults
///
/// Same as [`load_with_source`], logging a warning when defaults are used.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    let (config, source) = load_with_source(path)?;
    log_source(&source);
    Ok(config)
}
