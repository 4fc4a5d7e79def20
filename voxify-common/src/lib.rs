//! # Voxify Common Library
//!
//! Shared code for the Voxify services:
//! - Error type used across crates
//! - TOML configuration model and config file discovery
//! - Value resolution (command line → environment → TOML → compiled default)

pub mod config;
pub mod error;

pub use config::{
    CompiledDefaults, ConfigOverrides, ConfigSource, LoggingConfig, ModelPaths, PipelineSettings,
    TomlConfig,
};
pub use error::{Error, Result};
