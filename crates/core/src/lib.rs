//! Core configuration for the release relay.
//!
//! The relay is driven by a single TOML file (`relay.toml`) mapping release
//! targets to Codefresh pipelines, plus the Slack tokens and the channel the
//! relay broadcasts release activity to. Configuration is loaded once at
//! startup and shared read-only for the lifetime of the process.

pub mod config;

pub use config::{
    AppConfig, CodefreshConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
    LoggingConfig, ProjectConfig, SlackConfig,
};
