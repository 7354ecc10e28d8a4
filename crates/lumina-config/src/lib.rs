//! Configuration for the Lumina illumination tools.
//!
//! Settings persist to disk as `config.ron`. The shading section is the
//! [`lumina_gi::ShadingConfig`] resolved per draw batch; CLI flags parsed by
//! clap override file values.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, DemoConfig, default_config_dir};
pub use error::ConfigError;
