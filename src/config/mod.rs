//! Configuration module.

mod read_config;
mod types;

pub use read_config::{ConfigError, ConfigResult, ConfigSource, Result, parse_duration, read_config};
pub use types::{ByteSize, Config, PoolSettings, ProjectConfig, RepositoryConfig};
