//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use configparser::ini::Ini;
use thiserror::Error;

use super::{ByteSize, Config, ProjectConfig, RepositoryConfig};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_REPOSITORY_ROOT: &str = ".";
const DEFAULT_REPOSITORY_NAME: &str = ".aim";

const ENV_CONFIG_FILE: &str = "RUNPOOL_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".runpoolconfig";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid byte size '{value}': {message}")]
    InvalidByteSize { value: String, message: String },

    #[error("invalid duration '{value}': {message}")]
    InvalidDuration { value: String, message: String },

    #[error("invalid integer '{value}': {source}")]
    InvalidInteger {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to RUNPOOL_CONFIG_FILE env var, then ~/.runpoolconfig.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "repository.root", "pool.view_idle_timeout"
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// Value Parsing
// =============================================================================

impl ByteSize {
    /// Parse a byte size from a string like "100MB", "1GB", "500KB", or plain "1024".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: "empty string".to_string(),
            });
        }

        // Find where the numeric part ends
        let num_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());

        if num_end == 0 {
            return Err(ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: "no numeric value".to_string(),
            });
        }

        let num_str = &s[..num_end];
        let suffix = s[num_end..].trim().to_uppercase();

        let base: u64 = num_str.parse().map_err(|e| ConfigError::InvalidByteSize {
            value: s.to_string(),
            message: format!("invalid number: {}", e),
        })?;

        let multiplier: u64 = match suffix.as_str() {
            "" | "B" => 1,
            "K" | "KB" => 1024,
            "M" | "MB" => 1024 * 1024,
            "G" | "GB" => 1024 * 1024 * 1024,
            "T" | "TB" => 1024 * 1024 * 1024 * 1024,
            _ => {
                return Err(ConfigError::InvalidByteSize {
                    value: s.to_string(),
                    message: format!("unknown suffix '{}'", suffix),
                });
            }
        };

        Ok(ByteSize(base.saturating_mul(multiplier)))
    }

    fn to_usize(self, value: &str) -> Result<usize> {
        usize::try_from(self.0).map_err(|_| ConfigError::InvalidByteSize {
            value: value.to_string(),
            message: "too large for this platform".to_string(),
        })
    }
}

/// Parse a duration like "500ms", "30s", "5m", "1h", or plain seconds "30".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let num_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if num_end == 0 {
        return Err(ConfigError::InvalidDuration {
            value: s.to_string(),
            message: "no numeric value".to_string(),
        });
    }

    let base: u64 = s[..num_end]
        .parse()
        .map_err(|e| ConfigError::InvalidDuration {
            value: s.to_string(),
            message: format!("invalid number: {}", e),
        })?;

    match s[num_end..].trim().to_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(base)),
        "" | "s" => Ok(Duration::from_secs(base)),
        "m" => Ok(Duration::from_secs(base.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(base.saturating_mul(3600))),
        suffix => Err(ConfigError::InvalidDuration {
            value: s.to_string(),
            message: format!("unknown suffix '{}'", suffix),
        }),
    }
}

/// Parse a duration that may be disabled with "none".
fn parse_optional_duration(value: &str) -> Result<Option<Duration>> {
    if value.trim().eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        parse_duration(value).map(Some)
    }
}

fn parse_u32(value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidInteger {
            value: value.to_string(),
            source: e,
        })
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// Information about how the config file was resolved.
#[derive(Debug)]
pub struct ResolvedConfigFile {
    /// The path to the config file, if one was found.
    pub path: Option<PathBuf>,
    /// Warning message if env var pointed to nonexistent file.
    pub warning: Option<String>,
}

/// Resolve which config file to use based on the ConfigSource and environment.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    // If explicit path provided, it must exist
    if let Some(ref path) = source.config_file {
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path.clone()),
                warning: None,
            });
        } else {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
    }

    // Check environment variable
    if let Ok(env_path) = env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path),
                warning: None,
            });
        } else {
            // Warn but continue with defaults
            return Ok(ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "config file specified by {} does not exist: {}",
                    ENV_CONFIG_FILE, env_path
                )),
            });
        }
    }

    // Check ~/.runpoolconfig
    if let Some(home) = home_dir() {
        let default_path = home.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(default_path),
                warning: None,
            });
        }
    }

    Ok(ResolvedConfigFile {
        path: None,
        warning: None,
    })
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

// =============================================================================
// Default Config
// =============================================================================

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        project: ProjectConfig {
            root: PathBuf::from(DEFAULT_REPOSITORY_ROOT),
            name: DEFAULT_REPOSITORY_NAME.to_string(),
            description: String::new(),
        },
        repository: RepositoryConfig::default(),
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

const KEYS: &[(&str, &str)] = &[
    ("repository", "root"),
    ("repository", "name"),
    ("repository", "description"),
    ("pool", "view_idle_timeout"),
    ("pool", "reaper_period"),
    ("lmdb", "map_size"),
    ("lmdb", "max_readers"),
];

/// Apply an INI file's contents to a Config, layering on top of existing values.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    for (section, param) in KEYS {
        if let Some(value) = ini.get(section, param) {
            apply_value(config, section, param, &value)?;
        }
    }
    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some((section, param)) => apply_value(config, section, param, value),
        None => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

fn apply_value(config: &mut Config, section: &str, param: &str, value: &str) -> Result<()> {
    match (section, param) {
        ("repository", "root") => {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "repository.root".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            config.project.root = PathBuf::from(value.trim());
        }
        ("repository", "name") => {
            let name = value.trim();
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::InvalidValue {
                    key: "repository.name".to_string(),
                    message: "must be a single non-empty path component".to_string(),
                });
            }
            config.project.name = name.to_string();
        }
        ("repository", "description") => {
            config.project.description = value.to_string();
        }
        ("pool", "view_idle_timeout") => {
            config.repository.pool.view_idle_timeout = parse_optional_duration(value)?;
        }
        ("pool", "reaper_period") => {
            let period = parse_duration(value)?;
            if period.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key: "pool.reaper_period".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.repository.pool.reaper_period = period;
        }
        ("lmdb", "map_size") => {
            config.repository.lmdb.map_size = ByteSize::parse(value)?.to_usize(value)?;
        }
        ("lmdb", "max_readers") => {
            config.repository.lmdb.max_readers = parse_u32(value)?;
        }
        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key: format!("{}.{}", section, param),
                message: "unknown parameter".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Result of reading configuration, including any warnings.
#[derive(Debug)]
pub struct ConfigResult {
    /// The parsed configuration.
    pub config: Config,
    /// Any warnings generated during config loading.
    pub warnings: Vec<String>,
}

/// Read and parse configuration from the specified sources.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Base config file (from CLI, env var, or ~/.runpoolconfig)
/// 3. Override config file (if specified)
/// 4. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();

    let mut config = default_config();

    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================
