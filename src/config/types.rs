//! Configuration types for runpool.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::container::LmdbOptions;

// =============================================================================
// Primitive Types
// =============================================================================

/// A byte size that can be parsed from strings like "100MB", "1GB", etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

// =============================================================================
// Config Sections
// =============================================================================

/// [repository] section - where the repository lives and how it is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Directory containing the repository.
    pub root: PathBuf,
    /// Repository directory name below `root`.
    pub name: String,
    pub description: String,
}

/// [pool] section - pool behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Idle time after which read-only views are closed. `None` keeps them
    /// until the pool is cleared.
    pub view_idle_timeout: Option<Duration>,
    /// How often the view pool looks for idle handles.
    pub reaper_period: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            view_idle_timeout: Some(Duration::from_secs(60)),
            reaper_period: Duration::from_secs(10),
        }
    }
}

/// Everything needed to open a repository's pools: [pool] and [lmdb].
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    pub pool: PoolSettings,
    pub lmdb: LmdbOptions,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub repository: RepositoryConfig,
}
