//! A project: a repository bound below a root directory.

use std::path::{Path, PathBuf};

use crate::config::{Config, RepositoryConfig};

use super::repository::{Repository, Result};

const DEFAULT_PROJECT_NAME: &str = "My awesome project";

/// A repository directory below a project root, with presentation metadata.
///
/// Creating a project binds its repository, which clears all three pools.
#[derive(Debug)]
pub struct Project {
    name: String,
    path: PathBuf,
    repo_path: PathBuf,
    description: String,
    repo: Repository,
}

impl Project {
    /// Bind the repository `root_path/repo_name` with default settings.
    pub fn new(root_path: impl Into<PathBuf>, repo_name: &str) -> Result<Self> {
        Self::with_config(root_path, repo_name, &RepositoryConfig::default())
    }

    /// Bind the repository described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut project = Self::with_config(
            &config.project.root,
            &config.project.name,
            &config.repository,
        )?;
        project.description = config.project.description.clone();
        Ok(project)
    }

    fn with_config(
        root_path: impl Into<PathBuf>,
        repo_name: &str,
        config: &RepositoryConfig,
    ) -> Result<Self> {
        let path = root_path.into();
        let repo_path = path.join(repo_name);
        let repo = Repository::open(&repo_path, config)?;
        Ok(Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            path,
            repo_path,
            description: String::new(),
            repo,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The project root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut Repository {
        &mut self.repo
    }

    /// Whether the repository directory has been created.
    pub fn exists(&self) -> bool {
        self.repo_path.exists()
    }
}
