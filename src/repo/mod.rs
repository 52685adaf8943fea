//! Repositories and projects.
//!
//! A [`Repository`] owns the three container pools for one repository path.
//! A [`Project`] binds a repository below a root directory.

mod project;
mod repository;

pub use project::Project;
pub use repository::{Repository, RepositoryError, RepositoryPools, Result};
