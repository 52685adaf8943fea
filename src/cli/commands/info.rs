//! The info subcommand.

use clap::Args;

use crate::cli::{OutputSink, Result};
use crate::pool::{HandlePool, PoolKey};
use crate::repo::Project;

/// Arguments for the info command.
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl InfoArgs {
    pub async fn run(self, project: &Project) -> Result<()> {
        let repo = project.repo();
        let mut lines = vec![
            format!("name: {}", project.name()),
            format!("root: {}", project.path().display()),
            format!("repository: {}", project.repo_path().display()),
            format!("exists: {}", project.exists()),
        ];
        if !project.description().is_empty() {
            lines.push(format!("description: {}", project.description()));
        }
        lines.push(pool_line(repo.container_pool()));
        lines.push(pool_line(repo.container_view_pool()));
        lines.push(pool_line(repo.persistent_pool()));

        self.output.write_str(&lines.join("\n")).await?;
        Ok(())
    }
}

fn pool_line<K: PoolKey>(pool: &HandlePool<K>) -> String {
    let stats = pool.stats();
    let idle = match pool.config().idle_timeout() {
        Some(ttl) => format!("{:?}", ttl),
        None => "never".to_string(),
    };
    format!(
        "{}: size={} open={} closing={} idle_eviction={}",
        pool.kind(),
        pool.size(),
        stats.open,
        stats.closing,
        idle
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::container::MemoryContainerFactory;
    use crate::pool::PoolConfig;

    #[tokio::test]
    async fn test_pool_line() {
        let factory = Arc::new(MemoryContainerFactory::<String>::new());
        let pool = HandlePool::new(PoolConfig::view(Some(Duration::from_secs(60))), factory);
        assert_eq!(
            pool_line(&pool),
            "container_view_pool: size=0 open=0 closing=0 idle_eviction=60s"
        );

        let pool = HandlePool::new(
            PoolConfig::writable(),
            Arc::new(MemoryContainerFactory::<String>::new()),
        );
        let _lease = pool.acquire(&"run-1".to_string()).await.unwrap();
        pool.clear();
        assert_eq!(
            pool_line(&pool),
            "container_pool: size=1 open=0 closing=1 idle_eviction=never"
        );
    }
}
