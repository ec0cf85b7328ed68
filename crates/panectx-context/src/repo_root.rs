//! Canonical repository-root resolution with a bounded TTL cache.
//!
//! The cache is the only mutable state shared between panes. It is keyed by
//! the cwd with trailing separators stripped, stores negative results
//! ("not in a repository") as well as positive ones, serves nothing older
//! than the TTL, and evicts its oldest insertion once full.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use indexmap::IndexMap;
use panectx_core::normalized_non_empty;
use tokio::sync::Mutex;

use crate::error::GitError;
use crate::exec::{ExecOptions, run_command};

pub const REPO_ROOT_CACHE_TTL: Duration = Duration::from_millis(10_000);
pub const REPO_ROOT_CACHE_MAX_ENTRIES: usize = 1000;

/// Answers "which repository is this directory in?" by asking an external
/// tool. Implementations must honour the bounds in `opts`.
#[async_trait]
pub trait RepoRootSource: Send + Sync {
    async fn repo_root(&self, cwd: &str, opts: &ExecOptions) -> Result<Option<String>, GitError>;
}

/// Canonical repo-root lookup as consumed by the context resolver.
/// Never fails; "unknown" is `None`.
#[async_trait]
pub trait RepoRootResolver: Send + Sync {
    async fn resolve(&self, cwd: Option<&str>) -> Option<String>;
}

/// `git -C <cwd> rev-parse --show-toplevel`.
#[derive(Debug, Clone)]
pub struct GitRepoRootSource {
    git_bin: String,
}

impl GitRepoRootSource {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
        }
    }
}

impl Default for GitRepoRootSource {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl RepoRootSource for GitRepoRootSource {
    async fn repo_root(&self, cwd: &str, opts: &ExecOptions) -> Result<Option<String>, GitError> {
        let stdout = run_command(
            &self.git_bin,
            &["-C", cwd, "rev-parse", "--show-toplevel"],
            None,
            opts,
        )
        .await?;
        let root = stdout.trim();
        Ok(if root.is_empty() {
            None
        } else {
            Some(root.to_string())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoRootCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
    pub exec: ExecOptions,
}

impl Default for RepoRootCacheConfig {
    fn default() -> Self {
        Self {
            ttl: REPO_ROOT_CACHE_TTL,
            max_entries: REPO_ROOT_CACHE_MAX_ENTRIES,
            exec: ExecOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    repo_root: Option<String>,
    at: Instant,
}

/// TTL-cached [`RepoRootResolver`] over a [`RepoRootSource`].
///
/// The lock is held only to read or write the map, never across the
/// external call, so panes resolved in parallel do not serialize on git.
pub struct RepoRootCache {
    source: Arc<dyn RepoRootSource>,
    config: RepoRootCacheConfig,
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl RepoRootCache {
    pub fn new(source: Arc<dyn RepoRootSource>) -> Self {
        Self::with_config(source, RepoRootCacheConfig::default())
    }

    pub fn with_config(source: Arc<dyn RepoRootSource>, config: RepoRootCacheConfig) -> Self {
        Self {
            source,
            config,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Resolve `cwd` as of `now`.
    pub async fn resolve_at(&self, cwd: Option<&str>, now: Instant) -> Option<String> {
        let key = normalized_non_empty(cwd)?;

        if let Some(hit) = self.lookup(key, now).await {
            return hit;
        }

        let repo_root = match self.source.repo_root(key, &self.config.exec).await {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!(cwd = key, error = %e, "repo root lookup failed");
                None
            }
        };
        self.insert(key, repo_root.clone(), now).await;
        repo_root
    }

    /// Number of cached entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// `Some(cached)` on a fresh hit (including a cached `None`).
    async fn lookup(&self, key: &str, now: Instant) -> Option<Option<String>> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.at) < self.config.ttl {
            Some(entry.repo_root.clone())
        } else {
            None
        }
    }

    async fn insert(&self, key: &str, repo_root: Option<String>, now: Instant) {
        let mut entries = self.entries.lock().await;
        // Re-inserting moves the key to the back of the eviction order.
        entries.shift_remove(key);
        let max = self.config.max_entries.max(1);
        while entries.len() >= max {
            entries.shift_remove_index(0);
        }
        entries.insert(key.to_string(), CacheEntry { repo_root, at: now });
    }
}

#[async_trait]
impl RepoRootResolver for RepoRootCache {
    async fn resolve(&self, cwd: Option<&str>) -> Option<String> {
        self.resolve_at(cwd, Instant::now()).await
    }
}
