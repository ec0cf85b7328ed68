//! One monitoring tick: tmux → capture pipes → repo context → `PaneDetail`.
//!
//! Pipe attachment runs pane by pane (each is one or two short tmux calls).
//! Repo roots are warmed concurrently first so the worktree snapshot can be
//! refreshed for exactly the repositories on screen; context resolution then
//! runs one task per pane against the shared cache.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use panectx_context::{
    BranchResolver, ContextResolvers, GhPrCreatedResolver, GitBranchResolver, GitRepoRootSource,
    GitWorktreeSnapshot, PrCreatedResolver, RepoRootCache, RepoRootResolver, resolve_pane_context,
};
use panectx_core::{PaneDetail, PaneDetailInput, PipeAttachResult, build_pane_detail};
use panectx_tmux::{
    AttachOptions, ListPanesOptions, PaneListing, PipeManager, TmuxCommandRunner, list_panes,
    read_pipe_state,
};
use tokio::task::JoinSet;

use crate::observe::{self, build_observation, log_path_for};

/// Context collaborators shared by every pane task.
#[derive(Clone)]
pub struct MonitorResolvers {
    pub repo_roots: Arc<RepoRootCache>,
    pub worktrees: Arc<GitWorktreeSnapshot>,
    pub branch: Arc<dyn BranchResolver>,
    pub pr_created: Arc<dyn PrCreatedResolver>,
}

impl MonitorResolvers {
    /// git/gh-backed resolvers.
    pub fn git(git_bin: &str, gh_bin: &str) -> Self {
        Self {
            repo_roots: Arc::new(RepoRootCache::new(Arc::new(GitRepoRootSource::new(git_bin)))),
            worktrees: Arc::new(GitWorktreeSnapshot::new(git_bin)),
            branch: Arc::new(GitBranchResolver::new(git_bin)),
            pr_created: Arc::new(GhPrCreatedResolver::new(gh_bin)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOptions {
    pub attach: bool,
    pub force_reattach: bool,
}

impl Default for TickOptions {
    fn default() -> Self {
        Self {
            attach: true,
            force_reattach: false,
        }
    }
}

pub struct Monitor<R> {
    runner: Arc<R>,
    pipes: PipeManager<Arc<R>>,
    list_options: ListPanesOptions,
    log_dir: PathBuf,
    resolvers: MonitorResolvers,
}

impl<R: TmuxCommandRunner> Monitor<R> {
    pub fn new(
        runner: Arc<R>,
        log_dir: PathBuf,
        pipe_tag_option: &str,
        resolvers: MonitorResolvers,
    ) -> Self {
        Self {
            pipes: PipeManager::with_tag_option(Arc::clone(&runner), pipe_tag_option),
            list_options: ListPanesOptions {
                pipe_tag_option: pipe_tag_option.to_string(),
                ..Default::default()
            },
            runner,
            log_dir,
            resolvers,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Run one tick. Fails only if the pane list cannot be read; every
    /// per-pane problem degrades that pane's fields instead.
    pub async fn tick(&self, options: TickOptions) -> anyhow::Result<Vec<PaneDetail>> {
        let listings = list_panes(&*self.runner, &self.list_options).await?;
        tracing::debug!(panes = listings.len(), "listed panes");

        let attach = options.attach && self.ensure_log_dir().await;
        let mut pipes = Vec::with_capacity(listings.len());
        for listing in &listings {
            pipes.push(self.pipe_for(listing, attach, options.force_reattach).await);
        }

        self.refresh_worktrees(&listings).await;

        let mut tasks = JoinSet::new();
        for (idx, (listing, pipe)) in listings.into_iter().zip(pipes).enumerate() {
            let resolvers = self.resolvers.clone();
            let log_path = log_path_for(&self.log_dir, &listing.pane.pane_id);
            tasks.spawn(async move {
                let detail = resolve_pane(listing, pipe, &log_path, &resolvers).await;
                (idx, detail)
            });
        }

        let mut details = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => details.push(entry),
                Err(e) => tracing::warn!(error = %e, "pane resolution task failed"),
            }
        }
        details.sort_by_key(|(idx, _)| *idx);
        Ok(details.into_iter().map(|(_, detail)| detail).collect())
    }

    async fn ensure_log_dir(&self) -> bool {
        match tokio::fs::create_dir_all(&self.log_dir).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    log_dir = %self.log_dir.display(),
                    error = %e,
                    "cannot create capture log directory, skipping pipe attachment"
                );
                false
            }
        }
    }

    async fn pipe_for(
        &self,
        listing: &PaneListing,
        attach: bool,
        force_reattach: bool,
    ) -> PipeAttachResult {
        let state = &listing.pipe_state;
        if !attach || listing.pane.pane_dead {
            return PipeAttachResult {
                attached: state.pane_pipe && state.has_owned_tag(),
                conflict: state.is_foreign(),
            };
        }
        let pane_id = &listing.pane.pane_id;

        // A forced reattach closes whatever pipe we think we own, so decide
        // ownership from tmux as of now rather than from the listing.
        let tag_option = &self.list_options.pipe_tag_option;
        let fresh = if force_reattach {
            match read_pipe_state(&*self.runner, pane_id, tag_option).await {
                Ok(fresh) => Some(fresh),
                Err(e) => {
                    tracing::debug!(pane_id = %pane_id, error = %e, "pipe state re-read failed");
                    None
                }
            }
        } else {
            None
        };
        let state = fresh.as_ref().unwrap_or(state);

        let log_path = log_path_for(&self.log_dir, pane_id);
        self.pipes
            .attach_pipe(pane_id, &log_path, state, AttachOptions { force_reattach })
            .await
    }

    /// Resolve every distinct cwd once (filling the cache) and rebuild the
    /// worktree table for the repositories found.
    async fn refresh_worktrees(&self, listings: &[PaneListing]) {
        let cwds: BTreeSet<String> = listings
            .iter()
            .filter_map(|l| l.pane.current_path.clone())
            .collect();

        let mut tasks = JoinSet::new();
        for cwd in cwds {
            let cache = Arc::clone(&self.resolvers.repo_roots);
            tasks.spawn(async move { cache.resolve(Some(cwd.as_str())).await });
        }
        let mut roots = BTreeSet::new();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(Some(root)) = joined {
                roots.insert(root);
            }
        }

        let worktrees = self
            .resolvers
            .worktrees
            .refresh(roots.iter().map(String::as_str))
            .await;
        tracing::debug!(repos = roots.len(), worktrees, "worktree snapshot refreshed");
    }
}

async fn resolve_pane(
    listing: PaneListing,
    pipe: PipeAttachResult,
    log_path: &Path,
    resolvers: &MonitorResolvers,
) -> PaneDetail {
    let PaneListing {
        pane, custom_title, ..
    } = listing;
    let context_resolvers = ContextResolvers {
        repo_root: &*resolvers.repo_roots,
        worktree_status: Some(&*resolvers.worktrees),
        branch: Some(&*resolvers.branch),
        pr_created: Some(&*resolvers.pr_created),
    };
    let (pane_context, output_at) = tokio::join!(
        resolve_pane_context(pane.current_path.as_deref(), &context_resolvers),
        observe::output_at(log_path),
    );
    let observation = build_observation(&pane, pipe, output_at);
    build_pane_detail(PaneDetailInput {
        pane: &pane,
        observation: &observation,
        pane_context: &pane_context,
        custom_title: custom_title.as_deref(),
    })
}
