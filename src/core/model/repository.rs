use super::worktree::{BranchSupplier, WorktreeDefinition};
use crate::core::error::AppError;
use crate::core::git::GitRunner;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A managed repository: remote URL, local clone location, and a lazily
/// fetched branch list cached until `refresh()`.
#[derive(Debug)]
pub struct Repository {
    id: String,
    url: String,
    local_path: PathBuf,
    runner: GitRunner,
    branches: Mutex<Option<Vec<String>>>,
}

impl Repository {
    pub fn new(id: String, url: String, local_path: PathBuf, runner: GitRunner) -> Arc<Self> {
        Arc::new(Repository {
            id,
            url,
            local_path,
            runner,
            branches: Mutex::new(None),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Whether the local clone exists on disk.
    pub fn is_cloned(&self) -> bool {
        GitRunner::is_repository(&self.local_path)
    }

    /// Local branch names. Fetched on first call and cached until `refresh()`.
    pub fn branches(&self) -> Result<Vec<String>, AppError> {
        let mut cache = self.branches.lock().expect("branch cache poisoned");
        if let Some(branches) = cache.as_ref() {
            return Ok(branches.clone());
        }
        let fetched = self.runner.local_branches(&self.local_path)?;
        *cache = Some(fetched.clone());
        Ok(fetched)
    }

    /// Drop the cached branch list; the next `branches()` call refetches.
    pub fn refresh(&self) {
        *self.branches.lock().expect("branch cache poisoned") = None;
    }

    /// Worktree factory: a definition of this repository checked out at
    /// `location` on the branch the supplier names.
    pub fn worktree(self: Arc<Self>, location: PathBuf, branch: BranchSupplier) -> WorktreeDefinition {
        WorktreeDefinition::new(self, location, branch)
    }
}
