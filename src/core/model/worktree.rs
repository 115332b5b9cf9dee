use super::repository::Repository;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Supplies the branch a worktree is checked out on. A closure because the
/// name may depend on state resolved at call time (environment vs. feature
/// branch checkouts).
pub type BranchSupplier = Box<dyn Fn() -> String + Send + Sync>;

/// A repository checked out at a dedicated filesystem location.
pub struct WorktreeDefinition {
    repository: Arc<Repository>,
    location: PathBuf,
    branch: BranchSupplier,
}

impl WorktreeDefinition {
    pub fn new(repository: Arc<Repository>, location: PathBuf, branch: BranchSupplier) -> Self {
        WorktreeDefinition { repository, location, branch }
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn branch(&self) -> String {
        (self.branch)()
    }

    /// Whether the worktree is actually materialized on disk. Linked
    /// worktrees carry a `.git` file instead of a directory, so a plain
    /// existence check covers both.
    pub fn is_added(&self) -> bool {
        self.location.join(".git").exists()
    }
}

impl std::fmt::Debug for WorktreeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorktreeDefinition")
            .field("repository", &self.repository.id())
            .field("location", &self.location)
            .finish()
    }
}
