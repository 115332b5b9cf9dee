use super::repository::Repository;
use super::worktree::WorktreeDefinition;
use super::{BRANCH_SEPARATOR, INTERNAL_BRANCH_PREFIX};
use crate::core::error::AppError;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

/// How an environment came to be.
#[derive(Debug)]
enum EnvironmentKind {
    /// Backed by the configuration file.
    Configured {
        /// Repository id to pinned branch, in configuration order.
        branches: IndexMap<String, String>,
        repositories: Vec<Arc<Repository>>,
    },
    /// Discovered from a stale internal branch during reconciliation.
    /// Read-only: there is no configuration-backed branch mapping.
    Obsolete {
        observed_on: Vec<Arc<Repository>>,
    },
}

/// A named, project-scoped pinning of branches across repositories — or the
/// obsolete remnant of one, discovered from a leftover internal branch.
#[derive(Debug)]
pub struct Environment {
    project: String,
    branch_prefix: String,
    name: String,
    display_name: String,
    kind: EnvironmentKind,
}

impl Environment {
    pub fn configured(
        project: String,
        branch_prefix: String,
        name: String,
        display_name: Option<String>,
        branches: IndexMap<String, String>,
        repositories: Vec<Arc<Repository>>,
    ) -> Self {
        Environment {
            project,
            branch_prefix,
            display_name: display_name.unwrap_or_else(|| name.clone()),
            name,
            kind: EnvironmentKind::Configured { branches, repositories },
        }
    }

    /// An environment discovered from a stale internal branch. `name` is the
    /// branch name with the internal prefix stripped; it doubles as the
    /// display name.
    pub fn obsolete(
        project: String,
        branch_prefix: String,
        name: String,
        observed_on: Vec<Arc<Repository>>,
    ) -> Self {
        Environment {
            project,
            branch_prefix,
            display_name: name.clone(),
            name,
            kind: EnvironmentKind::Obsolete { observed_on },
        }
    }

    /// Name of the project this environment belongs to.
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_obsolete(&self) -> bool {
        matches!(self.kind, EnvironmentKind::Obsolete { .. })
    }

    /// The git branch tracking in-progress work of this environment instance.
    pub fn internal_branch_name(&self) -> String {
        format!(
            "{}{}{}{}",
            INTERNAL_BRANCH_PREFIX, self.branch_prefix, BRANCH_SEPARATOR, self.name
        )
    }

    /// Pinned branch per repository id. Fails for obsolete environments,
    /// which have no configuration-backed mapping.
    pub fn branch_map(&self) -> Result<&IndexMap<String, String>, AppError> {
        match &self.kind {
            EnvironmentKind::Configured { branches, .. } => Ok(branches),
            EnvironmentKind::Obsolete { .. } => Err(AppError::configuration(format!(
                "environment '{}' was discovered from a stale internal branch and has no branch mapping",
                self.name
            ))),
        }
    }

    pub fn pinned_branch(&self, repository_id: &str) -> Result<Option<&str>, AppError> {
        Ok(self.branch_map()?.get(repository_id).map(String::as_str))
    }

    /// Repositories this environment spans: the configured set, or for an
    /// obsolete environment the repositories its internal branch was seen on.
    pub fn repositories(&self) -> &[Arc<Repository>] {
        match &self.kind {
            EnvironmentKind::Configured { repositories, .. } => repositories,
            EnvironmentKind::Obsolete { observed_on } => observed_on,
        }
    }

    /// Worktree definitions under `base`, one per repository, on the internal
    /// branch of this environment.
    pub fn worktrees(&self, base: &Path) -> Vec<WorktreeDefinition> {
        let internal = self.internal_branch_name();
        self.repositories()
            .iter()
            .map(|repository| {
                let branch = internal.clone();
                Arc::clone(repository).worktree(
                    base.join(&self.name).join(repository.id()),
                    Box::new(move || branch.clone()),
                )
            })
            .collect()
    }
}

/// Pluggable ordering for environment lists.
pub type EnvironmentComparator = Arc<dyn Fn(&Environment, &Environment) -> Ordering + Send + Sync>;

/// Default ordering: display name (case-insensitive), then name.
pub fn default_comparator() -> EnvironmentComparator {
    Arc::new(|a, b| {
        a.display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase())
            .then_with(|| a.name().cmp(b.name()))
    })
}
