use crate::core::error::AppError;
use crate::core::model::{Environment, Project, Repository, BRANCH_SEPARATOR, INTERNAL_BRANCH_PREFIX};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Find internal branches that exist in cloned repositories under the
/// project's prefix but no longer correspond to any configured environment.
///
/// Each repository referenced by any environment of the project is visited
/// once, and only if it is currently cloned. The result is ordered by the
/// project's environment comparator.
pub fn find_obsolete_environments(project: &Project) -> Result<Vec<Environment>, AppError> {
    let prefix = format!(
        "{}{}{}",
        INTERNAL_BRANCH_PREFIX,
        project.branch_prefix(),
        BRANCH_SEPARATOR
    );

    let known: HashSet<String> = project
        .environments()?
        .iter()
        .map(|environment| environment.internal_branch_name())
        .collect();

    // Branch name to the repositories it was observed on, in stable order.
    let mut observed: BTreeMap<String, Vec<Arc<Repository>>> = BTreeMap::new();
    for repository in project.repositories()? {
        if !repository.is_cloned() {
            tracing::debug!(repository = repository.id(), "skipping: not cloned");
            continue;
        }
        for branch in repository.branches()? {
            if branch.starts_with(&prefix) {
                observed.entry(branch).or_default().push(Arc::clone(&repository));
            }
        }
    }

    let mut obsolete: Vec<Environment> = observed
        .into_iter()
        .filter(|(branch, _)| !known.contains(branch))
        .map(|(branch, repositories)| {
            let name = branch.strip_prefix(&prefix).unwrap_or(&branch).to_string();
            Environment::obsolete(
                project.name().to_string(),
                project.branch_prefix().to_string(),
                name,
                repositories,
            )
        })
        .collect();

    let comparator = project.comparator().clone();
    obsolete.sort_by(|a, b| (*comparator)(a, b));

    tracing::info!(
        project = project.name(),
        count = obsolete.len(),
        "obsolete environment scan finished"
    );
    Ok(obsolete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigLoader;
    use crate::core::git::testutil::{git, init_git_repo};
    use crate::core::git::GitRunner;
    use crate::core::model::default_comparator;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn runner() -> GitRunner {
        GitRunner::new(GitRunner::locate_binary().unwrap())
    }

    fn project_with_repos(base: &std::path::Path) -> Project {
        let data = ConfigLoader::parse_str(
            r#"
{
  "repositories": [
    { "id": "a", "url": "git@host:a.git", "path": "a" },
    { "id": "b", "url": "git@host:b.git", "path": "b" }
  ],
  "projects": [
    { "name": "billing", "branch_prefix": "billing",
      "environments": [
        { "name": "x", "branches": { "a": "main", "b": "main" } }
      ] }
  ]
}
"#,
        )
        .unwrap();

        let repositories: IndexMap<String, Arc<Repository>> = data
            .repositories
            .iter()
            .map(|repo| {
                (
                    repo.id.clone(),
                    Repository::new(
                        repo.id.clone(),
                        repo.url.clone(),
                        base.join(&repo.path),
                        runner(),
                    ),
                )
            })
            .collect();

        Project::new(data.projects[0].clone(), repositories, default_comparator())
    }

    #[test]
    fn stale_branch_reported_with_observing_repositories() {
        let base = TempDir::new().unwrap();
        for repo in ["a", "b"] {
            let path = base.path().join(repo);
            std::fs::create_dir_all(&path).unwrap();
            init_git_repo(&path);
        }
        // a: the known internal branch only; b: the known one plus a stale one.
        git(&base.path().join("a"), &["branch", "gem/billing/x"]);
        git(&base.path().join("b"), &["branch", "gem/billing/x"]);
        git(&base.path().join("b"), &["branch", "gem/billing/y"]);

        let project = project_with_repos(base.path());
        let obsolete = find_obsolete_environments(&project).unwrap();

        assert_eq!(obsolete.len(), 1);
        let stale = &obsolete[0];
        assert!(stale.is_obsolete());
        assert_eq!(stale.display_name(), "y");
        assert_eq!(stale.internal_branch_name(), "gem/billing/y");
        let observed: Vec<&str> = stale.repositories().iter().map(|r| r.id()).collect();
        assert_eq!(observed, vec!["b"]);
    }

    #[test]
    fn unrelated_branches_are_ignored() {
        let base = TempDir::new().unwrap();
        for repo in ["a", "b"] {
            let path = base.path().join(repo);
            std::fs::create_dir_all(&path).unwrap();
            init_git_repo(&path);
        }
        git(&base.path().join("a"), &["branch", "feature/unrelated"]);
        git(&base.path().join("a"), &["branch", "gem/otherproject/z"]);

        let project = project_with_repos(base.path());
        let obsolete = find_obsolete_environments(&project).unwrap();
        assert!(obsolete.is_empty());
    }

    #[test]
    fn uncloned_repositories_are_skipped() {
        let base = TempDir::new().unwrap();
        // Only "a" exists on disk; "b" was never cloned.
        let path = base.path().join("a");
        std::fs::create_dir_all(&path).unwrap();
        init_git_repo(&path);
        git(&path, &["branch", "gem/billing/stale"]);

        let project = project_with_repos(base.path());
        let obsolete = find_obsolete_environments(&project).unwrap();

        assert_eq!(obsolete.len(), 1);
        let observed: Vec<&str> = obsolete[0].repositories().iter().map(|r| r.id()).collect();
        assert_eq!(observed, vec!["a"]);
    }

    #[test]
    fn obsolete_list_sorted_by_comparator() {
        let base = TempDir::new().unwrap();
        let path = base.path().join("a");
        std::fs::create_dir_all(&path).unwrap();
        init_git_repo(&path);
        git(&path, &["branch", "gem/billing/zeta"]);
        git(&path, &["branch", "gem/billing/alpha"]);

        let project = project_with_repos(base.path());
        let obsolete = find_obsolete_environments(&project).unwrap();

        let names: Vec<&str> = obsolete.iter().map(|e| e.display_name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
