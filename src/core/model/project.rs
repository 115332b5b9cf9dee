use super::environment::{Environment, EnvironmentComparator};
use super::feature::FeatureBranch;
use super::repository::Repository;
use crate::core::config::ProjectConfig;
use crate::core::error::AppError;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

/// A project: the branch-prefix namespace owning environments and feature
/// branches. Environments are built once and cached until `refresh()`.
pub struct Project {
    config: ProjectConfig,
    repositories: IndexMap<String, Arc<Repository>>,
    comparator: EnvironmentComparator,
    environments: Mutex<Option<Vec<Arc<Environment>>>>,
}

impl Project {
    pub fn new(
        config: ProjectConfig,
        repositories: IndexMap<String, Arc<Repository>>,
        comparator: EnvironmentComparator,
    ) -> Self {
        Project {
            config,
            repositories,
            comparator,
            environments: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn branch_prefix(&self) -> &str {
        &self.config.branch_prefix
    }

    pub fn comparator(&self) -> &EnvironmentComparator {
        &self.comparator
    }

    /// The project's environments, ordered by the comparator. Built on first
    /// call and cached until `refresh()`.
    pub fn environments(&self) -> Result<Vec<Arc<Environment>>, AppError> {
        let mut cache = self.environments.lock().expect("environment cache poisoned");
        if let Some(environments) = cache.as_ref() {
            return Ok(environments.clone());
        }

        let mut built = Vec::with_capacity(self.config.environments.len());
        for definition in &self.config.environments {
            let repositories = self.resolve_repositories(definition.branches.keys())?;
            built.push(Arc::new(Environment::configured(
                self.config.name.clone(),
                self.config.branch_prefix.clone(),
                definition.name.clone(),
                definition.display_name.clone(),
                definition.branches.clone(),
                repositories,
            )));
        }
        built.sort_by(|a, b| (*self.comparator)(a, b));

        *cache = Some(built.clone());
        Ok(built)
    }

    pub fn environment(&self, name: &str) -> Result<Option<Arc<Environment>>, AppError> {
        Ok(self
            .environments()?
            .into_iter()
            .find(|environment| environment.name() == name))
    }

    /// Drop the cached environment list; the next call rebuilds it.
    pub fn refresh(&self) {
        *self.environments.lock().expect("environment cache poisoned") = None;
    }

    /// Every repository referenced by any environment of this project, each
    /// one exactly once, in first-reference order.
    pub fn repositories(&self) -> Result<Vec<Arc<Repository>>, AppError> {
        let mut seen: IndexMap<String, Arc<Repository>> = IndexMap::new();
        for environment in self.environments()? {
            for repository in environment.repositories() {
                seen.entry(repository.id().to_string())
                    .or_insert_with(|| Arc::clone(repository));
            }
        }
        Ok(seen.into_values().collect())
    }

    pub fn feature_branches(&self) -> Vec<FeatureBranch> {
        self.config
            .feature_branches
            .iter()
            .map(|definition| {
                FeatureBranch::new(
                    definition.id.clone(),
                    self.config.name.clone(),
                    definition.environment.clone(),
                    definition.summary.clone(),
                    definition.branches.clone(),
                )
            })
            .collect()
    }

    fn resolve_repositories<'a, I>(&self, ids: I) -> Result<Vec<Arc<Repository>>, AppError>
    where
        I: Iterator<Item = &'a String>,
    {
        ids.map(|id| {
            self.repositories
                .get(id)
                .cloned()
                .ok_or_else(|| {
                    AppError::validation(format!(
                        "project '{}' references unknown repository '{}'",
                        self.config.name, id
                    ))
                })
        })
        .collect()
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.config.name)
            .field("branch_prefix", &self.config.branch_prefix)
            .finish()
    }
}
