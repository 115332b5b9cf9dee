pub mod environment;
pub mod feature;
pub mod project;
pub mod repository;
pub mod worktree;

pub use environment::{default_comparator, Environment, EnvironmentComparator};
pub use feature::FeatureBranch;
pub use project::Project;
pub use repository::Repository;
pub use worktree::{BranchSupplier, WorktreeDefinition};

use crate::core::config::settings::Preferences;
use crate::core::config::{ConfigLoader, ConfigValidator};
use crate::core::error::AppError;
use crate::core::git::GitRunner;
use crate::core::provider::ConfigSource;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// First segment of every internal branch name.
pub const INTERNAL_BRANCH_PREFIX: &str = "gem/";

/// Separator between the project prefix and the environment name.
pub const BRANCH_SEPARATOR: &str = "/";

const DEFAULT_RESOURCES_DIR: &str = "resources";

/// The loaded read model: repositories and projects built from one
/// configuration file.
#[derive(Debug)]
pub struct Configuration {
    config_file: PathBuf,
    config_dir: PathBuf,
    resources_dir: Option<String>,
    temp_dir: Option<String>,
    repositories: IndexMap<String, Arc<Repository>>,
    projects: Vec<Arc<Project>>,
}

impl Configuration {
    /// Materialize the configuration through `source`, parse and validate it,
    /// and build the domain model.
    pub fn load(
        source: &dyn ConfigSource,
        prefs: &Preferences,
        runner: &GitRunner,
    ) -> Result<Self, AppError> {
        let config_file = source.config_file(prefs)?;
        let data = ConfigLoader::load_from_file(&config_file)?;
        ConfigValidator::validate(&data)?;

        let config_dir = config_file
            .parent()
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "configuration file {} has no parent directory",
                    config_file.display()
                ))
            })?
            .to_path_buf();

        let mut repositories = IndexMap::new();
        for definition in &data.repositories {
            let path = PathBuf::from(&definition.path);
            let local_path = if path.is_absolute() {
                path
            } else {
                source.relative_to_config_file(&definition.path)?
            };
            repositories.insert(
                definition.id.clone(),
                Repository::new(
                    definition.id.clone(),
                    definition.url.clone(),
                    local_path,
                    runner.clone(),
                ),
            );
        }

        let projects = data
            .projects
            .iter()
            .map(|definition| {
                Arc::new(Project::new(
                    definition.clone(),
                    repositories.clone(),
                    default_comparator(),
                ))
            })
            .collect();

        Ok(Configuration {
            config_file,
            config_dir,
            resources_dir: data.resources_dir,
            temp_dir: data.temp_dir,
            repositories,
            projects,
        })
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn repositories(&self) -> Vec<Arc<Repository>> {
        self.repositories.values().cloned().collect()
    }

    pub fn repository(&self, id: &str) -> Option<&Arc<Repository>> {
        self.repositories.get(id)
    }

    pub fn projects(&self) -> &[Arc<Project>] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Arc<Project>> {
        self.projects.iter().find(|project| project.name() == name)
    }

    /// Shared resources directory next to the configuration file.
    pub fn resources_dir(&self) -> PathBuf {
        self.config_dir
            .join(self.resources_dir.as_deref().unwrap_or(DEFAULT_RESOURCES_DIR))
    }

    /// Scratch directory for workflow output. Configured relative to the
    /// configuration file, or the OS temp directory otherwise.
    pub fn temp_dir(&self) -> Result<PathBuf, AppError> {
        let dir = match &self.temp_dir {
            Some(configured) => {
                let path = PathBuf::from(configured);
                if path.is_absolute() {
                    path
                } else {
                    self.config_dir.join(configured)
                }
            }
            None => std::env::temp_dir().join("gem"),
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// A fresh, self-deleting scratch directory under `temp_dir`.
    pub fn scratch_dir(&self) -> Result<tempfile::TempDir, AppError> {
        tempfile::Builder::new()
            .prefix("gem-")
            .tempdir_in(self.temp_dir()?)
            .map_err(AppError::from)
    }
}
