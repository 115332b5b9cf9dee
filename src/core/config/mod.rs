use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw configuration file contents: repositories, projects, environments,
/// feature branches. Paths are relative to the configuration file unless
/// absolute.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigData {
    /// Shared resources directory (default: `resources`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<String>,

    /// Scratch directory for workflow output (default: OS temp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,

    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

/// One managed repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositoryConfig {
    /// Stable identifier referenced by environments and feature branches.
    pub id: String,

    /// Remote URL the local clone must point at.
    pub url: String,

    /// Local clone location.
    pub path: String,
}

/// A project: a branch-prefix namespace holding environments and feature
/// branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub name: String,

    /// Middle segment of every internal branch name of this project.
    pub branch_prefix: String,

    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    #[serde(default)]
    pub feature_branches: Vec<FeatureBranchConfig>,
}

/// A named pinning of branches across repositories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Repository id to pinned branch, in configuration order.
    #[serde(default)]
    pub branches: IndexMap<String, String>,
}

/// A unit of work checked out across one or more repositories of an
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureBranchConfig {
    pub id: String,

    /// Name of the environment the feature branch belongs to.
    pub environment: String,

    #[serde(default)]
    pub summary: String,

    /// Repository id to checkout branch.
    #[serde(default)]
    pub branches: IndexMap<String, String>,
}

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::ConfigLoader;
pub use settings::{ConfigSourceKind, Preferences, Settings};
pub use validation::ConfigValidator;
