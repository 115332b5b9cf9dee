use crate::core::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const PREF_FILE_NAME: &str = "preferences.toml";

/// Which provider serves the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSourceKind {
    #[default]
    Local,
    Git,
}

impl std::str::FromStr for ConfigSourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(ConfigSourceKind::Local),
            "git" => Ok(ConfigSourceKind::Git),
            other => Err(AppError::configuration(format!(
                "unknown configuration source '{}' (expected 'local' or 'git')",
                other
            ))),
        }
    }
}

/// Stored user preferences, read from `<GEM_HOME>/preferences.toml`.
/// Environment variables take precedence over everything in here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Preferences {
    /// Git executable override consulted before the PATH search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_binary: Option<PathBuf>,

    /// Fallback configuration source when `GEM_CONFIG_SOURCE` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_source: Option<String>,
}

impl Preferences {
    /// Load preferences from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Preferences::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                crate::core::types::ErrorCategory::IoError,
                format!("Failed to read preferences file {}: {}", path.display(), e),
            )
        })?;
        toml::from_str(&content).map_err(|e| {
            AppError::validation(format!(
                "Failed to parse preferences file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Operating-environment settings resolved from `GEM_*` variables, with
/// preferences as fallback for the source selection.
#[derive(Debug, Clone)]
pub struct Settings {
    /// State directory; clone target and preferences live under it.
    pub home: PathBuf,
    pub source: ConfigSourceKind,
    pub git_url: Option<String>,
    pub git_branch: Option<String>,
    /// Config file path relative to the configuration checkout.
    pub git_file: Option<String>,
    pub local_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env(prefs: &Preferences) -> Result<Self, AppError> {
        let home = Self::resolve_home()?;
        let source = match env::var("GEM_CONFIG_SOURCE") {
            Ok(value) => value.parse()?,
            Err(_) => match &prefs.config_source {
                Some(value) => value.parse()?,
                None => ConfigSourceKind::default(),
            },
        };
        Ok(Settings {
            home,
            source,
            git_url: env::var("GEM_CONFIG_GIT_URL").ok(),
            git_branch: env::var("GEM_CONFIG_GIT_BRANCH").ok(),
            git_file: env::var("GEM_CONFIG_GIT_FILE").ok(),
            local_file: env::var("GEM_CONFIG_LOCAL_FILE").ok().map(PathBuf::from),
        })
    }

    pub fn resolve_home() -> Result<PathBuf, AppError> {
        if let Ok(home) = env::var("GEM_HOME") {
            return Ok(PathBuf::from(home));
        }
        dirs_next::home_dir()
            .map(|home| home.join(".gem"))
            .ok_or_else(|| AppError::configuration("home directory not resolvable; set GEM_HOME"))
    }

    pub fn pref_file(&self) -> PathBuf {
        self.home.join(PREF_FILE_NAME)
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "GEM_HOME - State directory (default: ~/.gem)",
            "GEM_CONFIG_SOURCE - Configuration source, 'local' or 'git' (default: local)",
            "GEM_CONFIG_GIT_URL - Remote URL of the configuration repository",
            "GEM_CONFIG_GIT_BRANCH - Branch of the configuration repository",
            "GEM_CONFIG_GIT_FILE - Config file path relative to the checkout",
            "GEM_CONFIG_LOCAL_FILE - Absolute path of a local config file",
            "GEM_GIT_BINARY - Override for the git executable",
            "GEM_LOG_DIR - Enable file logging into this directory",
            "GEM_LOG_LEVEL - Default tracing level (default: info)",
        ]
    }
}

/// Fetch a required settings value or fail with the variable name.
pub(crate) fn require<T: Clone>(value: &Option<T>, variable: &str) -> Result<T, AppError> {
    value
        .clone()
        .ok_or_else(|| AppError::configuration(format!("required property {} is not set", variable)))
}
