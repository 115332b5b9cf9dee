pub mod git;
pub mod local;

pub use git::{ConservativeSyncHook, GitConfigSource, SyncHook};
pub use local::LocalFileSource;

use crate::core::config::settings::{require, ConfigSourceKind, Preferences, Settings};
use crate::core::error::AppError;
use crate::core::git::GitRunner;
use std::path::PathBuf;
use std::sync::Arc;

/// Contract every configuration source satisfies. Selection between the
/// providers happens externally (settings); consumers only see this trait.
pub trait ConfigSource: Send + Sync {
    /// Path of the preferences file consulted before configuration loading.
    fn pref_file(&self) -> PathBuf;

    /// Materialize the configuration file, synchronizing remote-backed
    /// sources first, and return its path.
    fn config_file(&self, prefs: &Preferences) -> Result<PathBuf, AppError>;

    /// Resolve `relative` against the configuration file's parent directory.
    /// Works before and after synchronization.
    fn relative_to_config_file(&self, relative: &str) -> Result<PathBuf, AppError>;
}

/// Build the configuration source selected by the settings.
pub fn select_source(settings: &Settings, runner: GitRunner) -> Result<Arc<dyn ConfigSource>, AppError> {
    match settings.source {
        ConfigSourceKind::Local => {
            let file = require(&settings.local_file, "GEM_CONFIG_LOCAL_FILE")?;
            Ok(Arc::new(LocalFileSource::new(settings.home.clone(), file)))
        }
        ConfigSourceKind::Git => Ok(Arc::new(GitConfigSource::from_settings(settings, runner)?)),
    }
}
