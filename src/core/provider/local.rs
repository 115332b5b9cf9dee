use super::ConfigSource;
use crate::core::config::settings::Preferences;
use crate::core::config::ConfigLoader;
use crate::core::error::AppError;
use std::path::PathBuf;

/// Configuration source backed by a plain local file. A missing file is
/// materialized as the empty configuration.
pub struct LocalFileSource {
    home: PathBuf,
    file: PathBuf,
}

impl LocalFileSource {
    pub fn new(home: PathBuf, file: PathBuf) -> Self {
        LocalFileSource { home, file }
    }
}

impl ConfigSource for LocalFileSource {
    fn pref_file(&self) -> PathBuf {
        self.home.join("preferences.toml")
    }

    fn config_file(&self, _prefs: &Preferences) -> Result<PathBuf, AppError> {
        if !self.file.exists() {
            tracing::info!(file = %self.file.display(), "creating empty configuration file");
            ConfigLoader::write_empty(&self.file)?;
        }
        Ok(self.file.clone())
    }

    fn relative_to_config_file(&self, relative: &str) -> Result<PathBuf, AppError> {
        let parent = self.file.parent().ok_or_else(|| {
            AppError::configuration(format!(
                "configuration file {} has no parent directory",
                self.file.display()
            ))
        })?;
        Ok(parent.join(relative))
    }
}
