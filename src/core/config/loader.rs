use super::ConfigData;
use crate::core::error::AppError;
use std::path::Path;

/// On-disk representation of an empty configuration.
pub const EMPTY_CONFIG: &str = "{\n\n}";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and parse the configuration file. An empty file yields the empty
    /// configuration.
    pub fn load_from_file(path: &Path) -> Result<ConfigData, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                crate::core::types::ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;
        Self::parse_str(&content)
            .map_err(|e| AppError::validation(format!("{}: {}", path.display(), e.message)))
    }

    /// Parse configuration text. Strict JSON is tried first; on failure the
    /// relaxed superset (unquoted scalars, comments) is accepted.
    pub fn parse_str(content: &str) -> Result<ConfigData, AppError> {
        if content.trim().is_empty() {
            return Ok(ConfigData::default());
        }

        let json_error = match serde_json::from_str(content) {
            Ok(data) => return Ok(data),
            Err(e) => e,
        };

        match serde_yaml::from_str(content) {
            Ok(data) => Ok(data),
            Err(relaxed_error) => Err(AppError::validation(format!(
                "not parseable as JSON ({}) nor as relaxed superset ({})",
                json_error, relaxed_error
            ))),
        }
    }

    /// Materialize an empty configuration file at `path`.
    pub fn write_empty(path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, EMPTY_CONFIG).map_err(AppError::from)
    }
}
