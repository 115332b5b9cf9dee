use std::env;
use std::path::PathBuf;

const DEFAULT_LEVEL: &str = "info";

/// Resolved logging configuration after applying env overrides.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// File logging target; `None` disables the file sink.
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_level: DEFAULT_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `GEM_LOG_DIR` and `GEM_LOG_LEVEL`.
    pub fn from_env() -> Self {
        let mut config = LoggingConfig::default();
        if let Ok(dir) = env::var("GEM_LOG_DIR") {
            if !dir.trim().is_empty() {
                config.log_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(level) = env::var("GEM_LOG_LEVEL") {
            if !level.trim().is_empty() {
                config.default_level = level;
            }
        }
        config
    }
}
