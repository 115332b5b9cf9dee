use crate::core::types::{ErrorCategory, ErrorSeverity};
use chrono::{DateTime, Utc};

/// Structured error carried through every core operation.
///
/// Low-level process errors are wrapped at most once when they surface from a
/// higher layer; the original error is kept in `source`.
#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let severity = match category {
            ErrorCategory::ConfigurationError
            | ErrorCategory::ProcessError
            | ErrorCategory::CommandError
            | ErrorCategory::CompletionError
            | ErrorCategory::ValidationError
            | ErrorCategory::IoError
            | ErrorCategory::InternalError => ErrorSeverity::Error,
            ErrorCategory::Unknown => ErrorSeverity::Info,
        };
        AppError {
            category,
            severity,
            code: format!("ERR-{}", uuid::Uuid::new_v4()),
            message: message.into(),
            occurred_at: Utc::now(),
            source: None,
        }
    }

    /// A fatal configuration error (missing property, remote mismatch, absent file).
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::ConfigurationError, message)
    }

    /// A process-level error; `message` is usually the captured stderr.
    pub fn process<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::ProcessError, message)
    }

    pub fn validation<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::ValidationError, message)
    }

    /// Wrap a lower-level error once, keeping it as the source.
    pub fn with_source<T: Into<String>>(category: ErrorCategory, message: T, source: AppError) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(anyhow::Error::new(source));
        error
    }

    /// Completion wrapper around a fault that crossed an async join boundary.
    /// The command engine's default fault transformer unwraps exactly one of these.
    pub fn wrap_completion(inner: AppError) -> Self {
        let mut error = AppError::new(
            ErrorCategory::CompletionError,
            format!("async completion failed: {}", inner.message),
        );
        error.source = Some(anyhow::Error::new(inner));
        error
    }

    /// Completion wrapper for a failed task join (panicked or aborted body).
    pub fn completion(join: tokio::task::JoinError) -> Self {
        AppError::new(ErrorCategory::CompletionError, join.to_string())
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError {
            category: ErrorCategory::InternalError,
            severity: ErrorSeverity::Error,
            code: "ANYHOW_ERROR".to_string(),
            message: e.to_string(),
            occurred_at: Utc::now(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError {
            category: ErrorCategory::IoError,
            severity: ErrorSeverity::Error,
            code: "IO_ERROR".to_string(),
            message: e.to_string(),
            occurred_at: Utc::now(),
            source: Some(anyhow::Error::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = AppError::new(ErrorCategory::ValidationError, "test error");
        assert_eq!(error.category, ErrorCategory::ValidationError);
        assert_eq!(error.message, "test error");
    }

    #[test]
    fn test_error_with_code() {
        let error = AppError::configuration("bad remote").with_code("CFG-001");
        assert_eq!(error.code, "CFG-001");
        assert_eq!(error.category, ErrorCategory::ConfigurationError);
    }

    #[test]
    fn test_error_severity() {
        let error = AppError::process("exit status 128");
        assert_eq!(error.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_wrap_once_keeps_source() {
        let inner = AppError::process("fatal: not a git repository");
        let wrapped = AppError::with_source(
            ErrorCategory::ConfigurationError,
            "failed to pull configuration branch 'main'",
            inner,
        );
        assert_eq!(wrapped.category, ErrorCategory::ConfigurationError);
        let source = wrapped.source.expect("source kept");
        let recovered = source.downcast::<AppError>().expect("source is an AppError");
        assert_eq!(recovered.category, ErrorCategory::ProcessError);
        assert_eq!(recovered.message, "fatal: not a git repository");
    }

    #[test]
    fn test_completion_wrapper_keeps_inner_as_source() {
        let inner = AppError::process("exit status 1");
        let wrapped = AppError::wrap_completion(inner);
        assert_eq!(wrapped.category, ErrorCategory::CompletionError);
        assert_eq!(wrapped.message, "async completion failed: exit status 1");
        let recovered = wrapped
            .source
            .expect("inner kept")
            .downcast::<AppError>()
            .expect("source is an AppError");
        assert_eq!(recovered.message, "exit status 1");
    }
}
