use crate::core::error::AppError;

/// Uniform outcome of one command execution.
///
/// Immutable once built. A failed result always carries an error message;
/// the constructors make the illegal state unrepresentable.
#[derive(Debug)]
pub struct CommandResult {
    description: String,
    scope: String,
    failed: bool,
    error_message: Option<String>,
    fault: Option<AppError>,
}

impl CommandResult {
    pub fn success<D: Into<String>, S: Into<String>>(description: D, scope: S) -> Self {
        CommandResult {
            description: description.into(),
            scope: scope.into(),
            failed: false,
            error_message: None,
            fault: None,
        }
    }

    /// Build a failure from an already-transformed fault. The message follows
    /// the `'<description>' command failed: <reason>` convention.
    pub fn from_fault<D: Into<String>, S: Into<String>>(description: D, scope: S, fault: AppError) -> Self {
        let description = description.into();
        let message = format!("'{}' command failed: {}", description, fault.message);
        CommandResult {
            description,
            scope: scope.into(),
            failed: true,
            error_message: Some(message),
            fault: Some(fault),
        }
    }

    /// The description of the command this result belongs to.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The named object the command acted on.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn fault(&self) -> Option<&AppError> {
        self.fault.as_ref()
    }

    /// Re-tag this result as belonging to another command. Failure flag,
    /// message, and fault are preserved.
    pub fn retagged<D: Into<String>, S: Into<String>>(mut self, description: D, scope: S) -> Self {
        self.description = description.into();
        self.scope = scope.into();
        self
    }
}
