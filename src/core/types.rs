use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Missing or inconsistent external configuration: absent required
    /// properties, remote mismatch, config file missing after sync.
    ConfigurationError,
    /// A subprocess could not be launched or exited non-zero.
    ProcessError,
    /// A fault raised inside a command execution body.
    CommandError,
    /// A wrapper produced by async completion machinery (task joins, panics).
    CompletionError,
    ValidationError,
    IoError,
    InternalError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}

/// Operator tag of a composed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeOperator {
    And,
    Or,
}

impl std::fmt::Display for CompositeOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositeOperator::And => write!(f, "AND"),
            CompositeOperator::Or => write!(f, "OR"),
        }
    }
}
