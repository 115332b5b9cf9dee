pub mod command;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod types;

pub use command::{AlreadyRunning, BufferSink, Command, CommandResult, OutputSink, TracingSink};
pub use config::{ConfigLoader, ConfigValidator, Preferences, Settings};
pub use error::AppError;
pub use git::GitRunner;
pub use model::{Configuration, Environment, FeatureBranch, Project, Repository, WorktreeDefinition};
pub use provider::{ConfigSource, GitConfigSource, LocalFileSource};
pub use types::*;
