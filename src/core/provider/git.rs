#![allow(clippy::result_large_err)]

use super::ConfigSource;
use crate::core::config::settings::{require, Preferences, Settings};
use crate::core::error::AppError;
use crate::core::git::GitRunner;
use crate::core::types::ErrorCategory;
use std::path::PathBuf;
use std::sync::Mutex;

const CHECKOUT_DIR_NAME: &str = "config";

/// Decision hook consulted when synchronization hits a recoverable fork.
/// The defaults are conservative: fail rather than silently diverge.
/// Overriding implementations may, for example, ask a human.
pub trait SyncHook: Send + Sync {
    /// Decide whether to check out the configured branch when the checkout is
    /// currently on another one. Returning `false` means: keep the current
    /// branch and proceed (the configuration may be stale). The default is a
    /// fatal error.
    fn checkout_when_different_branch(&self, configured: &str, current: &str) -> Result<bool, AppError> {
        Err(AppError::configuration(format!(
            "configuration checkout is on branch '{}' but '{}' is configured",
            current, configured
        )))
    }

    /// Decide whether a failed pull of the configured branch may be ignored.
    fn proceed_if_pull_fails(&self, _configured: &str) -> bool {
        false
    }
}

/// The default hook: every fork is fatal.
pub struct ConservativeSyncHook;

impl SyncHook for ConservativeSyncHook {}

/// Configuration source backed by a git repository.
///
/// `config_file` guarantees a local checkout of the remote configuration
/// repository exists, points at the configured remote, is on the configured
/// branch (hook permitting), and is up to date, then returns the path of the
/// configuration file inside it.
///
/// State is single-writer: concurrent synchronization of the same checkout
/// is not supported and must be serialized by the caller.
pub struct GitConfigSource {
    runner: GitRunner,
    home: PathBuf,
    checkout_dir: PathBuf,
    url: String,
    branch: String,
    file: String,
    hook: Box<dyn SyncHook>,
    warning: Mutex<Option<String>>,
}

impl GitConfigSource {
    /// Build from resolved settings. Branch, file, and remote URL are all
    /// required; missing ones are fatal configuration errors.
    pub fn from_settings(settings: &Settings, runner: GitRunner) -> Result<Self, AppError> {
        let url = require(&settings.git_url, "GEM_CONFIG_GIT_URL")?;
        let branch = require(&settings.git_branch, "GEM_CONFIG_GIT_BRANCH")?;
        let file = require(&settings.git_file, "GEM_CONFIG_GIT_FILE")?;
        Ok(GitConfigSource {
            runner,
            home: settings.home.clone(),
            checkout_dir: settings.home.join(CHECKOUT_DIR_NAME),
            url,
            branch,
            file,
            hook: Box::new(ConservativeSyncHook),
            warning: Mutex::new(None),
        })
    }

    /// Replace the decision hook.
    pub fn with_hook(mut self, hook: Box<dyn SyncHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn checkout_dir(&self) -> &PathBuf {
        &self.checkout_dir
    }

    /// Warning recorded by the last synchronization, if the pull-failure
    /// ignore path could not fully restore the checkout.
    pub fn last_sync_warning(&self) -> Option<String> {
        self.warning.lock().expect("warning slot poisoned").clone()
    }

    fn record_warning(&self, note: String) {
        tracing::warn!("{}", note);
        *self.warning.lock().expect("warning slot poisoned") = Some(note);
    }

    fn synchronize(&self) -> Result<(), AppError> {
        *self.warning.lock().expect("warning slot poisoned") = None;

        if !GitRunner::is_repository(&self.checkout_dir) {
            tracing::info!(url = %self.url, branch = %self.branch, "cloning configuration repository");
            self.runner
                .clone_branch(&self.url, &self.branch, &self.checkout_dir)
                .map_err(|e| {
                    AppError::with_source(
                        ErrorCategory::ConfigurationError,
                        format!("failed to clone configuration repository {}", self.url),
                        e,
                    )
                })?;
            return Ok(());
        }

        let origin = self.runner.remote_origin_url(&self.checkout_dir).map_err(|e| {
            AppError::with_source(
                ErrorCategory::ConfigurationError,
                format!("failed to read remote of {}", self.checkout_dir.display()),
                e,
            )
        })?;
        if origin != self.url {
            return Err(AppError::configuration(format!(
                "configuration checkout at {} points at '{}' instead of '{}'",
                self.checkout_dir.display(),
                origin,
                self.url
            )));
        }

        let current = self.runner.current_branch(&self.checkout_dir).map_err(|e| {
            AppError::with_source(
                ErrorCategory::ConfigurationError,
                format!("failed to read current branch of {}", self.checkout_dir.display()),
                e,
            )
        })?;
        if current != self.branch {
            if self.hook.checkout_when_different_branch(&self.branch, &current)? {
                self.runner.checkout(&self.checkout_dir, &self.branch).map_err(|e| {
                    AppError::with_source(
                        ErrorCategory::ConfigurationError,
                        format!("failed to check out configuration branch '{}'", self.branch),
                        e,
                    )
                })?;
            } else {
                tracing::warn!(
                    configured = %self.branch,
                    current = %current,
                    "keeping current branch; configuration is NOT guaranteed to be up to date"
                );
            }
        }

        if let Err(pull_error) = self.runner.pull_origin(&self.checkout_dir, &self.branch) {
            if self.hook.proceed_if_pull_fails(&self.branch) {
                tracing::warn!(
                    branch = %self.branch,
                    error = %pull_error,
                    "ignoring failed pull of configuration branch"
                );
                if let Err(abort_error) = self.runner.merge_abort(&self.checkout_dir) {
                    self.record_warning(format!(
                        "pull of '{}' failed and 'merge --abort' did not restore the checkout: {}",
                        self.branch, abort_error.message
                    ));
                }
            } else {
                return Err(AppError::with_source(
                    ErrorCategory::ConfigurationError,
                    format!("failed to pull configuration branch '{}'", self.branch),
                    pull_error,
                ));
            }
        }

        Ok(())
    }
}

impl ConfigSource for GitConfigSource {
    fn pref_file(&self) -> PathBuf {
        self.home.join("preferences.toml")
    }

    fn config_file(&self, _prefs: &Preferences) -> Result<PathBuf, AppError> {
        self.synchronize()?;
        let path = self.checkout_dir.join(&self.file);
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "configuration file {} does not exist after synchronization",
                path.display()
            )));
        }
        Ok(path)
    }

    fn relative_to_config_file(&self, relative: &str) -> Result<PathBuf, AppError> {
        let expected = self.checkout_dir.join(&self.file);
        let parent = expected.parent().ok_or_else(|| {
            AppError::configuration(format!(
                "configuration file {} has no parent directory",
                expected.display()
            ))
        })?;
        Ok(parent.join(relative))
    }
}
