#![allow(clippy::result_large_err)] // Git operations bubble AppError for command failures so extra boxing is unnecessary.

use crate::core::command::{OutputSink, StreamKind};
use crate::core::config::settings::Preferences;
use crate::core::error::AppError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Synchronous runner for git invocations.
///
/// Every invocation is echoed to the registered sinks, stdout is captured and
/// returned trimmed, stderr is captured into the sinks and into the failure
/// message. Any non-zero exit code is a failure.
#[derive(Clone)]
pub struct GitRunner {
    binary: PathBuf,
    sinks: Vec<Arc<dyn OutputSink>>,
}

impl GitRunner {
    pub fn new(binary: PathBuf) -> Self {
        GitRunner { binary, sinks: Vec::new() }
    }

    /// Resolve the git binary: preference override first, then the
    /// `GEM_GIT_BINARY` variable, then a `PATH` search (which also covers the
    /// `.exe`/`.cmd`/`.bat` suffixes on Windows).
    pub fn from_environment(prefs: &Preferences) -> Result<Self, AppError> {
        if let Some(binary) = &prefs.git_binary {
            return Ok(GitRunner::new(binary.clone()));
        }
        if let Ok(binary) = std::env::var("GEM_GIT_BINARY") {
            return Ok(GitRunner::new(PathBuf::from(binary)));
        }
        Ok(GitRunner::new(Self::locate_binary()?))
    }

    pub fn locate_binary() -> Result<PathBuf, AppError> {
        which::which("git")
            .map_err(|e| AppError::process(format!("git executable not found on PATH: {}", e)))
    }

    /// Whether `path` carries git metadata (a `.git` directory, or the `.git`
    /// file a linked worktree uses).
    pub fn is_repository(path: &Path) -> bool {
        path.join(".git").exists()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn add_output_sink(&mut self, sink: Arc<dyn OutputSink>) {
        self.sinks.push(sink);
    }

    /// Run `git <args...>` in `work_dir`. Returns trimmed stdout on success;
    /// on non-zero exit the captured stderr becomes the error message.
    pub fn run(&self, work_dir: &Path, args: &[&str]) -> Result<String, AppError> {
        self.emit(StreamKind::Stdout, &format!("git {}", args.join(" ")));

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(work_dir)
            .output()
            .map_err(|e| {
                AppError::process(format!(
                    "failed to launch {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        for line in stdout.lines() {
            self.emit(StreamKind::Stdout, line);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        for line in stderr.lines() {
            self.emit(StreamKind::Stderr, line);
        }

        if !output.status.success() {
            return Err(AppError::process(stderr.trim().to_string()));
        }

        Ok(stdout.trim().to_string())
    }

    pub fn clone_branch(&self, url: &str, branch: &str, target: &Path) -> Result<String, AppError> {
        let parent = target
            .parent()
            .ok_or_else(|| AppError::validation(format!("clone target {} has no parent", target.display())))?;
        std::fs::create_dir_all(parent)?;
        let target_str = target.to_string_lossy();
        self.run(parent, &["clone", "-b", branch, url, &target_str])
    }

    pub fn pull_origin(&self, work_dir: &Path, branch: &str) -> Result<String, AppError> {
        self.run(work_dir, &["pull", "origin", branch])
    }

    pub fn checkout(&self, work_dir: &Path, branch: &str) -> Result<String, AppError> {
        self.run(work_dir, &["checkout", branch])
    }

    pub fn current_branch(&self, work_dir: &Path) -> Result<String, AppError> {
        self.run(work_dir, &["branch", "--show-current"])
    }

    pub fn remote_origin_url(&self, work_dir: &Path) -> Result<String, AppError> {
        self.run(work_dir, &["config", "--get", "remote.origin.url"])
    }

    pub fn merge_abort(&self, work_dir: &Path) -> Result<String, AppError> {
        self.run(work_dir, &["merge", "--abort"])
    }

    /// Names of all local branches.
    pub fn local_branches(&self, work_dir: &Path) -> Result<Vec<String>, AppError> {
        let listing = self.run(work_dir, &["branch", "--format=%(refname:short)"])?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn emit(&self, kind: StreamKind, line: &str) {
        for sink in &self.sinks {
            sink.line(kind, line);
        }
    }
}

impl std::fmt::Debug for GitRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRunner").field("binary", &self.binary).finish()
    }
}
