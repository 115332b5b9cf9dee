use gem::core::command::BufferSink;
use gem::core::config::settings::{ConfigSourceKind, Preferences, Settings};
use gem::core::error::AppError;
use gem::core::git::GitRunner;
use gem::core::provider::{ConfigSource, GitConfigSource, SyncHook};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// A configuration origin on branch `main` carrying `gem.json`.
fn init_origin(path: &Path) {
    git(path, &["init", "-b", "main"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    std::fs::write(path.join("gem.json"), "{\n\n}").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "configuration"]);
}

fn settings_for(home: &Path, url: &str) -> Settings {
    Settings {
        home: home.to_path_buf(),
        source: ConfigSourceKind::Git,
        git_url: Some(url.to_string()),
        git_branch: Some("main".to_string()),
        git_file: Some("gem.json".to_string()),
        local_file: None,
    }
}

/// Source whose runner echoes every git invocation into the returned buffer.
fn counted_source(settings: &Settings) -> (GitConfigSource, Arc<BufferSink>) {
    let buffer = BufferSink::new();
    let mut runner = GitRunner::new(GitRunner::locate_binary().unwrap());
    runner.add_output_sink(buffer.clone());
    let source = GitConfigSource::from_settings(settings, runner).unwrap();
    (source, buffer)
}

#[test]
fn fresh_path_issues_one_clone_and_zero_pulls() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();

    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, buffer) = counted_source(&settings);

    let config_file = source.config_file(&Preferences::default()).unwrap();
    assert_eq!(config_file, home.path().join("config/gem.json"));
    assert!(config_file.exists());

    assert_eq!(buffer.count_containing("git clone"), 1);
    assert_eq!(buffer.count_containing("git pull"), 0);
}

#[test]
fn existing_clone_issues_zero_checkouts_and_one_pull() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();
    let url = origin.path().to_string_lossy().to_string();

    let settings = settings_for(home.path(), &url);
    let (first, _) = counted_source(&settings);
    first.config_file(&Preferences::default()).unwrap();

    // Fresh source and buffer over the existing clone.
    let (second, buffer) = counted_source(&settings);
    second.config_file(&Preferences::default()).unwrap();

    assert_eq!(buffer.count_containing("git clone"), 0);
    assert_eq!(buffer.count_containing("git checkout"), 0);
    assert_eq!(buffer.count_containing("git pull origin main"), 1);
}

#[test]
fn remote_mismatch_is_fatal_and_never_pulls_or_checks_out() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();

    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, _) = counted_source(&settings);
    source.config_file(&Preferences::default()).unwrap();

    let mismatched = settings_for(home.path(), "git@elsewhere:config.git");
    let (source, buffer) = counted_source(&mismatched);

    let err = source.config_file(&Preferences::default()).unwrap_err();
    assert!(err.message.contains("points at"), "{}", err.message);
    assert_eq!(buffer.count_containing("git pull"), 0);
    assert_eq!(buffer.count_containing("git checkout"), 0);
}

#[test]
fn different_branch_is_fatal_with_default_hook() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();

    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, _) = counted_source(&settings);
    source.config_file(&Preferences::default()).unwrap();

    git(&home.path().join("config"), &["checkout", "-b", "other"]);

    let (source, _) = counted_source(&settings);
    let err = source.config_file(&Preferences::default()).unwrap_err();
    assert!(err.message.contains("'other'"), "{}", err.message);
    assert!(err.message.contains("'main'"), "{}", err.message);
}

struct DecidingHook {
    checkout: bool,
}

impl SyncHook for DecidingHook {
    fn checkout_when_different_branch(&self, _configured: &str, _current: &str) -> Result<bool, AppError> {
        Ok(self.checkout)
    }
}

#[test]
fn different_branch_hook_true_checks_out_configured_branch() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();

    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, _) = counted_source(&settings);
    source.config_file(&Preferences::default()).unwrap();

    let checkout_dir = home.path().join("config");
    git(&checkout_dir, &["checkout", "-b", "other"]);

    let (source, buffer) = counted_source(&settings);
    let source = source.with_hook(Box::new(DecidingHook { checkout: true }));
    source.config_file(&Preferences::default()).unwrap();

    assert_eq!(buffer.count_containing("git checkout main"), 1);
    let runner = GitRunner::new(GitRunner::locate_binary().unwrap());
    assert_eq!(runner.current_branch(&checkout_dir).unwrap(), "main");
}

#[test]
fn different_branch_hook_false_proceeds_on_current_branch() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();

    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, _) = counted_source(&settings);
    source.config_file(&Preferences::default()).unwrap();

    let checkout_dir = home.path().join("config");
    git(&checkout_dir, &["checkout", "-b", "other"]);

    let (source, buffer) = counted_source(&settings);
    let source = source.with_hook(Box::new(DecidingHook { checkout: false }));
    source.config_file(&Preferences::default()).unwrap();

    assert_eq!(buffer.count_containing("git checkout"), 0);
    // The configured branch is still the one pulled.
    assert_eq!(buffer.count_containing("git pull origin main"), 1);
    let runner = GitRunner::new(GitRunner::locate_binary().unwrap());
    assert_eq!(runner.current_branch(&checkout_dir).unwrap(), "other");
}

struct IgnorePullFailure;

impl SyncHook for IgnorePullFailure {
    fn proceed_if_pull_fails(&self, _configured: &str) -> bool {
        true
    }
}

#[test]
fn pull_failure_is_fatal_with_default_hook() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();
    let url = origin.path().to_string_lossy().to_string();

    let settings = settings_for(home.path(), &url);
    let (source, _) = counted_source(&settings);
    source.config_file(&Preferences::default()).unwrap();

    // Losing the origin makes every subsequent pull fail.
    drop(origin);

    let (source, _) = counted_source(&settings);
    let err = source.config_file(&Preferences::default()).unwrap_err();
    assert!(err.message.contains("failed to pull"), "{}", err.message);
}

#[test]
fn pull_failure_hook_proceeds_and_records_warning() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();
    let url = origin.path().to_string_lossy().to_string();

    let settings = settings_for(home.path(), &url);
    let (source, _) = counted_source(&settings);
    source.config_file(&Preferences::default()).unwrap();

    drop(origin);

    let (source, _) = counted_source(&settings);
    let source = source.with_hook(Box::new(IgnorePullFailure));
    let config_file = source.config_file(&Preferences::default()).unwrap();
    assert!(config_file.exists());

    // No merge was in progress, so the best-effort abort failed and the
    // degraded state is surfaced as a warning.
    let warning = source.last_sync_warning().expect("warning recorded");
    assert!(warning.contains("merge --abort"), "{}", warning);
}

#[test]
fn missing_config_file_after_sync_is_fatal() {
    let origin = TempDir::new().unwrap();
    git(origin.path(), &["init", "-b", "main"]);
    git(origin.path(), &["config", "user.email", "test@test.com"]);
    git(origin.path(), &["config", "user.name", "Test User"]);
    std::fs::write(origin.path().join("other.txt"), "not the config").unwrap();
    git(origin.path(), &["add", "."]);
    git(origin.path(), &["commit", "-m", "no config here"]);

    let home = TempDir::new().unwrap();
    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, _) = counted_source(&settings);

    let err = source.config_file(&Preferences::default()).unwrap_err();
    assert!(
        err.message.contains("does not exist after synchronization"),
        "{}",
        err.message
    );
}

#[test]
fn relative_path_resolves_before_and_after_sync() {
    let origin = TempDir::new().unwrap();
    init_origin(origin.path());
    let home = TempDir::new().unwrap();

    let settings = settings_for(home.path(), &origin.path().to_string_lossy());
    let (source, _) = counted_source(&settings);

    let expected = home.path().join("config").join("x/y");
    assert_eq!(source.relative_to_config_file("x/y").unwrap(), expected);

    source.config_file(&Preferences::default()).unwrap();
    assert_eq!(source.relative_to_config_file("x/y").unwrap(), expected);
}

#[test]
fn pref_file_lives_under_home() {
    let home = TempDir::new().unwrap();
    let settings = settings_for(home.path(), "git@host:config.git");
    let (source, _) = counted_source(&settings);
    assert_eq!(source.pref_file(), home.path().join("preferences.toml"));
}
