use gem::core::config::settings::Preferences;
use gem::core::git::GitRunner;
use gem::core::model::Configuration;
use gem::core::provider::LocalFileSource;
use gem::core::reconcile::find_obsolete_environments;
use std::path::Path;
use std::process::Command;
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

fn init_repo(path: &Path) {
    std::fs::create_dir_all(path).unwrap();
    git(path, &["init", "-b", "main"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    std::fs::write(path.join("README.md"), "test").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
}

/// Config file with two repositories and one environment whose internal
/// branch is `gem/billing/x`.
fn write_config(base: &Path) -> std::path::PathBuf {
    let file = base.join("gem.json");
    std::fs::write(
        &file,
        r#"
{
  "repositories": [
    { "id": "a", "url": "git@host:a.git", "path": "repos/a" },
    { "id": "b", "url": "git@host:b.git", "path": "repos/b" }
  ],
  "projects": [
    { "name": "billing", "branch_prefix": "billing",
      "environments": [
        { "name": "x", "branches": { "a": "main", "b": "main" } }
      ] }
  ]
}
"#,
    )
    .unwrap();
    file
}

fn load(base: &Path) -> Configuration {
    let file = write_config(base);
    let source = LocalFileSource::new(base.to_path_buf(), file);
    let runner = GitRunner::new(GitRunner::locate_binary().unwrap());
    Configuration::load(&source, &Preferences::default(), &runner).unwrap()
}

#[test]
fn end_to_end_scan_finds_stale_internal_branch() {
    let base = TempDir::new().unwrap();
    init_repo(&base.path().join("repos/a"));
    init_repo(&base.path().join("repos/b"));
    git(&base.path().join("repos/a"), &["branch", "gem/billing/x"]);
    git(&base.path().join("repos/b"), &["branch", "gem/billing/x"]);
    git(&base.path().join("repos/b"), &["branch", "gem/billing/y"]);

    let configuration = load(base.path());
    let project = configuration.project("billing").unwrap();

    let obsolete = find_obsolete_environments(project).unwrap();
    assert_eq!(obsolete.len(), 1);
    assert_eq!(obsolete[0].display_name(), "y");
    assert_eq!(obsolete[0].internal_branch_name(), "gem/billing/y");
    let observed: Vec<&str> = obsolete[0].repositories().iter().map(|r| r.id()).collect();
    assert_eq!(observed, vec!["b"]);

    // Obsolete environments are read-only discoveries.
    assert!(obsolete[0].branch_map().is_err());
}

#[test]
fn rescan_after_refresh_sees_deleted_branch() {
    let base = TempDir::new().unwrap();
    init_repo(&base.path().join("repos/a"));
    init_repo(&base.path().join("repos/b"));
    git(&base.path().join("repos/b"), &["branch", "gem/billing/y"]);

    let configuration = load(base.path());
    let project = configuration.project("billing").unwrap();

    let first = find_obsolete_environments(project).unwrap();
    assert_eq!(first.len(), 1);

    git(&base.path().join("repos/b"), &["branch", "-D", "gem/billing/y"]);

    // Branch lists are cached; without a refresh the stale entry persists.
    let cached = find_obsolete_environments(project).unwrap();
    assert_eq!(cached.len(), 1);

    for repository in project.repositories().unwrap() {
        repository.refresh();
    }
    let rescanned = find_obsolete_environments(project).unwrap();
    assert!(rescanned.is_empty());
}

#[test]
fn environment_worktrees_span_configured_repositories() {
    let base = TempDir::new().unwrap();
    init_repo(&base.path().join("repos/a"));
    init_repo(&base.path().join("repos/b"));

    let configuration = load(base.path());
    let project = configuration.project("billing").unwrap();
    let environment = project.environment("x").unwrap().unwrap();

    let worktrees = environment.worktrees(&base.path().join("worktrees"));
    assert_eq!(worktrees.len(), 2);
    for worktree in &worktrees {
        assert_eq!(worktree.branch(), "gem/billing/x");
        assert!(!worktree.is_added());
        assert!(worktree
            .location()
            .starts_with(base.path().join("worktrees").join("x")));
    }
}
