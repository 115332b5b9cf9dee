use crate::cli::args::{EnvsArgs, ObsoleteArgs, ReposArgs, SyncArgs};
use crate::core::command::{Command, TracingSink};
use crate::core::config::settings::{Preferences, Settings};
use crate::core::error::AppError;
use crate::core::git::GitRunner;
use crate::core::model::Configuration;
use crate::core::provider::{select_source, ConfigSource};
use crate::core::reconcile::find_obsolete_environments;
use crate::Result;
use anyhow::{anyhow, bail};
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Everything a subcommand needs, resolved from the operating environment.
pub struct CliContext {
    pub settings: Settings,
    pub prefs: Preferences,
    pub runner: GitRunner,
    pub source: Arc<dyn ConfigSource>,
}

pub fn build_context(verbose: bool) -> Result<CliContext> {
    let home = Settings::resolve_home()?;
    let prefs = Preferences::load_from(&home.join("preferences.toml"))?;
    let settings = Settings::from_env(&prefs)?;
    let mut runner = GitRunner::from_environment(&prefs)?;
    if verbose {
        runner.add_output_sink(TracingSink::new("git"));
    }
    let source = select_source(&settings, runner.clone())?;
    Ok(CliContext { settings, prefs, runner, source })
}

/// Synchronize the configuration checkout and print the config file path.
/// Runs as a command so the sync shows up with engine semantics: one result,
/// uniform failure message, no concurrent re-run.
pub async fn sync(args: &SyncArgs) -> Result<()> {
    let ctx = build_context(args.verbose)?;

    let source = Arc::clone(&ctx.source);
    let prefs = ctx.prefs.clone();
    let resolved: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&resolved);

    let command = Command::from_fn(
        "configuration",
        "synchronize configuration checkout",
        move |_ctx| {
            let source = Arc::clone(&source);
            let prefs = prefs.clone();
            let slot = Arc::clone(&slot);
            async move {
                let path = tokio::task::spawn_blocking(move || source.config_file(&prefs))
                    .await
                    .map_err(AppError::completion)??;
                *slot.lock().expect("path slot poisoned") = Some(path);
                Ok(())
            }
            .boxed()
        },
    );

    let result = command.execute()?.result().await;
    if result.failed() {
        bail!(
            "{}",
            result
                .error_message()
                .unwrap_or("configuration sync failed")
        );
    }

    let path = resolved
        .lock()
        .expect("path slot poisoned")
        .take()
        .ok_or_else(|| anyhow!("sync finished without a configuration file path"))?;
    println!("{}", path.display());
    Ok(())
}

pub fn repos(args: &ReposArgs) -> Result<()> {
    let ctx = build_context(false)?;
    let configuration = Configuration::load(ctx.source.as_ref(), &ctx.prefs, &ctx.runner)?;

    for repository in configuration.repositories() {
        let state = if repository.is_cloned() { "cloned" } else { "not cloned" };
        println!(
            "{:<20} {:<12} {}",
            repository.id(),
            state,
            repository.local_path().display()
        );
        if args.branches && repository.is_cloned() {
            for branch in repository.branches()? {
                println!("    {}", branch);
            }
        }
    }
    Ok(())
}

pub fn envs(args: &EnvsArgs) -> Result<()> {
    let ctx = build_context(false)?;
    let configuration = Configuration::load(ctx.source.as_ref(), &ctx.prefs, &ctx.runner)?;
    let project = configuration
        .project(&args.project)
        .ok_or_else(|| anyhow!("unknown project '{}'", args.project))?;

    for environment in project.environments()? {
        println!(
            "{:<16} {:<24} {}",
            environment.name(),
            environment.display_name(),
            environment.internal_branch_name()
        );
    }
    Ok(())
}

pub fn obsolete(args: &ObsoleteArgs) -> Result<()> {
    let ctx = build_context(false)?;
    let configuration = Configuration::load(ctx.source.as_ref(), &ctx.prefs, &ctx.runner)?;
    let project = configuration
        .project(&args.project)
        .ok_or_else(|| anyhow!("unknown project '{}'", args.project))?;

    let obsolete = find_obsolete_environments(project)?;
    if obsolete.is_empty() {
        println!("no obsolete environments");
        return Ok(());
    }
    for environment in obsolete {
        let observed: Vec<&str> = environment.repositories().iter().map(|r| r.id()).collect();
        println!(
            "{:<24} {:<32} {}",
            environment.display_name(),
            environment.internal_branch_name(),
            observed.join(", ")
        );
    }
    Ok(())
}
