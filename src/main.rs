use clap::Parser;
use gem::cli::{commands, Args, Command};
use gem::logging::{self, LoggingConfig};

#[tokio::main]
async fn main() -> gem::Result<()> {
    let args = Args::parse();
    let _logging = logging::init(&LoggingConfig::from_env())?;

    match &args.command {
        Command::Sync(sync_args) => commands::sync(sync_args).await,
        Command::Repos(repos_args) => commands::repos(repos_args),
        Command::Envs(envs_args) => commands::envs(envs_args),
        Command::Obsolete(obsolete_args) => commands::obsolete(obsolete_args),
    }
}
