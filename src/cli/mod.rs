pub mod args;
pub mod commands;

pub use args::{EnvsArgs, ObsoleteArgs, ReposArgs, SyncArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "gem")]
#[command(version = crate::VERSION)]
#[command(about = "Git environment manager for multi-repository workflows")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: sync the configuration checkout, inspect repositories and environments, then scan for obsolete environment branches."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Synchronize the configuration checkout",
        long_about = "Sync guarantees a local checkout of the configuration repository exists, points at the configured remote and branch, and is up to date, then prints the configuration file path.",
        after_help = "Example:\n    gem sync --verbose"
    )]
    Sync(SyncArgs),
    #[command(
        about = "List managed repositories and their clone state",
        after_help = "Example:\n    gem repos --branches"
    )]
    Repos(ReposArgs),
    #[command(
        about = "List environments of a project",
        long_about = "Envs lists the configured environments of one project with their display names and internal branch names.",
        after_help = "Example:\n    gem envs billing"
    )]
    Envs(EnvsArgs),
    #[command(
        about = "Find obsolete environment branches",
        long_about = "Obsolete scans every cloned repository the project references for internal branches that no longer correspond to a configured environment.",
        after_help = "Example:\n    gem obsolete billing"
    )]
    Obsolete(ObsoleteArgs),
}
