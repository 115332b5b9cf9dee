use clap::Args;

#[derive(Args)]
pub struct SyncArgs {
    /// Echo every git invocation into the log
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct ReposArgs {
    /// Also list the branches of cloned repositories
    #[arg(long)]
    pub branches: bool,
}

#[derive(Args)]
pub struct EnvsArgs {
    /// Project whose environments to list
    #[arg(value_name = "PROJECT")]
    pub project: String,
}

#[derive(Args)]
pub struct ObsoleteArgs {
    /// Project whose repositories to scan
    #[arg(value_name = "PROJECT")]
    pub project: String,
}
