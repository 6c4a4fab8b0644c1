use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "strato")]
#[command(version)]
#[command(about = "Deploy and tear down digital-twin platform environments", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply every manifest found in a deploy directory
    Apply(ApplyArgs),

    /// Tear down deployed resources in reverse dependency order
    Destroy(DestroyArgs),

    /// Show the tracked deployment state
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Directory containing the resource manifests
    pub deploy_dir: String,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Only destroy these resource types (organization, solution, workspace, webapp)
    #[arg(long = "include", value_name = "TYPE")]
    pub include: Vec<String>,

    /// Destroy everything except these resource types
    #[arg(long = "exclude", value_name = "TYPE")]
    pub exclude: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
