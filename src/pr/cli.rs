use clap::{Args, Subcommand, ValueEnum};

#[derive(Debug, Subcommand)]
pub enum PrCommand {
    /// List pull requests where you are creator or reviewer
    List(ListArgs),
    /// Show the review comment threads of a pull request
    Threads(ThreadsArgs),
    /// Open a pull request in the browser
    Open(OpenArgs),
}

/// Which relationship to the caller to list PRs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Creator,
    Reviewer,
    All,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// List PRs you created, PRs assigned to you, or both
    #[arg(short, long, value_enum, default_value_t = Role::All)]
    pub role: Role,

    /// PR status filter (active, completed, abandoned, all)
    #[arg(short, long, default_value = "active")]
    pub status: String,

    /// Maximum number of PRs fetched per role
    #[arg(short = 'n', long, default_value_t = 50)]
    pub limit: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ThreadsArgs {
    /// Pull request ID
    pub id: u64,

    /// Include system activity and resolved threads
    #[arg(short, long)]
    pub all: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Pull request ID
    pub id: u64,
}
