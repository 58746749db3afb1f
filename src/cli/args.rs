// src/cli/args.rs
use clap::Parser;

/// Shared argument set for the project verbs (`build`, `test`).
#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)] // Verbs receive pre-split argv without the program name.
pub struct ProjectArgs {
    /// The defect worktree to operate on. Defaults to the current directory.
    pub path: Option<String>,

    /// Run the coverage variant of the command.
    #[arg(long)]
    pub coverage: bool,

    /// Stream container output live instead of buffering it until completion.
    #[arg(long, short)]
    pub verbose: bool,
}
