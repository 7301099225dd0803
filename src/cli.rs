// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `ot`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ot",
    version,
    about = "Run workflows with DAG dependencies, branch filters and git worktree awareness.",
    long_about = None
)]
pub struct CliArgs {
    /// Workflow to run.
    pub job: Option<String>,

    /// Workflow to run (alternative to the positional form).
    #[arg(long = "job", value_name = "NAME", conflicts_with = "job")]
    pub job_opt: Option<String>,

    /// Path to the config file (JSON or JSONC).
    ///
    /// When omitted, the config is discovered by walking from the current
    /// directory up to the git root.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<String>,

    /// Echo captured step output while the run is in progress.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Stop scheduling new steps after the first failure.
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub fail_fast: bool,

    /// Print the resolved step DAG for the job without executing anything.
    #[arg(long)]
    pub graph: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<OtCommand>,
}

impl CliArgs {
    /// The requested job name from either the positional or `--job` form.
    pub fn job_name(&self) -> Option<&str> {
        self.job_opt.as_deref().or(self.job.as_deref())
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum OtCommand {
    /// Print the JSON schema of the config file.
    Schema,

    /// Manage git worktrees.
    Wt {
        #[command(subcommand)]
        action: WtCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum WtCommand {
    /// Create a worktree for a branch under the configured base directory.
    Add {
        /// Branch to check out in the new worktree.
        branch: String,

        /// Create the branch as part of the worktree add.
        #[arg(short = 'b')]
        new_branch: bool,

        /// Base ref for a newly created branch.
        #[arg(long, value_name = "REF")]
        base: Option<String>,

        /// Overwrite an existing worktree path.
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Remove the worktree for a branch.
    #[command(alias = "rm")]
    Remove {
        /// Branch whose worktree should be removed.
        branch: String,

        /// Force removal even with local modifications.
        #[arg(short = 'f', long)]
        force: bool,

        /// Also delete the branch after removing the worktree.
        #[arg(long)]
        with_branch: bool,
    },

    /// List worktrees with their branch and short HEAD.
    #[command(alias = "ls")]
    List,

    /// Copy files between worktrees ([BRANCH@]PATH arguments).
    Cp {
        /// Source, optionally prefixed with `BRANCH@`.
        src: String,

        /// Destination, optionally prefixed with `BRANCH@`.
        dest: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
