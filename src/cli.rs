use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::model::MergeMethod;

#[derive(Parser)]
#[command(name = "gfill")]
#[command(about = "Backfill dated commits and automate pull requests and issues")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, global = true, help = "Print commands instead of running them")]
    pub dry_run: bool,

    #[arg(
        long = "git",
        global = true,
        env = "GFILL_GIT",
        default_value = "git",
        help = "git executable"
    )]
    pub git_bin: String,

    #[arg(
        long = "gh",
        global = true,
        env = "GFILL_GH",
        default_value = "gh",
        help = "GitHub CLI executable"
    )]
    pub gh_bin: String,

    #[arg(long, global = true, default_value = "origin", help = "Remote to push to and pull from")]
    pub remote: String,

    #[arg(
        long,
        global = true,
        env = "GFILL_TZ",
        default_value = "local",
        help = "Time zone: local, UTC, or a fixed offset such as +09:00"
    )]
    pub timezone: String,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity"
    )]
    pub verbose: u8,
}

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    #[arg(long, help = "Start date YYYY-MM-DD (inclusive)")]
    pub start: Option<String>,

    #[arg(long, help = "End date YYYY-MM-DD (inclusive, before today)")]
    pub end: Option<String>,

    #[arg(long, default_value_t = 1, help = "Minimum commits per day (inclusive)")]
    pub per_day_min: u32,

    #[arg(long, default_value_t = 2, help = "Maximum commits per day (inclusive)")]
    pub per_day_max: u32,

    #[arg(long, help = "Pick this many random days with one commit each instead")]
    pub sample_size: Option<usize>,

    #[arg(long, default_value_t = 0, help = "Seed for --sample-size day selection")]
    pub seed: u64,
}

#[derive(Args, Clone, Debug)]
pub struct BackfillArgs {
    #[clap(flatten)]
    pub plan: PlanArgs,

    #[arg(long, default_value = "10-19", help = "Working hour window H0-H1 (0-23)")]
    pub work_hours: String,

    #[arg(long, default_value = "keep.log", help = "File to append to for each commit")]
    pub file: PathBuf,

    #[arg(long, help = "Target branch name")]
    pub branch: Option<String>,

    #[arg(long, help = "Push the branch after committing")]
    pub push: bool,

    #[arg(long, help = "Print a JSON summary")]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ActivityArgs {
    #[arg(long, help = "Create an issue")]
    pub create_issue: bool,

    #[arg(long, help = "Create a pull request with one generated commit")]
    pub create_pr: bool,

    #[arg(long)]
    pub issue_title: Option<String>,

    #[arg(long)]
    pub issue_body: Option<String>,

    #[arg(long, default_value = "keep.log", help = "File to touch for the pull request commit")]
    pub file: PathBuf,

    #[arg(long, help = "Feature branch name [default: activity/<timestamp>]")]
    pub branch: Option<String>,

    #[arg(long, default_value = "main", help = "Base branch for the pull request")]
    pub base: String,

    #[arg(long)]
    pub commit_message: Option<String>,

    #[arg(long)]
    pub pr_title: Option<String>,

    #[arg(long)]
    pub pr_body: Option<String>,

    #[arg(long, help = "Skip pushing the branch and opening the pull request")]
    pub no_push: bool,

    #[arg(long, help = "Print a JSON summary")]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct AutomateArgs {
    #[arg(long, help = "Comma-separated years to backfill [default: the last three years]")]
    pub years: Option<String>,

    #[arg(long, default_value_t = 100, help = "Days per year to backfill")]
    pub sample_size: usize,

    #[arg(long, help = "How many years from --years to process (0 to skip) [default: all]")]
    pub backfill_count: Option<usize>,

    #[arg(long, help = "Number of snippet pull requests to create [default: all]")]
    pub snippet_count: Option<usize>,

    #[arg(long, help = "Number of issues to create [default: all]")]
    pub issue_count: Option<usize>,

    #[arg(long, help = "Proceed even if the working tree is not clean")]
    pub allow_dirty: bool,

    #[arg(long, default_value = "main", help = "Base branch for pull requests")]
    pub base: String,

    #[arg(long, default_value = "keep.log", help = "File appended to by backfill commits")]
    pub file: PathBuf,

    #[arg(long, default_value = "10-19", help = "Working hour window H0-H1 (0-23)")]
    pub work_hours: String,

    #[arg(
        long,
        value_enum,
        default_value_t = MergeMethod::Merge,
        help = "Merge method for backfill pull requests"
    )]
    pub backfill_merge: MergeMethod,

    #[arg(
        long,
        value_enum,
        default_value_t = MergeMethod::Squash,
        help = "Merge method for snippet pull requests"
    )]
    pub snippet_merge: MergeMethod,

    #[arg(long, help = "Print a JSON summary")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the per-day commit plan without touching the repository
    Plan {
        #[clap(flatten)]
        plan: PlanArgs,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Create commits dated across a range of past days
    Backfill(BackfillArgs),
    /// Open a single issue and/or pull request
    Activity(ActivityArgs),
    /// Backfill years, ship snippet pull requests and file template issues
    Automate(AutomateArgs),
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Plan { plan, json } => crate::plan::exec(self.common, plan, json),
            Commands::Backfill(args) => crate::backfill::exec(self.common, args),
            Commands::Activity(args) => crate::activity::exec(self.common, args),
            Commands::Automate(args) => crate::automate::exec(self.common, args),
        }
    }
}
