use crate::cli::{BackfillArgs, CommonArgs};
use crate::error::{GfillError, Result};
use crate::git::{ensure_executable, CommandRunner, Git, GitRepo, ProcessRunner};
use crate::model::{CommitPlan, FabricatedCommit, RunSummary, WorkHours, TIMESTAMP_FORMAT};
use crate::plan::{resolve_range, strategy_from_args};
use crate::util::Zone;
use anyhow::Context;
use chrono::NaiveDate;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Attempts at drawing a wall-clock time that exists in the target zone.
const MAX_DRAWS: usize = 16;

pub const SEED_MESSAGE: &str = "chore: seed backfill history";

/// Draw a timestamp for commit `index` of `of` on `day`, inside `hours`.
pub fn fabricate_commit<R: Rng + ?Sized>(
    day: NaiveDate,
    index: u32,
    of: u32,
    hours: WorkHours,
    zone: &Zone,
    rng: &mut R,
) -> Result<FabricatedCommit> {
    for _ in 0..MAX_DRAWS {
        let hour = rng.gen_range(hours.start..=hours.end);
        let minute = rng.gen_range(0..=59);
        let second = rng.gen_range(0..=59);
        let Some(naive) = day.and_hms_opt(hour, minute, second) else {
            continue;
        };
        if let Some(timestamp) = zone.localize(naive) {
            return Ok(FabricatedCommit { date: day, index, of, timestamp });
        }
    }
    Err(GfillError::Config(format!(
        "No valid local time within {hours} on {day} in time zone {zone}."
    )))
}

/// Expand a plan into concrete commits, in date order.
pub fn fabricate_plan<R: Rng + ?Sized>(
    plan: &CommitPlan,
    hours: WorkHours,
    zone: &Zone,
    rng: &mut R,
) -> Result<Vec<FabricatedCommit>> {
    let mut commits = Vec::with_capacity(plan.total() as usize);
    for (day, count) in plan.iter() {
        for index in 1..=count {
            commits.push(fabricate_commit(day, index, count, hours, zone, rng)?);
        }
    }
    Ok(commits)
}

pub fn append_line(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Writes fabricated commits into the repository through `git`.
pub struct Backfill<'a> {
    git: &'a Git,
    file: PathBuf,
    zone: Zone,
    hours: WorkHours,
    quiet: bool,
}

impl<'a> Backfill<'a> {
    pub fn new(git: &'a Git, file: PathBuf, zone: Zone, hours: WorkHours) -> Self {
        Self {
            git,
            file,
            zone,
            hours,
            quiet: false,
        }
    }

    /// Suppress progress lines on stdout (used for JSON output).
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn say(&self, pb: Option<&ProgressBar>, line: String) {
        if self.quiet {
            return;
        }
        match pb {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    /// Switch to `target`, creating it when it does not exist yet.
    pub fn prepare_branch(
        &self,
        runner: &mut dyn CommandRunner,
        repo: &GitRepo,
        target: &str,
    ) -> Result<()> {
        let current = repo.current_branch()?;
        if current.as_deref() == Some(target) {
            debug!(branch = target, "already on target branch");
            return Ok(());
        }
        if repo.has_commits()? && repo.branch_exists(target)? {
            self.git.checkout(runner, target)
        } else {
            self.git.checkout_new(runner, target)
        }
    }

    /// First commit for a repository without history, stamped now.
    pub fn seed(&self, runner: &mut dyn CommandRunner, branch: &str) -> Result<()> {
        if runner.dry_run() {
            self.say(
                None,
                format!(
                    "[dry-run] Repository has no commits; \
                     would create seed commit on branch '{branch}'."
                ),
            );
            return Ok(());
        }
        append_line(&self.file, "seed\n")?;
        let timestamp = self.zone.now().format(TIMESTAMP_FORMAT).to_string();
        self.git.add(runner, &self.file)?;
        self.git.commit_at(runner, SEED_MESSAGE, &timestamp)?;
        self.say(None, format!("Created seed commit on branch '{branch}'."));
        Ok(())
    }

    /// Fabricate and commit every planned commit. Returns the number of commits
    /// made (or that would be made under dry-run).
    pub fn run<R: Rng + ?Sized>(
        &self,
        runner: &mut dyn CommandRunner,
        plan: &CommitPlan,
        rng: &mut R,
    ) -> Result<u64> {
        let commits = fabricate_plan(plan, self.hours, &self.zone, rng)?;
        let dry_run = runner.dry_run();

        let pb = if self.quiet || dry_run {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(commits.len() as u64)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut total = 0u64;
        for commit in &commits {
            if commit.index == 1 {
                self.say(Some(&pb), format!("{}: planned {} commit(s).", commit.date, commit.of));
                pb.set_message(commit.date.to_string());
            }
            let stamp = commit.timestamp_string();
            if dry_run {
                self.say(Some(&pb), format!("  [dry-run] {} at {}", commit.message(), stamp));
                total += 1;
                continue;
            }
            append_line(&self.file, &commit.log_line())?;
            self.git.add(runner, &self.file)?;
            self.git.commit_at(runner, &commit.message(), &stamp)?;
            self.say(
                Some(&pb),
                format!("  committed {}/{} at {}", commit.index, commit.of, style(&stamp).dim()),
            );
            pb.inc(1);
            total += 1;
        }
        pb.finish_and_clear();
        info!(total, "backfill finished");
        Ok(total)
    }
}

pub fn exec(common: CommonArgs, args: BackfillArgs) -> anyhow::Result<()> {
    let zone: Zone = common.timezone.parse()?;
    let hours: WorkHours = args.work_hours.parse()?;
    let strategy = strategy_from_args(&args.plan)?;
    let range = resolve_range(args.plan.start.as_deref(), args.plan.end.as_deref(), zone.today())
        .context("Failed to resolve date range")?;

    if !common.dry_run {
        ensure_executable(&common.git_bin)?;
    }
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let git = Git::new(&common.git_bin, &common.remote);
    let mut runner = ProcessRunner::new(repo.path(), common.dry_run).echo_to_stderr(args.json);

    let target = match (&args.branch, repo.current_branch()?) {
        (Some(branch), _) => branch.clone(),
        (None, Some(current)) => current,
        (None, None) => "main".to_string(),
    };
    if args.push {
        repo.ensure_remote(&common.remote)?;
    }

    let backfill = Backfill::new(&git, repo.path().join(&args.file), zone, hours).quiet(args.json);
    let has_commits = repo.has_commits()?;
    backfill
        .prepare_branch(&mut runner, &repo, &target)
        .with_context(|| format!("Failed to switch to branch '{target}'"))?;
    if !has_commits {
        backfill.seed(&mut runner, &target).context("Failed to create seed commit")?;
    }

    let plan = strategy.plan(&range, &mut rand::thread_rng())?;
    debug!(days = plan.len(), total = plan.total(), %strategy, "plan built");
    let total = backfill
        .run(&mut runner, &plan, &mut rand::thread_rng())
        .context("Failed to create backfill commits")?;

    if args.push {
        git.push(&mut runner, &target)
            .with_context(|| format!("Failed to push branch '{target}'"))?;
    }

    if args.json {
        let mut summary = RunSummary::new(common.dry_run);
        summary.commits = total;
        summary.branches.push(target);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if common.dry_run {
        println!("[dry-run] Planned total commits: {}", style(total).cyan());
    } else {
        println!(
            "Completed {} commit(s) from {} to {}.",
            style(total).cyan(),
            range.start,
            range.end
        );
    }
    if args.push && !common.dry_run {
        println!("Pushed branch '{target}' to {}.", common.remote);
    }
    Ok(())
}
