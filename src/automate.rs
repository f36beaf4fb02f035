//! Multi-step automation: sampled backfill per year, snippet pull requests and
//! template issues.
//!
//! Each unit of work walks the same path:
//! CLEAN-CHECK → PLAN → FABRICATE-COMMITS | WRITE-SNIPPET → PUSH → OPEN-REQUEST
//! → MERGE → DONE.
//! The first failing command aborts the whole run; nothing is rolled back.

use crate::activity::{ensure_clean, print_summary};
use crate::backfill::Backfill;
use crate::cli::{AutomateArgs, CommonArgs};
use crate::error::{GfillError, Result};
use crate::git::{ensure_executable, CommandRunner, Git, GitRepo, ProcessRunner};
use crate::hosting::GitHubCli;
use crate::model::{
    CommitPlan, DateRange, IssueTemplate, MergeMethod, RunSummary, Snippet, WorkHours,
};
use crate::plan::{year_range, PlanStrategy};
use crate::templates::{ISSUES, SNIPPETS};
use crate::util::Zone;
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CleanCheck,
    Plan,
    FabricateCommits,
    WriteSnippet,
    Push,
    OpenRequest,
    Merge,
    Done,
}

/// Years from a comma-separated list, or the three years before `today`.
pub fn parse_years(spec: Option<&str>, today: NaiveDate) -> Result<Vec<i32>> {
    let Some(spec) = spec else {
        let current = today.year();
        return Ok(vec![current - 3, current - 2, current - 1]);
    };
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| GfillError::Config(format!("Invalid year '{part}' in --years.")))
        })
        .collect()
}

fn pick_count(requested: Option<usize>, available: usize, flag: &str, what: &str) -> Result<usize> {
    match requested {
        None => Ok(available),
        Some(n) if n > available => Err(GfillError::Config(format!(
            "{flag} ({n}) exceeds {what} ({available})."
        ))),
        Some(n) => Ok(n),
    }
}

/// One year of sampled backfill, planned before anything is touched.
#[derive(Debug, Clone)]
pub struct YearPlan {
    pub year: i32,
    pub range: DateRange,
    pub plan: CommitPlan,
}

impl YearPlan {
    pub fn build(year: i32, sample_size: usize, today: NaiveDate) -> Result<Self> {
        let range = year_range(year, today)?;
        let strategy = PlanStrategy::sampled(sample_size, year as u64)?;
        let plan = strategy.plan(&range, &mut rand::thread_rng())?;
        Ok(Self { year, range, plan })
    }

    pub fn branch(&self) -> String {
        format!("backfill/{}-activity", self.year)
    }

    pub fn pr_title(&self) -> String {
        format!("Backfill {} activity", self.year)
    }

    pub fn pr_body(&self, file: &Path) -> String {
        format!(
            "Backfills {} entries for {} random days of {}.",
            file.display(),
            self.plan.active_days(),
            self.year
        )
    }
}

/// Shared state for one automation run.
pub struct Automation<'a> {
    runner: &'a mut dyn CommandRunner,
    git: &'a Git,
    gh: &'a GitHubCli,
    root: PathBuf,
    base: String,
    summary: RunSummary,
}

impl<'a> Automation<'a> {
    pub fn new(
        runner: &'a mut dyn CommandRunner,
        git: &'a Git,
        gh: &'a GitHubCli,
        root: &Path,
        base: &str,
    ) -> Self {
        let summary = RunSummary::new(runner.dry_run());
        Self {
            runner,
            git,
            gh,
            root: root.to_path_buf(),
            base: base.to_string(),
            summary,
        }
    }

    fn enter(&self, stage: Stage, unit: &str) {
        debug!(?stage, unit, "automation stage");
    }

    pub fn clean_check(&mut self, allow_dirty: bool) -> Result<()> {
        self.enter(Stage::CleanCheck, "repository");
        match ensure_clean(self.git, self.runner) {
            Err(GfillError::Precondition(_)) if allow_dirty => {
                info!("working tree not clean; continuing because of --allow-dirty");
                Ok(())
            }
            Err(GfillError::Precondition(_)) => Err(GfillError::Precondition(
                "Working tree not clean. Commit/stash changes or pass --allow-dirty.".to_string(),
            )),
            other => other,
        }
    }

    /// Commit a year's plan on its own branch, then open and merge a pull request.
    pub fn backfill_year(
        &mut self,
        year: &YearPlan,
        backfill: &Backfill<'_>,
        method: MergeMethod,
    ) -> Result<()> {
        let branch = year.branch();
        self.enter(Stage::FabricateCommits, &branch);
        self.git.checkout(self.runner, &self.base)?;
        self.git.checkout_reset(self.runner, &branch)?;
        let commits = backfill.run(self.runner, &year.plan, &mut rand::thread_rng())?;
        self.summary.commits += commits;

        let file = backfill.file().strip_prefix(&self.root).unwrap_or(backfill.file());
        self.ship(&branch, &year.pr_title(), &year.pr_body(file), method)
    }

    /// Write one snippet on its branch and merge it through a pull request.
    pub fn apply_snippet(&mut self, snippet: &Snippet, method: MergeMethod) -> Result<()> {
        self.enter(Stage::WriteSnippet, snippet.branch);
        self.git.checkout(self.runner, &self.base)?;
        self.git.checkout_new(self.runner, snippet.branch)?;
        let path = self.root.join(snippet.path());
        if self.runner.dry_run() {
            eprintln!("[dry-run] would write {}", path.display());
        } else {
            write_snippet(&path, snippet)?;
        }
        self.git.add(self.runner, &path)?;
        self.git.commit(self.runner, snippet.commit_message)?;
        self.summary.commits += 1;

        self.ship(snippet.branch, snippet.pr_title, snippet.pr_body, method)
    }

    pub fn create_issue(&mut self, issue: &IssueTemplate) -> Result<()> {
        self.enter(Stage::OpenRequest, issue.title);
        let url = self.gh.create_issue(self.runner, issue.title, issue.body)?;
        if !url.is_empty() {
            self.summary.issues.push(url);
        }
        Ok(())
    }

    fn ship(&mut self, branch: &str, title: &str, body: &str, method: MergeMethod) -> Result<()> {
        self.enter(Stage::Push, branch);
        self.git.push(self.runner, branch)?;

        self.enter(Stage::OpenRequest, branch);
        let pr = self.gh.create_pr(self.runner, title, body, &self.base, branch)?;

        self.enter(Stage::Merge, branch);
        self.gh.finalize_pr(self.runner, self.git, &pr, &self.base, method)?;

        self.summary.branches.push(branch.to_string());
        if let Some(url) = pr.url() {
            self.summary.pull_requests.push(url.to_string());
        }
        self.enter(Stage::Done, branch);
        Ok(())
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

pub fn write_snippet(path: &Path, snippet: &Snippet) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, snippet.content)?;
    #[cfg(unix)]
    if snippet.executable {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

pub fn exec(common: CommonArgs, args: AutomateArgs) -> anyhow::Result<()> {
    let zone: Zone = common.timezone.parse()?;
    let hours: WorkHours = args.work_hours.parse()?;
    let today = zone.today();

    let years = parse_years(args.years.as_deref(), today)?;
    let backfill_count = pick_count(
        args.backfill_count,
        years.len(),
        "--backfill-count",
        "number of parsed years",
    )?;
    let snippet_count = pick_count(
        args.snippet_count,
        SNIPPETS.len(),
        "--snippet-count",
        "available snippets",
    )?;
    let issue_count = pick_count(
        args.issue_count,
        ISSUES.len(),
        "--issue-count",
        "available issue templates",
    )?;

    debug!(stage = ?Stage::Plan, "planning years");
    let year_plans = years[..backfill_count]
        .iter()
        .map(|year| YearPlan::build(*year, args.sample_size, today))
        .collect::<Result<Vec<_>>>()
        .context("Failed to plan backfill years")?;

    if !common.dry_run {
        ensure_executable(&common.git_bin)?;
        ensure_executable(&common.gh_bin)?;
    }
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    if backfill_count + snippet_count > 0 {
        repo.ensure_remote(&common.remote)?;
    }

    let git = Git::new(&common.git_bin, &common.remote);
    let gh = GitHubCli::new(&common.gh_bin);
    let mut runner = ProcessRunner::new(repo.path(), common.dry_run).echo_to_stderr(args.json);
    let backfill = Backfill::new(&git, repo.path().join(&args.file), zone, hours).quiet(args.json);

    let mut automation = Automation::new(&mut runner, &git, &gh, repo.path(), &args.base);
    automation.clean_check(args.allow_dirty)?;

    for year in &year_plans {
        info!(year = year.year, range = %year.range, "backfilling year");
        automation
            .backfill_year(year, &backfill, args.backfill_merge)
            .with_context(|| format!("Failed to backfill {}", year.year))?;
    }
    for snippet in &SNIPPETS[..snippet_count] {
        automation
            .apply_snippet(snippet, args.snippet_merge)
            .with_context(|| format!("Failed to ship snippet {}", snippet.branch))?;
    }
    for issue in &ISSUES[..issue_count] {
        automation
            .create_issue(issue)
            .with_context(|| format!("Failed to create issue '{}'", issue.title))?;
    }

    let summary = automation.into_summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::runner::ScriptedRunner;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn years_default_to_previous_three() {
        assert_eq!(parse_years(None, date("2025-04-01")).unwrap(), vec![2022, 2023, 2024]);
        assert_eq!(parse_years(Some("2021, 2023,"), date("2025-04-01")).unwrap(), vec![2021, 2023]);
        assert!(parse_years(Some("20x1"), date("2025-04-01")).is_err());
    }

    #[test]
    fn counts_cannot_exceed_available() {
        assert_eq!(pick_count(None, 5, "--issue-count", "issues").unwrap(), 5);
        assert_eq!(pick_count(Some(0), 5, "--issue-count", "issues").unwrap(), 0);
        assert!(pick_count(Some(6), 5, "--issue-count", "issues").is_err());
    }

    #[test]
    fn year_plan_is_seeded_by_year() {
        let today = date("2025-04-01");
        let a = YearPlan::build(2023, 100, today).unwrap();
        let b = YearPlan::build(2023, 100, today).unwrap();
        assert_eq!(a.plan, b.plan);
        assert_eq!(a.plan.total(), 100);
        assert_eq!(a.branch(), "backfill/2023-activity");
        assert!(YearPlan::build(2025, 365, today).is_err());
    }

    #[test]
    fn snippet_goes_through_squash_merge() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new("git", "origin");
        let gh = GitHubCli::new("gh");
        let mut runner =
            ScriptedRunner::new(false).reply("gh pr create", "https://github.com/o/r/pull/21");
        let snippet = &SNIPPETS[6];

        let mut automation = Automation::new(&mut runner, &git, &gh, dir.path(), "main");
        automation.apply_snippet(snippet, MergeMethod::Squash).unwrap();
        let summary = automation.into_summary();

        assert_eq!(summary.pull_requests, vec!["https://github.com/o/r/pull/21"]);
        assert_eq!(summary.branches, vec!["feature/bash-tool"]);
        let written = dir.path().join("scripts/random_report.sh");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), snippet.content);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&written).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
        let lines = runner.lines();
        assert_eq!(lines[0], "git checkout main");
        assert_eq!(lines[1], "git checkout -b feature/bash-tool");
        assert_eq!(lines[3], "git commit -m 'Add bash random report script'");
        assert_eq!(lines[4], "git push -u origin feature/bash-tool");
        assert!(lines.contains(&"gh pr merge 21 --squash --delete-branch".to_string()));
    }

    #[test]
    fn dry_run_snippet_writes_nothing_and_merges_by_branch() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new("git", "origin");
        let gh = GitHubCli::new("gh");
        let mut runner = ScriptedRunner::new(true);

        let mut automation = Automation::new(&mut runner, &git, &gh, dir.path(), "main");
        automation.apply_snippet(&SNIPPETS[0], MergeMethod::Squash).unwrap();
        let summary = automation.into_summary();

        assert!(summary.dry_run);
        assert!(summary.pull_requests.is_empty());
        assert!(!dir.path().join("snippets").exists());
        assert!(runner
            .lines()
            .contains(&"gh pr merge feature/python-snippet --squash --delete-branch".to_string()));
    }

    #[test]
    fn year_backfill_commits_then_merges() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new("git", "origin");
        let gh = GitHubCli::new("gh");
        let backfill =
            Backfill::new(&git, dir.path().join("keep.log"), Zone::utc(), WorkHours::default())
                .quiet(true);
        let year = YearPlan::build(2023, 3, date("2025-04-01")).unwrap();
        let mut runner =
            ScriptedRunner::new(false).reply("gh pr create", "https://github.com/o/r/pull/2");

        let mut automation = Automation::new(&mut runner, &git, &gh, dir.path(), "main");
        automation.backfill_year(&year, &backfill, MergeMethod::Merge).unwrap();
        let summary = automation.into_summary();

        assert_eq!(summary.commits, 3);
        let lines = runner.lines();
        assert_eq!(lines[1], "git checkout -B backfill/2023-activity");
        let commit_count = lines.iter().filter(|l| l.starts_with("git commit")).count();
        assert_eq!(commit_count, 3);
        assert!(lines.contains(&"gh pr merge 2 --merge --delete-branch".to_string()));
        let log = std::fs::read_to_string(dir.path().join("keep.log")).unwrap();
        assert_eq!(log.lines().count(), 3);
        assert!(log.lines().all(|l| l.starts_with("2023-")));
    }

    #[test]
    fn year_pr_body_names_the_backfill_file() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new("git", "origin");
        let gh = GitHubCli::new("gh");
        let file = dir.path().join("logs/activity.txt");
        let backfill = Backfill::new(&git, file, Zone::utc(), WorkHours::default()).quiet(true);
        let year = YearPlan::build(2022, 2, date("2025-04-01")).unwrap();
        let mut runner =
            ScriptedRunner::new(false).reply("gh pr create", "https://github.com/o/r/pull/5");

        let mut automation = Automation::new(&mut runner, &git, &gh, dir.path(), "main");
        automation.backfill_year(&year, &backfill, MergeMethod::Merge).unwrap();

        let create = runner
            .commands
            .iter()
            .find(|c| c.program == "gh" && c.args.first().map(String::as_str) == Some("pr"))
            .unwrap();
        assert_eq!(create.args[2], "--title");
        assert_eq!(create.args[3], "Backfill 2022 activity");
        assert_eq!(
            create.args[5],
            "Backfills logs/activity.txt entries for 2 random days of 2022."
        );
    }

    #[test]
    fn dirty_tree_needs_allow_dirty() {
        let git = Git::new("git", "origin");
        let gh = GitHubCli::new("gh");
        let dir = tempfile::tempdir().unwrap();

        let mut strict = ScriptedRunner::new(false).reply("git status", " M keep.log");
        let mut automation = Automation::new(&mut strict, &git, &gh, dir.path(), "main");
        assert!(matches!(automation.clean_check(false), Err(GfillError::Precondition(_))));

        let mut relaxed = ScriptedRunner::new(false).reply("git status", " M keep.log");
        let mut automation = Automation::new(&mut relaxed, &git, &gh, dir.path(), "main");
        assert!(automation.clean_check(true).is_ok());
    }

    #[test]
    fn issues_are_recorded() {
        let git = Git::new("git", "origin");
        let gh = GitHubCli::new("gh");
        let dir = tempfile::tempdir().unwrap();
        let mut runner =
            ScriptedRunner::new(false).reply("gh issue create", "https://github.com/o/r/issues/4");
        let mut automation = Automation::new(&mut runner, &git, &gh, dir.path(), "main");
        automation.create_issue(&ISSUES[0]).unwrap();
        assert_eq!(automation.into_summary().issues, vec!["https://github.com/o/r/issues/4"]);
    }
}
