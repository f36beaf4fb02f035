use crate::backfill::append_line;
use crate::cli::{ActivityArgs, CommonArgs};
use crate::error::{GfillError, Result};
use crate::git::{ensure_executable, CommandRunner, Git, GitRepo, ProcessRunner};
use crate::hosting::GitHubCli;
use crate::model::{PullRequestRef, RunSummary};
use crate::util::Zone;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use console::style;
use std::path::Path;
use tracing::debug;

/// Fail with a precondition error when `git status --porcelain` reports changes.
pub fn ensure_clean(git: &Git, runner: &mut dyn CommandRunner) -> Result<()> {
    let status = git.status_porcelain(runner)?;
    if status.trim().is_empty() {
        Ok(())
    } else {
        Err(GfillError::Precondition(
            "Working tree is not clean; please commit or stash changes first.".to_string(),
        ))
    }
}

/// Texts for one activity run, with defaults filled in from `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTexts {
    pub issue_title: String,
    pub issue_body: String,
    pub branch: String,
    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,
}

impl ActivityTexts {
    pub fn resolve(args: &ActivityArgs, now: DateTime<FixedOffset>) -> Self {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, false);
        let day = now.date_naive();
        Self {
            issue_title: args
                .issue_title
                .clone()
                .unwrap_or_else(|| format!("auto-activity issue {stamp}")),
            issue_body: args.issue_body.clone().unwrap_or_else(|| {
                format!("This issue was opened automatically by gfill.\n\nTimestamp: {stamp}")
            }),
            branch: args
                .branch
                .clone()
                .unwrap_or_else(|| format!("activity/{}", now.format("%Y%m%d-%H%M%S"))),
            commit_message: args
                .commit_message
                .clone()
                .unwrap_or_else(|| format!("chore: auto activity {day}")),
            pr_title: args
                .pr_title
                .clone()
                .unwrap_or_else(|| format!("Auto activity update {day}")),
            pr_body: args.pr_body.clone().unwrap_or_else(|| {
                format!(
                    "This pull request was generated automatically by gfill.\n\n\
                     Generated at: {stamp}"
                )
            }),
        }
    }
}

pub fn activity_line(now: DateTime<FixedOffset>) -> String {
    format!(
        "{} auto activity {}\n",
        now.date_naive(),
        now.to_rfc3339_opts(SecondsFormat::Secs, false)
    )
}

/// Branch off `base`, commit one activity line, push, and open a pull request.
///
/// Returns `None` when pushing is disabled.
#[allow(clippy::too_many_arguments)]
pub fn create_activity_pr(
    runner: &mut dyn CommandRunner,
    git: &Git,
    gh: &GitHubCli,
    file: &Path,
    base: &str,
    texts: &ActivityTexts,
    now: DateTime<FixedOffset>,
    push: bool,
) -> Result<Option<PullRequestRef>> {
    ensure_clean(git, runner)?;

    git.checkout(runner, base)?;
    git.pull_ff_only(runner, base)?;
    git.checkout_new(runner, &texts.branch)?;

    if runner.dry_run() {
        eprintln!("[dry-run] would append activity line to {}", file.display());
    } else {
        append_line(file, &activity_line(now))?;
    }
    git.add(runner, file)?;
    git.commit(runner, &texts.commit_message)?;

    if !push {
        eprintln!("[info] --no-push supplied; skipping git push and PR creation.");
        return Ok(None);
    }
    git.push(runner, &texts.branch)?;
    let pr = gh.create_pr(runner, &texts.pr_title, &texts.pr_body, base, &texts.branch)?;
    debug!(%pr, "activity pull request created");
    Ok(Some(pr))
}

pub fn exec(common: CommonArgs, args: ActivityArgs) -> anyhow::Result<()> {
    if !args.create_issue && !args.create_pr {
        return Err(GfillError::Config(
            "Nothing to do; pass --create-issue and/or --create-pr.".to_string(),
        )
        .into());
    }
    let zone: Zone = common.timezone.parse()?;
    if !common.dry_run {
        ensure_executable(&common.git_bin)?;
        ensure_executable(&common.gh_bin)?;
    }

    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let git = Git::new(&common.git_bin, &common.remote);
    let gh = GitHubCli::new(&common.gh_bin);
    let mut runner = ProcessRunner::new(repo.path(), common.dry_run).echo_to_stderr(args.json);
    let now = zone.now();
    let texts = ActivityTexts::resolve(&args, now);
    let mut summary = RunSummary::new(common.dry_run);

    if args.create_issue {
        let url = gh
            .create_issue(&mut runner, &texts.issue_title, &texts.issue_body)
            .context("Failed to create issue")?;
        if !url.is_empty() {
            summary.issues.push(url);
        }
    }

    if args.create_pr {
        let file = repo.path().join(&args.file);
        let pr = create_activity_pr(
            &mut runner,
            &git,
            &gh,
            &file,
            &args.base,
            &texts,
            now,
            !args.no_push,
        )
        .context("Failed to create activity pull request")?;
        summary.commits = 1;
        summary.branches.push(texts.branch.clone());
        if let Some(url) = pr.as_ref().and_then(|pr| pr.url()) {
            summary.pull_requests.push(url.to_string());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

pub fn print_summary(summary: &RunSummary) {
    println!("{}", style("Automation complete.").bold());
    for url in &summary.pull_requests {
        println!("  PR: {}", style(url).cyan());
    }
    for url in &summary.issues {
        println!("  Issue: {}", style(url).cyan());
    }
}
