//! Pull request and issue operations through the `gh` executable.

use crate::error::{GfillError, Result};
use crate::git::{CommandRunner, CommandSpec, Git};
use crate::model::{MergeMethod, PullRequestRef};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GitHubCli {
    bin: String,
}

impl GitHubCli {
    pub fn new(bin: &str) -> Self {
        Self { bin: bin.to_string() }
    }

    /// `gh pr create`. Under dry-run the request is only planned.
    pub fn create_pr(
        &self,
        runner: &mut dyn CommandRunner,
        title: &str,
        body: &str,
        base: &str,
        head: &str,
    ) -> Result<PullRequestRef> {
        let spec = CommandSpec::new(
            &self.bin,
            ["pr", "create", "--title", title, "--body", body, "--base", base, "--head", head],
        )
        .capture();
        let url = runner.run(&spec)?;
        if runner.dry_run() {
            return Ok(PullRequestRef::Planned { head: head.to_string() });
        }
        let number = extract_pr_number(&url)?;
        debug!(number, %url, "pull request opened");
        Ok(PullRequestRef::Opened { number, url })
    }

    /// `gh pr merge <pr> --merge|--squash --delete-branch`, confirming any prompt.
    pub fn merge_pr(
        &self,
        runner: &mut dyn CommandRunner,
        pr: &PullRequestRef,
        method: MergeMethod,
    ) -> Result<()> {
        let selector = pr.selector();
        let spec = CommandSpec::new(
            &self.bin,
            ["pr", "merge", selector.as_str(), method.flag(), "--delete-branch"],
        )
        .stdin("y\n");
        runner.run(&spec)?;
        Ok(())
    }

    /// `gh issue create`; returns the issue URL (empty under dry-run).
    pub fn create_issue(
        &self,
        runner: &mut dyn CommandRunner,
        title: &str,
        body: &str,
    ) -> Result<String> {
        let spec =
            CommandSpec::new(&self.bin, ["issue", "create", "--title", title, "--body", body])
                .capture();
        runner.run(&spec)
    }

    /// Bring `base` up to date, merge `pr` into it, then pull the merge result.
    pub fn finalize_pr(
        &self,
        runner: &mut dyn CommandRunner,
        git: &Git,
        pr: &PullRequestRef,
        base: &str,
        method: MergeMethod,
    ) -> Result<()> {
        git.checkout(runner, base)?;
        git.pull_ff_only(runner, base)?;
        self.merge_pr(runner, pr, method)?;
        git.pull_ff_only(runner, base)?;
        Ok(())
    }
}

fn pull_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/pull/(\d+)").expect("valid pull request pattern"))
}

/// Numeric id from a pull request URL such as `https://github.com/o/r/pull/42`.
pub fn extract_pr_number(url: &str) -> Result<u64> {
    pull_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| GfillError::Parse(format!("Unable to parse PR number from: {url}")))
}
