//! Mutating `git` invocations.
//!
//! Everything here goes through a [`CommandRunner`], so under dry-run the
//! commands are printed instead of executed.

use super::runner::{CommandRunner, CommandSpec};
use crate::error::Result;
use std::path::Path;

/// Thin wrapper around the `git` executable.
#[derive(Debug, Clone)]
pub struct Git {
    bin: String,
    remote: String,
}

impl Git {
    pub fn new(bin: &str, remote: &str) -> Self {
        Self {
            bin: bin.to_string(),
            remote: remote.to_string(),
        }
    }

    fn cmd<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.bin, args)
    }

    /// `git status --porcelain`; runs even under dry-run.
    pub fn status_porcelain(&self, runner: &mut dyn CommandRunner) -> Result<String> {
        runner.run(&self.cmd(["status", "--porcelain"]).read_only())
    }

    pub fn checkout(&self, runner: &mut dyn CommandRunner, branch: &str) -> Result<()> {
        runner.run(&self.cmd(["checkout", branch]))?;
        Ok(())
    }

    /// `git checkout -b`, failing when the branch already exists.
    pub fn checkout_new(&self, runner: &mut dyn CommandRunner, branch: &str) -> Result<()> {
        runner.run(&self.cmd(["checkout", "-b", branch]))?;
        Ok(())
    }

    /// `git checkout -B`, creating the branch or resetting it to the current HEAD.
    pub fn checkout_reset(&self, runner: &mut dyn CommandRunner, branch: &str) -> Result<()> {
        runner.run(&self.cmd(["checkout", "-B", branch]))?;
        Ok(())
    }

    pub fn add(&self, runner: &mut dyn CommandRunner, path: &Path) -> Result<()> {
        runner.run(&self.cmd(["add".to_string(), path.to_string_lossy().into_owned()]))?;
        Ok(())
    }

    pub fn commit(&self, runner: &mut dyn CommandRunner, message: &str) -> Result<()> {
        runner.run(&self.cmd(["commit", "-m", message]))?;
        Ok(())
    }

    /// Commit with both author and committer dates overridden to `timestamp`.
    pub fn commit_at(
        &self,
        runner: &mut dyn CommandRunner,
        message: &str,
        timestamp: &str,
    ) -> Result<()> {
        let spec = self
            .cmd(["commit", "-m", message])
            .env("GIT_AUTHOR_DATE", timestamp)
            .env("GIT_COMMITTER_DATE", timestamp);
        runner.run(&spec)?;
        Ok(())
    }

    pub fn pull_ff_only(&self, runner: &mut dyn CommandRunner, branch: &str) -> Result<()> {
        runner.run(&self.cmd(["pull", "--ff-only", self.remote.as_str(), branch]))?;
        Ok(())
    }

    pub fn push(&self, runner: &mut dyn CommandRunner, branch: &str) -> Result<String> {
        runner.run(&self.cmd(["push", "-u", self.remote.as_str(), branch]))
    }
}
