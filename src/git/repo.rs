use crate::error::{GfillError, Result};
use gix::{discover, Repository};
use std::path::{Path, PathBuf};

/// Read-only view of the repository used for precondition checks.
///
/// Nothing here writes; all mutation goes through the `git` executable.
pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path).map_err(|e| match e {
            discover::Error::Discover(_) => GfillError::Precondition(format!(
                "{} is not a Git repository.",
                repo_path.display()
            )),
            other => other.into(),
        })?;
        let path = repo
            .workdir()
            .ok_or_else(|| {
                GfillError::Precondition("Bare repositories are not supported.".to_string())
            })?
            .to_path_buf();

        Ok(Self { repo, path })
    }

    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short name of the checked out branch, `None` on a detached HEAD.
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(self
            .repo
            .head_name()?
            .map(|name| name.shorten().to_string()))
    }

    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        let full = format!("refs/heads/{branch}");
        Ok(self.repo.try_find_reference(full.as_str())?.is_some())
    }

    /// Whether HEAD points at a commit (false for a freshly initialised repository).
    pub fn has_commits(&self) -> Result<bool> {
        Ok(!self.repo.head()?.is_unborn())
    }

    pub fn has_remote(&self, remote: &str) -> bool {
        self.repo
            .remote_names()
            .iter()
            .any(|name| name.to_string() == remote)
    }

    pub fn ensure_remote(&self, remote: &str) -> Result<()> {
        if self.has_remote(remote) {
            Ok(())
        } else {
            Err(GfillError::Precondition(format!(
                "Remote '{remote}' not configured; cannot push."
            )))
        }
    }
}

/// Fail unless `bin` resolves to an executable on `PATH` (or is a usable path).
pub fn ensure_executable(bin: &str) -> Result<PathBuf> {
    which::which(bin).map_err(|_| {
        GfillError::Precondition(format!("Required executable '{bin}' not found in PATH."))
    })
}
