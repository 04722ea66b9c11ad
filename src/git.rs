//! Utilities for interacting with `git` repositories for the `stacked` application.

use crate::errors::{StError, StResult};
use git2::{ErrorCode, Repository};
use std::{
    env,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, trace};

/// Returns the repository for the current working directory.
///
/// ## Returns
/// - `Ok(Repository)` - The repository containing the current working directory.
/// - `Err(StError::NotInRepository)` - If the current working directory is not within a git repository.
/// - `Err(_)` - If the repository could not be opened.
pub fn active_repository() -> StResult<Repository> {
    discover_repository(&env::current_dir()?)
}

/// Finds the repository containing `path`, searching upwards through its parents.
pub fn discover_repository(path: &Path) -> StResult<Repository> {
    match Repository::discover(path) {
        Ok(repository) => Ok(repository),
        Err(e) if e.code() == ErrorCode::NotFound => Err(StError::NotInRepository),
        Err(e) => Err(e.into()),
    }
}

/// Returns the top-level working directory of the passed [Repository].
///
/// ## Returns
/// - `Ok(PathBuf)` - The root of the working tree.
/// - `Err(_)` - If the repository is bare.
pub fn workdir_root(repository: &Repository) -> StResult<PathBuf> {
    repository
        .workdir()
        .map(Path::to_path_buf)
        .ok_or(StError::NotInRepository)
}

/// Runs `git` subcommands on behalf of the application.
///
/// Every stack operation goes through a [GitRunner], which keeps the orchestration logic independent of the
/// process that actually executes `git`. Only [GitRunner::git] must be implemented; the remaining methods are
/// thin, named wrappers around the subcommands the application relies on.
pub trait GitRunner {
    /// Executes `git` with the given arguments.
    ///
    /// ## Returns
    /// - `Ok(String)` - The standard output of the command.
    /// - `Err(StError::Git)` - If the command exited unsuccessfully.
    fn git(&self, args: &[&str]) -> StResult<String>;

    /// Returns the name of the checked out branch.
    fn current_branch(&self) -> StResult<String> {
        Ok(self
            .git(&["symbolic-ref", "--quiet", "--short", "HEAD"])?
            .trim()
            .to_string())
    }

    /// Reads a git config value.
    ///
    /// ## Returns
    /// - `Ok(Some(value))` - The configured value.
    /// - `Ok(None)` - If the key is not set.
    /// - `Err(_)` - If `git config` failed for any other reason.
    fn config_value(&self, key: &str) -> StResult<Option<String>> {
        match self.git(&["config", "--get", key]) {
            Ok(value) => Ok(Some(value.trim().to_string()).filter(|v| !v.is_empty())),
            // `git config --get` exits with status 1 and no output when the key is unset.
            Err(StError::Git { stderr, .. }) if stderr.is_empty() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sets a repository-local git config value, unless it already holds `value`.
    fn set_local_config(&self, key: &str, value: &str) -> StResult<()> {
        if self.config_value(key)?.as_deref() == Some(value) {
            return Ok(());
        }
        self.git(&["config", "--local", key, value]).map(|_| ())
    }

    /// Returns the configured `user.name`.
    fn user_name(&self) -> StResult<String> {
        Ok(self.git(&["config", "user.name"])?.trim().to_string())
    }

    /// Returns `true` if the working tree has staged, unstaged or untracked changes.
    fn has_uncommitted_changes(&self) -> StResult<bool> {
        Ok(!self.git(&["status", "--porcelain"])?.trim().is_empty())
    }

    /// Returns the long-form status of the checked out branch, ignoring untracked files.
    fn status(&self) -> StResult<String> {
        self.git(&["status", "-uno"])
    }

    /// Checks out an existing branch.
    fn checkout(&self, branch: &str) -> StResult<()> {
        self.git(&["checkout", branch]).map(|_| ())
    }

    /// Creates a new branch at `HEAD` and checks it out.
    fn checkout_new_branch(&self, branch: &str) -> StResult<()> {
        self.git(&["checkout", "-b", branch]).map(|_| ())
    }

    /// Force-deletes a local branch.
    fn delete_local_branch(&self, branch: &str) -> StResult<()> {
        self.git(&["branch", "-D", branch]).map(|_| ())
    }

    /// Stages the given paths, or the whole working tree if none are given.
    fn add(&self, paths: &[String]) -> StResult<()> {
        let mut args = vec!["add"];
        if paths.is_empty() {
            args.push(".");
        } else {
            args.extend(paths.iter().map(String::as_str));
        }
        self.git(&args).map(|_| ())
    }

    /// Commits the staged changes with `message`.
    fn commit(&self, message: &str) -> StResult<String> {
        self.git(&["commit", "-m", message])
    }

    /// Amends the `HEAD` commit with the staged changes and `message`.
    fn amend_commit(&self, message: &str) -> StResult<String> {
        self.git(&["commit", "--amend", "-m", message])
    }

    /// Fetches from `remote`.
    fn fetch(&self, remote: &str) -> StResult<()> {
        self.git(&["fetch", remote]).map(|_| ())
    }

    /// Pulls into the checked out branch.
    fn pull(&self) -> StResult<String> {
        self.git(&["pull"])
    }

    /// Rebases the checked out branch onto `onto` using its fork-point, repointing every local branch that sits
    /// on the rewritten commits.
    fn rebase_update_refs(&self, onto: &str) -> StResult<String> {
        self.git(&["rebase", "--fork-point", "--update-refs", onto])
    }

    /// Pushes `branch` to `remote` and sets it as the branch's upstream.
    fn push_set_upstream(&self, remote: &str, branch: &str) -> StResult<String> {
        self.git(&["push", "--set-upstream", remote, branch])
    }

    /// Force-pushes all `branches` to `remote` in a single command, gated by `--force-with-lease`.
    fn force_push_with_lease(&self, remote: &str, branches: &[String]) -> StResult<String> {
        let mut args = vec!["push", remote, "--force-with-lease"];
        args.extend(branches.iter().map(String::as_str));
        self.git(&args)
    }

    /// Returns `true` if `branch` exists on `remote`.
    fn remote_branch_exists(&self, remote: &str, branch: &str) -> bool {
        self.git(&["ls-remote", "--exit-code", "--heads", remote, branch])
            .is_ok()
    }

    /// Returns the default branch of `remote`, as reported by `git remote show`.
    fn default_branch(&self, remote: &str) -> StResult<String> {
        let output = self.git(&["remote", "show", remote])?;
        parse_default_branch(&output).ok_or_else(|| StError::Git {
            args: format!("remote show {}", remote),
            stderr: "no HEAD branch reported".to_string(),
        })
    }

    /// Returns the names of the configured remotes.
    fn remotes(&self) -> StResult<Vec<String>> {
        Ok(self
            .git(&["remote"])?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }

    /// Returns the fetch URL of `remote`.
    fn remote_url(&self, remote: &str) -> StResult<String> {
        Ok(self.git(&["remote", "get-url", remote])?.trim().to_string())
    }
}

/// Extracts the branch name from the `HEAD branch:` line of `git remote show` output.
pub fn parse_default_branch(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("HEAD branch:"))
        .map(|branch| branch.trim().to_string())
        .filter(|branch| !branch.is_empty())
}

/// A [GitRunner] that spawns the `git` binary within a repository's working directory.
#[derive(Debug, Clone)]
pub struct StandardGit {
    /// The working directory that `git` is run in.
    workdir: PathBuf,
}

impl StandardGit {
    /// Creates a new [StandardGit] rooted at `workdir`.
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }
}

impl GitRunner for StandardGit {
    fn git(&self, args: &[&str]) -> StResult<String> {
        debug!(args = ?args, "running git");

        // Force English output, the sync state machine matches on `git status` phrases.
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("LC_ALL", "C")
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!(%stdout, "git output");

        if !output.status.success() {
            return Err(StError::Git {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }
}
