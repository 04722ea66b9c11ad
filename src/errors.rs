//! Errors for the `stacked` application.

use itertools::Itertools;
use nu_ansi_term::Color;
use thiserror::Error;

/// A [Result] alias where the error type is [StError].
pub type StResult<T> = Result<T, StError>;

#[derive(Error, Debug)]
pub enum StError {
    // ---- [ User input ] ----
    /// Not inside of a git repository.
    #[error("Not in a git repository.")]
    NotInRepository,
    /// No stack has been selected in this repository.
    #[error("No current stack. Create one with `stacked create` or pick one with `stacked switch`.")]
    NoCurrentStack,
    /// The named stack does not exist.
    #[error("Stack `{}` does not exist.", Color::Blue.paint(.0))]
    StackNotFound(String),
    /// The stack has no refs yet.
    #[error("The stack is empty. To use a stack, first save a diff with `stacked save`.")]
    EmptyStack,
    /// The checked out branch does not belong to the current stack.
    #[error("Branch `{}` is not part of the current stack. Change to the branch you want to work on.", Color::Blue.paint(.0))]
    NotInStack(String),
    /// There is nothing to save or amend.
    #[error("No changes to save.")]
    NoChanges,
    /// A description is required but could not be prompted for.
    #[error("A description is required. Pass one with `--description` when not running in a terminal.")]
    MissingDescription,
    /// An interactive prompt is needed, but there is no terminal.
    #[error("Cannot prompt for {0} without a terminal.")]
    NotATerminal(String),
    /// The stack title sanitized to nothing.
    #[error("Invalid stack title `{0}`. Use at least one letter or digit.")]
    InvalidTitle(String),
    /// The derived ref SHA is already taken within the stack.
    #[error("A diff with id `{0}` already exists in this stack.")]
    ShaCollision(String),
    /// A branch in the reorder list is not tracked by the stack.
    #[error("Branch `{}` is not part of the stack.", Color::Blue.paint(.0))]
    UnknownBranch(String),
    /// A branch appears more than once in the reorder list.
    #[error("Branch `{}` is listed more than once.", Color::Blue.paint(.0))]
    DuplicateBranch(String),
    /// One or more branches of the stack are absent from the reorder list.
    #[error("Missing one or more refs from the reordered list: {}", .0.iter().join(", "))]
    MissingBranches(Vec<String>),
    /// A line of the reorder list could not be parsed.
    #[error("Unexpected text on line {line_number}: `{line}`. Each line holds a single branch name.")]
    MalformedLine { line_number: usize, line: String },

    // ---- [ Navigation ] ----
    /// `prev` was requested from the head of the stack.
    #[error("You are already at the first diff. Use `stacked list` to see the complete list.")]
    AlreadyAtFirst,
    /// `next` was requested from the tail of the stack.
    #[error("You are already at the last diff. Use `stacked list` to see the complete list.")]
    AlreadyAtLast,

    // ---- [ Data integrity ] ----
    /// The persisted refs violate the chain invariants.
    #[error("{0} Data might be corrupted.")]
    CorruptedStack(String),

    // ---- [ Sync ] ----
    /// The branch is ahead of its upstream without having diverged.
    #[error("Branch `{}` is ahead, but it shouldn't be. You might need to squash your commits.", Color::Blue.paint(.0))]
    BranchAhead(String),
    /// A rebase stopped, most likely on a conflict.
    #[error("Could not rebase `{}`, likely due to a merge conflict. Fix the issues with git and run `stacked sync` again.", Color::Blue.paint(.0))]
    RebaseConflict(String),
    /// A branch that must exist on the remote could not be found there.
    #[error("Branch `{branch}` does not exist on remote `{remote}`. Push the branch to the remote before syncing.")]
    RemoteBranchMissing { branch: String, remote: String },
    /// A linked merge request could not be found for a branch.
    #[error("No merge request found for branch `{}`. Does it still exist?", Color::Blue.paint(.0))]
    ReviewNotFound(String),
    /// The remote URL could not be mapped to a project path.
    #[error("Could not determine the GitLab project from remote URL `{0}`.")]
    UnknownProject(String),

    // ---- [ Collaborators ] ----
    /// A `git` subprocess exited unsuccessfully.
    #[error("`git {args}` failed: {stderr}")]
    Git { args: String, stderr: String },
    /// The GitLab API answered with an error status.
    #[error("GitLab API error ({status}): {body}")]
    Api { status: u16, body: String },
    /// The configuration lacks an API token.
    #[error("No GitLab token configured. Set `token` in {0} or export `GITLAB_TOKEN`.")]
    ConfigNotInitialized(String),
    /// A [std::io::Error] occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A [serde_json::Error] occurred.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A [toml::de::Error] occurred.
    #[error("config error: {0}")]
    TomlDe(#[from] toml::de::Error),
    /// A [git2::Error] occurred.
    #[error("libgit2 error: {0}")]
    Git2(#[from] git2::Error),
    /// An [inquire::InquireError] occurred.
    #[error("inquire error: {0}")]
    Inquire(#[from] inquire::InquireError),
    /// A [reqwest::Error] occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// A [std::fmt::Error] occurred while rendering.
    #[error("could not render the stack: {0}")]
    Fmt(#[from] std::fmt::Error),
    /// A [walkdir::Error] occurred.
    #[error("could not read stack directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl StError {
    /// Returns `true` for conditions that are reported to the user without failing the command.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::AlreadyAtFirst | Self::AlreadyAtLast)
    }
}
