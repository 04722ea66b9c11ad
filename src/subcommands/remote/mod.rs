//! Subcommands pertaining to remote stack management.

use crate::{
    constants::UPSTREAM_REMOTE,
    ctx::StContext,
    errors::{StError, StResult},
    git::GitRunner,
    remote::{project_path_from_url, GitLabClient},
    subcommands::can_prompt,
};
use inquire::Select;
use tracing::debug;

mod sync;
pub use sync::SyncCmd;

/// Picks the remote to push to.
///
/// An explicitly passed remote always wins. With a single configured remote, that one is used. With several, the
/// user is asked, starting from the configured default; without a terminal, the configured default is used.
pub(crate) fn select_remote<G: GitRunner>(
    ctx: &StContext<G>,
    requested: Option<String>,
) -> StResult<String> {
    if let Some(remote) = requested {
        return Ok(remote);
    }

    let default = ctx.config.remote().to_string();
    let mut remotes = ctx.git.remotes()?;
    match remotes.len() {
        0 => Ok(default),
        1 => Ok(remotes.remove(0)),
        _ if !can_prompt() => Ok(default),
        _ => {
            let cursor = remotes
                .iter()
                .position(|r| *r == default)
                .unwrap_or_default();
            Ok(Select::new("Select the remote to push to", remotes)
                .with_starting_cursor(cursor)
                .prompt()?)
        }
    }
}

/// Builds the GitLab client for the repository.
///
/// Branches are pushed to the project of `remote`. Merge requests target the project of the `upstream` remote if
/// there is one, so that stacks can be worked on from a fork.
pub(crate) fn gitlab_client<G: GitRunner>(
    ctx: &StContext<G>,
    remote: &str,
) -> StResult<GitLabClient> {
    let token = ctx.config.token()?;
    let project_of = |remote: &str| -> StResult<String> {
        let url = ctx.git.remote_url(remote)?;
        project_path_from_url(&url).ok_or(StError::UnknownProject(url))
    };

    let source = project_of(remote)?;
    let has_upstream = ctx.git.remotes()?.iter().any(|r| r == UPSTREAM_REMOTE);
    let target = if has_upstream && remote != UPSTREAM_REMOTE {
        project_of(UPSTREAM_REMOTE)?
    } else {
        source.clone()
    };
    debug!(%source, %target, "resolved projects");

    GitLabClient::new(&ctx.config.host(), token, source, target)
}
