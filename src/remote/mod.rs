//! The remote review API consumed by the stack operations.

use crate::errors::StResult;
use serde::Deserialize;

mod gitlab;
pub use gitlab::GitLabClient;

mod poll;
pub use poll::Poll;

/// The state of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    Opened,
    Closed,
    Locked,
    Merged,
    #[serde(other)]
    Unknown,
}

/// A merge request, as far as the stack operations are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    /// Project-scoped id of the merge request.
    pub iid: u64,
    /// Id of the project the merge request belongs to.
    pub project_id: u64,
    /// Title of the merge request.
    pub title: String,
    /// Link to the merge request.
    pub web_url: String,
    pub state: ReviewState,
    pub source_branch: String,
    pub target_branch: String,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// Parameters for creating a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReview {
    pub title: String,
    pub source_branch: String,
    pub target_branch: String,
    pub assignee_id: u64,
    pub remove_source_branch: bool,
}

/// Which merge requests to consider when looking one up by branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Opened,
    All,
}

impl StateFilter {
    /// Returns the filter as understood by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::All => "all",
        }
    }
}

/// The remote review API.
pub trait ReviewApi {
    /// Returns the authenticated user.
    fn current_user(&self) -> StResult<User>;

    /// Returns the default branch of the target project.
    fn default_branch(&self) -> StResult<String>;

    /// Creates a merge request.
    fn create_review(&self, request: &CreateReview) -> StResult<Review>;

    /// Returns the most recently updated merge request whose source branch is `branch`.
    fn review_for_branch(&self, branch: &str, state: StateFilter) -> StResult<Option<Review>>;

    /// Changes the target branch of `review`.
    fn update_target_branch(&self, review: &Review, target_branch: &str) -> StResult<Review>;
}

/// Extracts the `namespace/project` path from a git remote URL.
///
/// Handles `scp`-like (`git@host:group/project.git`) and URL (`https://host/group/project.git`,
/// `ssh://git@host:22/group/project`) forms.
pub fn project_path_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let path = match trimmed.split_once("://") {
        Some((_, rest)) => rest.split_once('/')?.1,
        None => trimmed.split_once(':')?.1,
    };
    let path = path.trim_matches('/');

    path.contains('/').then(|| path.to_string())
}

#[cfg(test)]
mod test {
    use super::{project_path_from_url, Review, ReviewState};

    #[test]
    fn project_paths_from_remote_urls() {
        assert_eq!(
            project_path_from_url("git@gitlab.com:group/project.git").as_deref(),
            Some("group/project")
        );
        assert_eq!(
            project_path_from_url("https://gitlab.com/group/sub/project.git").as_deref(),
            Some("group/sub/project")
        );
        assert_eq!(
            project_path_from_url("ssh://git@gitlab.example.com:2222/group/project/").as_deref(),
            Some("group/project")
        );
        assert_eq!(project_path_from_url("/srv/git/project.git"), None);
    }

    #[test]
    fn review_deserializes_from_api_json() {
        let json = r#"{
            "id": 1, "iid": 3, "project_id": 9, "title": "t",
            "web_url": "https://gitlab.com/a/b/-/merge_requests/3",
            "state": "merged", "source_branch": "s", "target_branch": "main",
            "assignee": null
        }"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.state, ReviewState::Merged);
        assert_eq!(review.iid, 3);
    }
}
