//! A blocking GitLab REST client implementing [ReviewApi].

use super::{CreateReview, Review, ReviewApi, StateFilter, User};
use crate::errors::{StError, StResult};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    default_branch: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateMergeRequestBody<'a> {
    title: &'a str,
    source_branch: &'a str,
    target_branch: &'a str,
    assignee_id: u64,
    remove_source_branch: bool,
    target_project_id: u64,
}

#[derive(Debug, Serialize)]
struct UpdateMergeRequestBody<'a> {
    target_branch: &'a str,
}

/// A GitLab API client bound to a source project (where branches are pushed) and a target project (where merge
/// requests are merged). Both are the same project unless working from a fork.
pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: String,
    source_project: String,
    target_project: String,
}

impl GitLabClient {
    /// Creates a new [GitLabClient].
    ///
    /// ## Takes
    /// - `host` - The GitLab host, with or without a scheme.
    /// - `token` - A personal access token.
    /// - `source_project` - `namespace/project` path of the project branches are pushed to.
    /// - `target_project` - `namespace/project` path of the project merge requests target.
    pub fn new(
        host: &str,
        token: String,
        source_project: String,
        target_project: String,
    ) -> StResult<Self> {
        let host = host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/api/v4", host)
        } else {
            format!("https://{}/api/v4", host)
        };

        Ok(Self {
            http: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url,
            token,
            source_project,
            target_project,
        })
    }

    fn project_url(&self, project: &str) -> String {
        format!("{}/projects/{}", self.base_url, encode_project_path(project))
    }

    /// Sends an authenticated request, mapping unsuccessful statuses to [StError::Api].
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StResult<T> {
        let response = request.header("PRIVATE-TOKEN", &self.token).send()?;
        let status = response.status();
        debug!(%status, url = %response.url(), "gitlab response");

        if !status.is_success() {
            return Err(StError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(response.json()?)
    }

    fn project(&self, project: &str) -> StResult<Project> {
        self.send(self.http.get(self.project_url(project)))
    }
}

impl ReviewApi for GitLabClient {
    fn current_user(&self) -> StResult<User> {
        self.send(self.http.get(format!("{}/user", self.base_url)))
    }

    fn default_branch(&self) -> StResult<String> {
        self.project(&self.target_project)?
            .default_branch
            .ok_or_else(|| StError::Api {
                status: 404,
                body: format!("project {} has no default branch", self.target_project),
            })
    }

    fn create_review(&self, request: &CreateReview) -> StResult<Review> {
        let target = self.project(&self.target_project)?;
        let body = CreateMergeRequestBody {
            title: &request.title,
            source_branch: &request.source_branch,
            target_branch: &request.target_branch,
            assignee_id: request.assignee_id,
            remove_source_branch: request.remove_source_branch,
            target_project_id: target.id,
        };

        self.send(
            self.http
                .post(format!("{}/merge_requests", self.project_url(&self.source_project)))
                .json(&body),
        )
    }

    fn review_for_branch(&self, branch: &str, state: StateFilter) -> StResult<Option<Review>> {
        let reviews: Vec<Review> = self.send(
            self.http
                .get(format!("{}/merge_requests", self.project_url(&self.target_project)))
                .query(&[
                    ("source_branch", branch),
                    ("state", state.as_str()),
                    ("order_by", "updated_at"),
                ]),
        )?;
        Ok(reviews.into_iter().next())
    }

    fn update_target_branch(&self, review: &Review, target_branch: &str) -> StResult<Review> {
        self.send(
            self.http
                .put(format!(
                    "{}/projects/{}/merge_requests/{}",
                    self.base_url, review.project_id, review.iid
                ))
                .json(&UpdateMergeRequestBody { target_branch }),
        )
    }
}

/// URL-encodes a `namespace/project` path for use as a project id.
fn encode_project_path(path: &str) -> String {
    path.replace('/', "%2F")
}
