//! Recording collaborators for unit tests.

use crate::{
    errors::{StError, StResult},
    git::GitRunner,
    remote::{CreateReview, Review, ReviewApi, ReviewState, StateFilter, User},
};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
};

/// A [GitRunner] that answers from scripted responses and records every call.
///
/// Responses are keyed by the space-joined argument list and consumed in order. Once a queue is drained, the
/// stubbed output for the same arguments is returned, and unstubbed calls succeed with empty output.
#[derive(Default)]
pub(crate) struct MockGit {
    responses: RefCell<HashMap<String, VecDeque<StResult<String>>>>,
    stubs: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<String>>,
}

impl MockGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response for `args`.
    pub(crate) fn expect(&self, args: &[&str], output: &str) {
        self.push(args, Ok(output.to_string()));
    }

    /// Answers every otherwise unscripted call with `args` with `output`.
    pub(crate) fn stub(&self, args: &[&str], output: &str) {
        self.stubs
            .borrow_mut()
            .insert(args.join(" "), output.to_string());
    }

    /// Scripts a failure for `args`.
    pub(crate) fn expect_err(&self, args: &[&str], err: StError) {
        self.push(args, Err(err));
    }

    /// Scripts a failing `git` invocation for `args`.
    pub(crate) fn expect_failure(&self, args: &[&str], stderr: &str) {
        self.expect_err(
            args,
            StError::Git {
                args: args.join(" "),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Returns every call made so far, as space-joined argument lists.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Returns the number of calls whose arguments start with `prefix`.
    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn push(&self, args: &[&str], response: StResult<String>) {
        self.responses
            .borrow_mut()
            .entry(args.join(" "))
            .or_default()
            .push_back(response);
    }
}

impl GitRunner for MockGit {
    fn git(&self, args: &[&str]) -> StResult<String> {
        let key = args.join(" ");
        self.calls.borrow_mut().push(key.clone());
        let scripted = self
            .responses
            .borrow_mut()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(self.stubs.borrow().get(&key).cloned().unwrap_or_default()))
    }
}

/// A [ReviewApi] backed by an in-memory map of reviews keyed by source branch.
pub(crate) struct MockApi {
    pub(crate) user: User,
    pub(crate) default_branch: String,
    reviews: RefCell<HashMap<String, Review>>,
    created: RefCell<Vec<CreateReview>>,
    updated: RefCell<Vec<(String, String)>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            user: User {
                id: 42,
                username: "alice".to_string(),
            },
            default_branch: "main".to_string(),
            reviews: RefCell::default(),
            created: RefCell::default(),
            updated: RefCell::default(),
        }
    }
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seeds a review for `branch` in `state`, returning its web URL.
    pub(crate) fn with_review(&self, branch: &str, target: &str, state: ReviewState) -> String {
        let iid = self.reviews.borrow().len() as u64 + 100;
        let review = review(iid, branch, target, state);
        let url = review.web_url.clone();
        self.reviews.borrow_mut().insert(branch.to_string(), review);
        url
    }

    /// Returns every review creation request, in order.
    pub(crate) fn created(&self) -> Vec<CreateReview> {
        self.created.borrow().clone()
    }

    /// Returns every target branch update as `(source branch, new target)`, in order.
    pub(crate) fn updated(&self) -> Vec<(String, String)> {
        self.updated.borrow().clone()
    }
}

impl ReviewApi for MockApi {
    fn current_user(&self) -> StResult<User> {
        Ok(self.user.clone())
    }

    fn default_branch(&self) -> StResult<String> {
        Ok(self.default_branch.clone())
    }

    fn create_review(&self, request: &CreateReview) -> StResult<Review> {
        self.created.borrow_mut().push(request.clone());
        let iid = self.created.borrow().len() as u64;
        let review = review(
            iid,
            &request.source_branch,
            &request.target_branch,
            ReviewState::Opened,
        );
        self.reviews
            .borrow_mut()
            .insert(request.source_branch.clone(), review.clone());
        Ok(review)
    }

    fn review_for_branch(&self, branch: &str, state: StateFilter) -> StResult<Option<Review>> {
        Ok(self
            .reviews
            .borrow()
            .get(branch)
            .filter(|r| state == StateFilter::All || r.state == ReviewState::Opened)
            .cloned())
    }

    fn update_target_branch(&self, review: &Review, target_branch: &str) -> StResult<Review> {
        self.updated
            .borrow_mut()
            .push((review.source_branch.clone(), target_branch.to_string()));
        let mut updated = review.clone();
        updated.target_branch = target_branch.to_string();
        self.reviews
            .borrow_mut()
            .insert(review.source_branch.clone(), updated.clone());
        Ok(updated)
    }
}

fn review(iid: u64, branch: &str, target: &str, state: ReviewState) -> Review {
    Review {
        iid,
        project_id: 9,
        title: branch.to_string(),
        web_url: format!("https://gitlab.com/group/project/-/merge_requests/{}", iid),
        state,
        source_branch: branch.to_string(),
        target_branch: target.to_string(),
    }
}
