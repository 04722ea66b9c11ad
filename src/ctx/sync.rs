//! Synchronization of the current stack with the remote.
//!
//! The refs are visited strictly from first to last. Each ref is reconciled with its upstream branch, then with its
//! merge request: refs without one get a merge request, refs whose merge request was merged are removed from the
//! stack. If any branch had to be rebased, every branch of the stack is force-pushed once at the very end.

use super::{progress, StContext};
use crate::{
    constants::{DEFAULT_REMOTE, MAX_REVIEW_TITLE_LENGTH},
    errors::{StError, StResult},
    git::GitRunner,
    remote::{CreateReview, Poll, Review, ReviewApi, ReviewState, StateFilter, User},
    stack::{RefId, Stack},
};
use nu_ansi_term::Color;
use tracing::{debug, info, warn};

const BRANCH_IS_BEHIND: &str = "Your branch is behind";
const BRANCH_HAS_DIVERGED: &str = "have diverged";
const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// The state of a branch relative to its upstream, as reported by `git status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    /// The upstream has commits the branch lacks.
    Behind,
    /// Both the branch and its upstream have commits the other lacks.
    Diverged,
    /// Nothing to do.
    UpToDate,
    /// Anything else, most likely unpushed commits.
    Ahead,
}

impl BranchStatus {
    /// Classifies the output of `git status -uno`.
    pub fn parse(status: &str) -> Self {
        if status.contains(BRANCH_IS_BEHIND) {
            Self::Behind
        } else if status.contains(BRANCH_HAS_DIVERGED) {
            Self::Diverged
        } else if status.contains(NOTHING_TO_COMMIT) {
            Self::UpToDate
        } else {
            Self::Ahead
        }
    }
}

/// Options for [StContext::sync].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// The remote to fetch from and push to.
    pub remote: String,
    /// How long to wait for pushed branches to show up on the remote.
    pub poll: Poll,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            poll: Poll::default(),
        }
    }
}

/// What a [StContext::sync] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Branches that were behind and pulled.
    pub pulled: Vec<String>,
    /// Branches that had diverged and were rebased.
    pub rebased: Vec<String>,
    /// Branches that got a new merge request, with its web URL.
    pub created: Vec<(String, String)>,
    /// Unlinked branches whose open merge request already existed and was recorded, with its web URL.
    pub linked: Vec<(String, String)>,
    /// Branches whose merge request was merged, and which were removed from the stack.
    pub merged: Vec<String>,
    /// Branches whose merge request was closed.
    pub closed: Vec<String>,
    /// Whether the branches of the stack were force-pushed.
    pub force_pushed: bool,
}

impl<G: GitRunner> StContext<G> {
    /// Synchronizes the current stack with `options.remote` and its merge requests.
    ///
    /// Any error aborts the sync on the spot. Every step is idempotent, so the sync can be run again once the cause
    /// is fixed.
    ///
    /// ## Takes
    /// - `api` - The review API of the remote.
    /// - `options` - The remote and polling options.
    ///
    /// ## Returns
    /// - `Ok(SyncReport)` - What was done.
    /// - `Err(StError::BranchAhead)` - If a branch has unpushed commits.
    /// - `Err(StError::RebaseConflict)` - If a diverged branch could not be rebased.
    /// - `Err(_)` - If any other git or API call failed.
    pub fn sync<A: ReviewApi>(&self, api: &A, options: &SyncOptions) -> StResult<SyncReport> {
        let mut stack = self.current_stack()?;
        if stack.is_empty() {
            return Err(StError::EmptyStack);
        }

        let user = api.current_user()?;
        debug!(user = %user.username, "authenticated");
        self.git.fetch(&options.remote)?;

        let mut report = SyncReport::default();
        let mut cursor = stack.first();
        while let Some(id) = cursor {
            // Removing a merged ref must not cut the walk short.
            cursor = stack.next(id);
            let branch = stack[id].branch.clone();

            self.git.checkout(&branch)?;
            let status = BranchStatus::parse(&self.git.status()?);
            debug!(%branch, ?status, "branch status");

            match status {
                BranchStatus::Behind => {
                    println!("{}", progress(&format!("{} is behind - pulling updates.", branch), &[]));
                    self.git.pull()?;
                    report.pulled.push(branch.clone());
                }
                BranchStatus::Diverged => {
                    println!("{}", progress(&format!("{} has diverged. Rebasing...", branch), &[]));
                    self.rebase_stack(&stack, &branch)?;
                    report.rebased.push(branch.clone());
                }
                BranchStatus::UpToDate => {}
                BranchStatus::Ahead => return Err(StError::BranchAhead(branch)),
            }

            if stack[id].mr.is_none() {
                // A merge request opened by an interrupted sync is adopted rather than opened twice.
                if let Some(review) = api.review_for_branch(&branch, StateFilter::Opened)? {
                    println!(
                        "{}",
                        progress(
                            &format!("{} already has merge request !{}. Linking it.", branch, review.iid),
                            &[]
                        )
                    );
                    self.link_review(&mut stack, id, &review)?;
                    report.linked.push((branch, review.web_url));
                    continue;
                }

                println!(
                    "{}",
                    progress(&format!("{} needs a merge request. Creating it now.", branch), &[])
                );
                let url = self.open_review(api, &mut stack, id, &user, options)?;
                report.created.push((branch, url));
                continue;
            }

            let review = api
                .review_for_branch(&branch, StateFilter::All)?
                .ok_or_else(|| StError::ReviewNotFound(branch.clone()))?;
            match review.state {
                ReviewState::Merged => {
                    println!(
                        "{}",
                        progress(
                            &format!("Merge request !{} has merged. Removing reference...", review.iid),
                            &[]
                        )
                    );
                    self.remove_ref(&mut stack, id, &options.remote)?;
                    report.merged.push(branch);
                }
                ReviewState::Closed => {
                    warn!(%branch, iid = review.iid, "merge request closed");
                    println!(
                        "{}",
                        progress(&format!("Merge request !{} has closed.", review.iid), &[])
                    );
                    report.closed.push(branch);
                }
                _ => {}
            }
        }

        if !report.rebased.is_empty() {
            let branches = stack.branches();
            println!(
                "{}",
                progress("Updating branches:", &[branches.join(", ").as_str()])
            );
            let output = self.git.force_push_with_lease(&options.remote, &branches)?;
            debug!(%output, "force-pushed");
            report.force_pushed = true;
        }

        info!(?report, "sync finished");
        println!("{}", progress("Sync finished!", &[]));
        Ok(report)
    }

    /// Rebases the last ref of `stack` onto `branch`, moving every intermediate branch along.
    fn rebase_stack(&self, stack: &Stack, branch: &str) -> StResult<()> {
        let tail = stack.last().ok_or(StError::EmptyStack)?;
        self.git.checkout(&stack[tail].branch)?;
        self.git.rebase_update_refs(branch).map_err(|e| {
            debug!(error = %e, "rebase failed");
            StError::RebaseConflict(branch.to_string())
        })?;
        Ok(())
    }

    /// Pushes the branch of `id`, opens its merge request and records it in the ref file.
    ///
    /// The merge request targets the branch of the previous ref, or the base branch of the stack for the first ref.
    /// The base branch must exist on the remote.
    ///
    /// ## Returns
    /// - `Ok(String)` - The web URL of the new merge request.
    fn open_review<A: ReviewApi>(
        &self,
        api: &A,
        stack: &mut Stack,
        id: RefId,
        user: &User,
        options: &SyncOptions,
    ) -> StResult<String> {
        let remote = options.remote.as_str();
        let branch = stack[id].branch.clone();

        self.git.push_set_upstream(remote, &branch)?;
        if !options
            .poll
            .until(&branch, || self.git.remote_branch_exists(remote, &branch))
        {
            warn!(%branch, remote, "pushed branch not visible on remote yet");
        }

        let target = match stack.prev(id) {
            Some(prev) => stack[prev].branch.clone(),
            None => {
                let base = self.base_branch(stack.title(), remote)?;
                if !options
                    .poll
                    .until(&base, || self.git.remote_branch_exists(remote, &base))
                {
                    return Err(StError::RemoteBranchMissing {
                        branch: base,
                        remote: remote.to_string(),
                    });
                }
                base
            }
        };

        let review = api.create_review(&CreateReview {
            title: review_title(&stack[id].description),
            source_branch: branch.clone(),
            target_branch: target,
            assignee_id: user.id,
            remove_source_branch: true,
        })?;

        self.link_review(stack, id, &review)?;

        println!(
            "{}",
            progress(
                "Merge request created!",
                &[format!(
                    "!{} {} ({})",
                    review.iid,
                    review.title,
                    Color::Cyan.paint(&review.web_url)
                )
                .as_str()]
            )
        );
        Ok(review.web_url)
    }

    /// Records the web URL of `review` in the ref file of `id`.
    fn link_review(&self, stack: &mut Stack, id: RefId, review: &Review) -> StResult<()> {
        if let Some(stack_ref) = stack.get_mut(id) {
            stack_ref.mr = Some(review.web_url.clone());
        }
        self.store.update_ref(stack, id)
    }

    /// Removes the ref `id` from `stack`, along with its file and local branch.
    ///
    /// The neighbors are linked to one another and persisted before the ref's file is deleted. The previous ref's
    /// branch, or the base branch, is checked out so that the removed branch can be deleted.
    fn remove_ref(&self, stack: &mut Stack, id: RefId, remote: &str) -> StResult<()> {
        let (prev, next) = stack.neighbors(id);
        let Some(removed) = stack.remove(id) else {
            return Ok(());
        };

        for neighbor in [prev, next].into_iter().flatten() {
            self.store.update_ref(stack, neighbor)?;
        }
        self.store.delete_ref_file(stack.title(), &removed.sha)?;

        let checkout = match prev {
            Some(prev) => stack[prev].branch.clone(),
            None => self.base_branch(stack.title(), remote)?,
        };
        self.git.checkout(&checkout)?;
        self.git.delete_local_branch(&removed.branch)?;

        info!(branch = %removed.branch, sha = %removed.sha, "removed merged ref");
        Ok(())
    }
}

/// Returns the title of the merge request for a diff described by `description`.
fn review_title(description: &str) -> String {
    if description.chars().count() <= MAX_REVIEW_TITLE_LENGTH {
        return description.to_string();
    }
    format!(
        "{}...",
        description
            .chars()
            .take(MAX_REVIEW_TITLE_LENGTH)
            .collect::<String>()
    )
}
