//! Reordering of the current stack.

use super::{progress, StContext};
use crate::{
    errors::{StError, StResult},
    git::GitRunner,
    remote::{ReviewApi, StateFilter},
    stack::Stack,
};
use std::collections::HashSet;
use tracing::{debug, info};

const REORDER_HELP: &str = "\
# Reorder the diffs of the stack by moving the branch names above.
# The first branch merges into the base branch of the stack, every other
# branch merges into the branch listed above it.
#
# Every branch of the stack must be listed exactly once.
# Lines starting with '#' are ignored.";

/// The result of [StContext::reorder].
#[derive(Debug)]
pub enum ReorderOutcome {
    /// The requested order matches the current one. Nothing was written.
    Unchanged,
    /// The stack was relinked and persisted.
    Reordered {
        /// The stack before reordering.
        previous: Stack,
        /// The stack after reordering.
        stack: Stack,
    },
}

/// Renders the editable list of branches of `stack`, from first to last, followed by help comments.
///
/// The branch `checked_out` is annotated with a trailing comment.
pub fn reorder_template(stack: &Stack, checked_out: Option<&str>) -> String {
    let mut template = stack
        .branches()
        .into_iter()
        .map(|branch| {
            if Some(branch.as_str()) == checked_out {
                format!("{} # checked out", branch)
            } else {
                branch
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    template.push_str("\n\n");
    template.push_str(REORDER_HELP);
    template.push('\n');
    template
}

/// Parses an edited reorder list into branch names.
///
/// Blank lines and lines whose first word starts with `#` are skipped. A branch name may be followed by a
/// comment, but by nothing else.
///
/// ## Returns
/// - `Ok(Vec<String>)` - The branch names, in order.
/// - `Err(StError::MalformedLine)` - If a line holds more than a branch name.
pub fn parse_reorder_list(contents: &str) -> StResult<Vec<String>> {
    let mut branches = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let mut words = line.split_whitespace();
        let Some(branch) = words.next() else {
            continue;
        };
        if branch.starts_with('#') {
            continue;
        }
        if let Some(word) = words.next() {
            if !word.starts_with('#') {
                return Err(StError::MalformedLine {
                    line_number: i + 1,
                    line: line.trim().to_string(),
                });
            }
        }
        branches.push(branch.to_string());
    }
    Ok(branches)
}

impl<G: GitRunner> StContext<G> {
    /// Relinks the current stack to follow `order`, and persists every relinked ref.
    ///
    /// The order is checked in full before anything is written: every branch must belong to the stack, and every
    /// branch of the stack must be listed exactly once.
    ///
    /// ## Returns
    /// - `Ok(ReorderOutcome::Unchanged)` - If `order` is the current order.
    /// - `Ok(ReorderOutcome::Reordered)` - The stacks before and after reordering.
    /// - `Err(_)` - If `order` is not a permutation of the stack's branches.
    pub fn reorder(&self, order: &[String]) -> StResult<ReorderOutcome> {
        let stack = self.current_stack()?;
        if stack.is_empty() {
            return Err(StError::EmptyStack);
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(order.len());
        for branch in order {
            let id = stack
                .find_branch(branch)
                .ok_or_else(|| StError::UnknownBranch(branch.clone()))?;
            if !seen.insert(id) {
                return Err(StError::DuplicateBranch(branch.clone()));
            }
            ids.push(id);
        }

        let missing = stack
            .iter()
            .filter(|id| !seen.contains(id))
            .map(|id| stack[id].branch.clone())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(StError::MissingBranches(missing));
        }

        let reordered = stack.relinked(&ids);
        if reordered == stack {
            debug!("order unchanged");
            return Ok(ReorderOutcome::Unchanged);
        }

        for id in reordered.iter() {
            self.store.update_ref(&reordered, id)?;
        }
        info!(branches = ?reordered.branches(), "reordered stack");

        Ok(ReorderOutcome::Reordered {
            previous: stack,
            stack: reordered,
        })
    }

    /// Points the merge requests of every moved ref at their new target branch.
    ///
    /// A ref is moved if either of its neighbors changed. Its new target is the branch of its new previous ref, or
    /// the base branch of the stack if it is now first.
    ///
    /// ## Returns
    /// - `Ok(Vec<(String, String)>)` - The retargeted branches, with their new targets.
    /// - `Err(StError::ReviewNotFound)` - If a linked merge request is no longer open.
    pub fn retarget_reviews<A: ReviewApi>(
        &self,
        api: &A,
        previous: &Stack,
        stack: &Stack,
    ) -> StResult<Vec<(String, String)>> {
        let mut retargeted = Vec::new();

        for id in stack.iter() {
            let stack_ref = &stack[id];
            if stack_ref.mr.is_none() || stack.neighbors(id) == previous.neighbors(id) {
                continue;
            }

            let target = match stack.prev(id) {
                Some(prev) => stack[prev].branch.clone(),
                None => match self.store.base_branch(stack.title())? {
                    Some(branch) => branch,
                    None => api.default_branch()?,
                },
            };

            let review = api
                .review_for_branch(&stack_ref.branch, StateFilter::Opened)?
                .ok_or_else(|| StError::ReviewNotFound(stack_ref.branch.clone()))?;
            if review.target_branch == target {
                continue;
            }

            api.update_target_branch(&review, &target)?;
            println!(
                "{}",
                progress(
                    &format!("Merge request !{} now targets {}", review.iid, target),
                    &[]
                )
            );
            retargeted.push((stack_ref.branch.clone(), target));
        }

        Ok(retargeted)
    }
}

#[cfg(test)]
mod test {
    use super::{parse_reorder_list, reorder_template, ReorderOutcome};
    use crate::{
        ctx::test::{context, seed},
        errors::StError,
        remote::ReviewState,
        stack::RefFile,
        test_utils::MockApi,
    };
    use std::fs;

    fn branches(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn parses_plain_list() {
        assert_eq!(
            parse_reorder_list("hello\nhello2\nhello3").unwrap(),
            branches(&["hello", "hello2", "hello3"])
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert_eq!(
            parse_reorder_list("hello\n#sneakycomment!\n\n  hello2 # here\nhello3\n# trailing").unwrap(),
            branches(&["hello", "hello2", "hello3"])
        );
    }

    #[test]
    fn rejects_trailing_text() {
        let err = parse_reorder_list("hello i'm a very long branch\nhello2").unwrap_err();
        assert!(matches!(err, StError::MalformedLine { line_number: 1, .. }));
    }

    #[test]
    fn template_parses_back_to_current_order() {
        let (_dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2", "3"]);
        let stack = ctx.current_stack().unwrap();

        let template = reorder_template(&stack, Some("Branch2"));
        assert!(template.contains("Branch2 # checked out"));
        assert_eq!(parse_reorder_list(&template).unwrap(), stack.branches());
    }

    #[test]
    fn swaps_two_refs() {
        let (_dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2"]);

        let outcome = ctx.reorder(&branches(&["Branch2", "Branch1"])).unwrap();
        assert!(matches!(outcome, ReorderOutcome::Reordered { .. }));

        let stack = ctx.store.gather_refs("stack").unwrap();
        let two = stack.record(stack.find_sha("2").unwrap());
        let one = stack.record(stack.find_sha("1").unwrap());
        assert_eq!(two.prev, "");
        assert_eq!(two.next, "1");
        assert_eq!(one.prev, "2");
        assert_eq!(one.next, "");
    }

    #[test]
    fn same_order_writes_nothing() {
        let (dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2", "3"]);
        let path = dir.path().join(".git/stacked/stack/2.json");
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        let outcome = ctx
            .reorder(&branches(&["Branch1", "Branch2", "Branch3"]))
            .unwrap();

        assert!(matches!(outcome, ReorderOutcome::Unchanged));
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn unknown_branch_leaves_files_untouched() {
        let (dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2"]);
        let path = dir.path().join(".git/stacked/stack/1.json");
        let before = fs::read_to_string(&path).unwrap();

        let err = ctx
            .reorder(&branches(&["Branch2", "Nope", "Branch1"]))
            .unwrap_err();

        assert!(matches!(err, StError::UnknownBranch(b) if b == "Nope"));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn missing_and_duplicate_branches_are_rejected() {
        let (dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2", "3"]);
        let path = dir.path().join(".git/stacked/stack/3.json");
        let before = fs::read_to_string(&path).unwrap();

        let err = ctx.reorder(&branches(&["Branch3", "Branch1"])).unwrap_err();
        assert!(matches!(err, StError::MissingBranches(m) if m == vec!["Branch2".to_string()]));

        let err = ctx
            .reorder(&branches(&["Branch3", "Branch1", "Branch3"]))
            .unwrap_err();
        assert!(matches!(err, StError::DuplicateBranch(_)));

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn retargets_moved_reviews() {
        let (_dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2", "3"]);
        ctx.store.set_base_branch("stack", "main").unwrap();

        let api = MockApi::new();
        for (sha, target) in [("1", "main"), ("2", "Branch1"), ("3", "Branch2")] {
            let branch = format!("Branch{}", sha);
            let mr = api.with_review(&branch, target, ReviewState::Opened);
            let path = ctx.store.stack_dir("stack").join(format!("{}.json", sha));
            let mut record: RefFile = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
            record.mr = mr;
            ctx.store.update_ref_file("stack", &record).unwrap();
        }

        let ReorderOutcome::Reordered { previous, stack } = ctx
            .reorder(&branches(&["Branch2", "Branch1", "Branch3"]))
            .unwrap()
        else {
            panic!("expected a reorder");
        };

        let retargeted = ctx.retarget_reviews(&api, &previous, &stack).unwrap();
        assert_eq!(
            retargeted,
            vec![
                ("Branch2".to_string(), "main".to_string()),
                ("Branch1".to_string(), "Branch2".to_string()),
                ("Branch3".to_string(), "Branch1".to_string()),
            ]
        );
        assert_eq!(api.updated().len(), 3);
    }

    #[test]
    fn refs_without_reviews_are_not_retargeted() {
        let (_dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2"]);
        let api = MockApi::new();

        let ReorderOutcome::Reordered { previous, stack } =
            ctx.reorder(&branches(&["Branch2", "Branch1"])).unwrap()
        else {
            panic!("expected a reorder");
        };

        assert!(ctx.retarget_reviews(&api, &previous, &stack).unwrap().is_empty());
        assert!(api.updated().is_empty());
    }
}
