//! Movement between the refs of the current stack.

use super::StContext;
use crate::{
    errors::{StError, StResult},
    git::GitRunner,
    stack::{DisplayRef, RefId, Stack, StackRef},
};
use nu_ansi_term::Color;
use tracing::info;

impl<G: GitRunner> StContext<G> {
    /// Checks out the first ref of the current stack.
    pub fn first(&self) -> StResult<StackRef> {
        let stack = self.current_stack()?;
        let id = stack.first().ok_or(StError::EmptyStack)?;
        self.switch_to(&stack, id)
    }

    /// Checks out the last ref of the current stack.
    pub fn last(&self) -> StResult<StackRef> {
        let stack = self.current_stack()?;
        let id = stack.last().ok_or(StError::EmptyStack)?;
        self.switch_to(&stack, id)
    }

    /// Checks out the ref after the checked out one.
    ///
    /// ## Returns
    /// - `Ok(StackRef)` - The ref that was checked out.
    /// - `Err(StError::AlreadyAtLast)` - If the checked out ref is the last one.
    pub fn next(&self) -> StResult<StackRef> {
        let stack = self.non_empty_stack()?;
        let current = self.current_ref(&stack)?;
        let id = stack.next(current).ok_or(StError::AlreadyAtLast)?;
        self.switch_to(&stack, id)
    }

    /// Checks out the ref before the checked out one.
    ///
    /// ## Returns
    /// - `Ok(StackRef)` - The ref that was checked out.
    /// - `Err(StError::AlreadyAtFirst)` - If the checked out ref is the first one.
    pub fn prev(&self) -> StResult<StackRef> {
        let stack = self.non_empty_stack()?;
        let current = self.current_ref(&stack)?;
        let id = stack.prev(current).ok_or(StError::AlreadyAtFirst)?;
        self.switch_to(&stack, id)
    }

    /// Lets `pick` choose a ref of the current stack and checks it out.
    ///
    /// ## Takes
    /// - `pick` - Chooses one of the refs, listed from first to last. Also receives the position of the checked out
    ///   ref, if it belongs to the stack.
    pub fn move_to<F>(&self, pick: F) -> StResult<StackRef>
    where
        F: FnOnce(Vec<DisplayRef>, Option<usize>) -> StResult<DisplayRef>,
    {
        let stack = self.non_empty_stack()?;
        let cursor = self
            .current_ref(&stack)
            .ok()
            .and_then(|current| stack.iter().position(|id| id == current));

        let picked = pick(stack.display_refs(), cursor)?;
        self.switch_to(&stack, picked.id)
    }

    fn non_empty_stack(&self) -> StResult<Stack> {
        let stack = self.current_stack()?;
        if stack.is_empty() {
            return Err(StError::EmptyStack);
        }
        Ok(stack)
    }

    /// Checks out the branch of the ref `id` and reports the switch.
    fn switch_to(&self, stack: &Stack, id: RefId) -> StResult<StackRef> {
        let target = &stack[id];
        self.git.checkout(&target.branch)?;
        info!(branch = %target.branch, "checked out");

        println!(
            "Switched to branch: {} - {}",
            Color::Blue.paint(&target.branch),
            target.subject()
        );
        Ok(target.clone())
    }
}
