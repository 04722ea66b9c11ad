//! The in-memory context of the `stacked` application.

use crate::{
    config::StConfig,
    constants::CURRENT_STACK_CONFIG_KEY,
    errors::{StError, StResult},
    git::GitRunner,
    stack::{RefId, Stack},
    store::RefStore,
};

mod fmt;
pub(crate) use fmt::progress;

mod mutate;
pub use mutate::{AmendOptions, SaveOptions};

mod navigate;

mod reorder;
pub use reorder::{parse_reorder_list, reorder_template, ReorderOutcome};

mod sync;
pub use sync::SyncOptions;

/// The in-memory context of the `stacked` application.
///
/// Every operation on stacks is implemented on [StContext], split across the submodules of this module. The
/// context owns its collaborators: the [GitRunner] used to drive `git`, the [RefStore] holding the stacks of the
/// repository, and the user [StConfig].
pub struct StContext<G: GitRunner> {
    /// The runner for `git` subcommands.
    pub git: G,
    /// The on-disk store of stacks.
    pub store: RefStore,
    /// The user configuration.
    pub config: StConfig,
}

impl<G: GitRunner> StContext<G> {
    /// Creates a new [StContext].
    pub fn new(git: G, store: RefStore, config: StConfig) -> Self {
        Self { git, store, config }
    }

    /// Returns the title of the current stack, as recorded in the local git config.
    pub fn current_title(&self) -> StResult<String> {
        self.git
            .config_value(CURRENT_STACK_CONFIG_KEY)?
            .ok_or(StError::NoCurrentStack)
    }

    /// Loads and validates the current stack.
    pub fn current_stack(&self) -> StResult<Stack> {
        let title = self.current_title()?;
        self.store.gather_refs(&title)
    }

    /// Resolves the ref of the checked out branch within `stack`.
    ///
    /// ## Returns
    /// - `Ok(RefId)` - The ref holding the checked out branch.
    /// - `Err(StError::NotInStack)` - If the checked out branch is not part of `stack`.
    pub fn current_ref(&self, stack: &Stack) -> StResult<RefId> {
        let branch = self
            .git
            .current_branch()
            .unwrap_or_else(|_| "HEAD".to_string());
        stack.find_branch(&branch).ok_or(StError::NotInStack(branch))
    }

    /// Returns the branch the stack `title` is based on. Falls back to the default branch of `remote` when no base
    /// branch was recorded.
    pub fn base_branch(&self, title: &str, remote: &str) -> StResult<String> {
        match self.store.base_branch(title)? {
            Some(branch) => Ok(branch),
            None => self.git.default_branch(remote),
        }
    }

    /// Marks `title` as the current stack.
    pub fn set_current_stack(&self, title: &str) -> StResult<()> {
        if !self.store.stack_exists(title) {
            return Err(StError::StackNotFound(title.to_string()));
        }
        self.git.set_local_config(CURRENT_STACK_CONFIG_KEY, title)
    }
}
