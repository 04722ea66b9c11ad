//! The subcommands for the `stacked` application.

use crate::{ctx::StContext, errors::StResult, git::GitRunner};
use clap::Subcommand;
use navigate::{FirstCmd, LastCmd, MoveCmd, NextCmd, PrevCmd};
use remote::SyncCmd;
use stack::{AmendCmd, CreateCmd, ListCmd, ReorderCmd, SaveCmd, SwitchCmd};
use std::io::{self, IsTerminal};

mod navigate;
mod remote;
mod stack;

#[derive(Debug, Clone, Eq, PartialEq, Subcommand)]
pub enum Subcommands {
    // ---- [ Stack management commands ] ----
    /// Create a new stack, or select an existing one, and make it the current stack.
    #[clap(visible_alias = "c")]
    Create(CreateCmd),
    /// Save the uncommitted changes as a new diff on top of the current stack.
    #[clap(visible_alias = "s")]
    Save(SaveCmd),
    /// Amend the diff of the checked out branch with the uncommitted changes.
    #[clap(visible_alias = "a")]
    Amend(AmendCmd),
    /// Print the diffs of the current stack.
    #[clap(visible_aliases = ["l", "ls", "log"])]
    List(ListCmd),
    /// Change the current stack.
    #[clap(visible_alias = "sw")]
    Switch(SwitchCmd),
    /// Change the order of the diffs of the current stack.
    #[clap(visible_alias = "ro")]
    Reorder(ReorderCmd),

    // ---- [ Navigation commands ] ----
    /// Check out the first diff of the current stack.
    First(FirstCmd),
    /// Check out the last diff of the current stack.
    Last(LastCmd),
    /// Check out the next diff of the current stack.
    #[clap(visible_alias = "n")]
    Next(NextCmd),
    /// Check out the previous diff of the current stack.
    #[clap(visible_alias = "p")]
    Prev(PrevCmd),
    /// Pick a diff of the current stack to check out.
    #[clap(visible_alias = "m")]
    Move(MoveCmd),

    // ---- [ Remote commands ] ----
    /// Push the current stack, create its merge requests and clean up merged diffs.
    Sync(SyncCmd),
}

impl Subcommands {
    /// Run the subcommand with the given context.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        match self {
            Self::Create(args) => args.run(ctx),
            Self::Save(args) => args.run(ctx),
            Self::Amend(args) => args.run(ctx),
            Self::List(args) => args.run(ctx),
            Self::Switch(args) => args.run(ctx),
            Self::Reorder(args) => args.run(ctx),
            Self::First(args) => args.run(ctx),
            Self::Last(args) => args.run(ctx),
            Self::Next(args) => args.run(ctx),
            Self::Prev(args) => args.run(ctx),
            Self::Move(args) => args.run(ctx),
            Self::Sync(args) => args.run(ctx),
        }
    }
}

/// Returns `true` if prompts can be shown to the user.
pub(crate) fn can_prompt() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}
