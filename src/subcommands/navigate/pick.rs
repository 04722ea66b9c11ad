//! `move` subcommand.

use crate::{
    ctx::StContext,
    errors::{StError, StResult},
    git::GitRunner,
    subcommands::can_prompt,
};
use clap::Args;
use inquire::Select;

/// CLI arguments for the `move` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct MoveCmd;

impl MoveCmd {
    /// Run the `move` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        if !can_prompt() {
            return Err(StError::NotATerminal("a diff".to_string()));
        }

        ctx.move_to(|refs, cursor| {
            Ok(Select::new("Choose a diff to check out", refs)
                .with_starting_cursor(cursor.unwrap_or_default())
                .with_formatter(&|f| f.value.branch_name.clone())
                .prompt()?)
        })
        .map(|_| ())
    }
}
