//! `switch` subcommand.

use crate::{
    ctx::StContext,
    errors::{StError, StResult},
    git::GitRunner,
    subcommands::can_prompt,
};
use clap::Args;
use inquire::Select;
use nu_ansi_term::Color::Blue;

/// CLI arguments for the `switch` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SwitchCmd {
    /// The title of the stack to switch to. Prompted for if omitted.
    pub title: Option<String>,
}

impl SwitchCmd {
    /// Run the `switch` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        let title = match self.title {
            Some(title) => title,
            None => {
                let stacks = ctx.store.list_stacks()?;
                if stacks.is_empty() {
                    println!("No stacks yet. Create one with `stacked create`.");
                    return Ok(());
                }
                if !can_prompt() {
                    return Err(StError::NotATerminal("a stack".to_string()));
                }

                let current = ctx.current_title().ok();
                let cursor = current
                    .and_then(|c| stacks.iter().position(|s| *s == c))
                    .unwrap_or_default();
                Select::new("Select a stack to switch to", stacks)
                    .with_starting_cursor(cursor)
                    .prompt()?
            }
        };

        ctx.set_current_stack(&title)?;
        println!("Switched to stack `{}`.", Blue.paint(title));
        Ok(())
    }
}
