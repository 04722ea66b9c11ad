//! `create` subcommand.

use crate::{
    ctx::StContext,
    errors::{StError, StResult},
    git::GitRunner,
    subcommands::can_prompt,
};
use clap::Args;
use nu_ansi_term::Color::Blue;

/// CLI arguments for the `create` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct CreateCmd {
    /// The title of the stack. Prompted for if omitted.
    pub title: Option<String>,
}

impl CreateCmd {
    /// Run the `create` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        let title = match self.title {
            Some(title) => title,
            None if can_prompt() => inquire::Text::new("Title of the new stack:").prompt()?,
            None => return Err(StError::NotATerminal("a stack title".to_string())),
        };

        let title = ctx.create(&title)?;

        // Inform user of success.
        println!(
            "Now working on stack `{}`. Save a diff with `stacked save`.",
            Blue.paint(title)
        );
        Ok(())
    }
}
