//! `amend` subcommand.

use super::{prompt_description, DiffArgs};
use crate::{
    ctx::{AmendOptions, StContext},
    errors::StResult,
    git::GitRunner,
    subcommands::can_prompt,
};
use clap::Args;
use nu_ansi_term::Color::Blue;

/// CLI arguments for the `amend` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct AmendCmd {
    #[clap(flatten)]
    pub diff: DiffArgs,
}

impl AmendCmd {
    /// Run the `amend` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        let options = AmendOptions {
            description: self.diff.description(),
            paths: self.diff.paths,
        };

        // Without a terminal, the existing description is kept.
        let amended = ctx.amend(options, |existing| {
            if can_prompt() {
                prompt_description(existing)
            } else {
                Ok(existing.to_string())
            }
        })?;

        println!(
            "Amended diff on branch `{}`: {}",
            Blue.paint(&amended.branch),
            amended.subject()
        );
        Ok(())
    }
}
