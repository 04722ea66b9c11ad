//! `save` subcommand.

use super::{prompt_description, DiffArgs};
use crate::{
    ctx::{SaveOptions, StContext},
    errors::StResult,
    git::GitRunner,
};
use clap::Args;
use nu_ansi_term::Color::{Blue, Green};

/// CLI arguments for the `save` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SaveCmd {
    #[clap(flatten)]
    pub diff: DiffArgs,
}

impl SaveCmd {
    /// Run the `save` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        let options = SaveOptions {
            description: self.diff.description(),
            paths: self.diff.paths,
        };
        let saved = ctx.save(options, prompt_description)?;

        println!(
            "Saved diff {} on branch `{}`: {}",
            Green.paint(&saved.sha),
            Blue.paint(&saved.branch),
            saved.subject()
        );
        Ok(())
    }
}
