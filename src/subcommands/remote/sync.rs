//! `sync` subcommand.

use super::{gitlab_client, select_remote};
use crate::{
    ctx::{StContext, SyncOptions},
    errors::StResult,
    git::GitRunner,
};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `sync` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SyncCmd {
    /// The remote to push to. Prompted for if there are several remotes.
    #[arg(long)]
    pub remote: Option<String>,
}

impl SyncCmd {
    /// Run the `sync` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        let remote = select_remote(&ctx, self.remote)?;
        let api = gitlab_client(&ctx, &remote)?;

        let options = SyncOptions {
            remote,
            ..Default::default()
        };
        let report = ctx.sync(&api, &options)?;

        for (branch, url) in &report.created {
            println!(
                "Created merge request for `{}` @ `{}`",
                Color::Green.paint(branch),
                Color::Blue.paint(url)
            );
        }
        for (branch, url) in &report.linked {
            println!(
                "Linked existing merge request for `{}` @ `{}`",
                Color::Green.paint(branch),
                Color::Blue.paint(url)
            );
        }
        for branch in &report.closed {
            println!(
                "Merge request for `{}` is {}. Its diff stays in the stack.",
                Color::Green.paint(branch),
                Color::Red.bold().paint("closed")
            );
        }
        Ok(())
    }
}
