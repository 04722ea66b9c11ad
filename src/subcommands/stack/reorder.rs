//! `reorder` subcommand.

use crate::{
    ctx::{parse_reorder_list, progress, reorder_template, ReorderOutcome, StContext},
    errors::{StError, StResult},
    git::GitRunner,
    subcommands::{can_prompt, remote::gitlab_client},
};
use clap::Args;
use tracing::info;

/// CLI arguments for the `reorder` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct ReorderCmd {
    /// The remote hosting the merge requests. Defaults to the configured remote.
    #[arg(long)]
    pub remote: Option<String>,
}

impl ReorderCmd {
    /// Run the `reorder` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        let stack = ctx.current_stack()?;
        if stack.is_empty() {
            return Err(StError::EmptyStack);
        }
        if !can_prompt() {
            return Err(StError::NotATerminal("the new order".to_string()));
        }

        let checked_out = ctx.git.current_branch().ok();
        let edited = inquire::Editor::new("Reorder the stack:")
            .with_predefined_text(&reorder_template(&stack, checked_out.as_deref()))
            .with_file_extension(".txt")
            .prompt()?;
        let order = parse_reorder_list(&edited)?;

        let (previous, stack) = match ctx.reorder(&order)? {
            ReorderOutcome::Unchanged => {
                println!("{}", progress("No updates needed.", &[]));
                return Ok(());
            }
            ReorderOutcome::Reordered { previous, stack } => (previous, stack),
        };
        println!(
            "{}",
            progress("Reordered stack:", &[stack.branches().join(", ").as_str()])
        );

        // Only talk to the remote if there are merge requests to update.
        if stack.iter().any(|id| stack[id].mr.is_some()) {
            let remote = self
                .remote
                .unwrap_or_else(|| ctx.config.remote().to_string());
            let api = gitlab_client(&ctx, &remote)?;
            let retargeted = ctx.retarget_reviews(&api, &previous, &stack)?;
            info!(count = retargeted.len(), "retargeted merge requests");
        }

        println!("{}", progress("Reordering complete.", &[]));
        Ok(())
    }
}
