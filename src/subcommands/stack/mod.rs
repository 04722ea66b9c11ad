//! Subcommands pertaining to stack management.

use super::can_prompt;
use crate::errors::{StError, StResult};
use clap::Args;

mod create;
pub use create::CreateCmd;

mod save;
pub use save::SaveCmd;

mod amend;
pub use amend::AmendCmd;

mod list;
pub use list::ListCmd;

mod switch;
pub use switch::SwitchCmd;

mod reorder;
pub use reorder::ReorderCmd;

/// Arguments shared by `save` and `amend`.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct DiffArgs {
    /// The description of the diff.
    #[arg(short, long, conflicts_with = "message")]
    pub description: Option<String>,
    /// Alias for `--description`.
    #[arg(short, long)]
    pub message: Option<String>,
    /// Files to stage. Stages everything if omitted.
    pub paths: Vec<String>,
}

impl DiffArgs {
    /// Returns the description passed on the command line, if any.
    pub fn description(&self) -> Option<String> {
        self.description.clone().or_else(|| self.message.clone())
    }
}

/// Opens the editor to write the description of a diff, seeded with `existing`.
///
/// ## Returns
/// - `Ok(String)` - The text entered by the user.
/// - `Err(StError::MissingDescription)` - If there is no terminal to prompt in.
pub(crate) fn prompt_description(existing: &str) -> StResult<String> {
    if !can_prompt() {
        return Err(StError::MissingDescription);
    }
    Ok(inquire::Editor::new("Description of the diff:")
        .with_predefined_text(existing)
        .prompt()?)
}
