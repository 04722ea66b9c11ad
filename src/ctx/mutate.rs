//! Creation of stacks, and the saving and amending of their diffs.

use super::StContext;
use crate::{
    constants::{CURRENT_STACK_CONFIG_KEY, SHA_LENGTH},
    errors::{StError, StResult},
    git::GitRunner,
    stack::{Stack, StackRef},
};
use nu_ansi_term::Color;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

static INVALID_TITLE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("title regex must compile"));

/// Options for [StContext::save].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// The description of the diff. Prompted for if absent.
    pub description: Option<String>,
    /// The paths to stage. Everything is staged if empty.
    pub paths: Vec<String>,
}

/// Options for [StContext::amend].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AmendOptions {
    /// The new description of the diff. Prompted for if absent.
    pub description: Option<String>,
    /// The paths to stage. Everything is staged if empty.
    pub paths: Vec<String>,
}

/// Turns a free-text title into a stack identifier.
///
/// Whitespace becomes `-`, and every run of characters outside of `[A-Za-z0-9_-]` collapses into a single `-`.
/// Leading and trailing dashes are trimmed.
///
/// ## Returns
/// - `(String, bool)` - The sanitized title, and whether characters other than whitespace were replaced.
pub fn sanitize_title(title: &str) -> (String, bool) {
    let dashed = title
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>();

    let replaced = INVALID_TITLE_CHARS.is_match(&dashed);
    let sanitized = INVALID_TITLE_CHARS.replace_all(&dashed, "-");
    (sanitized.trim_matches('-').to_string(), replaced)
}

/// Derives the id of a ref: the first hex digits of the SHA-256 of the description, stack title, author and `salt`.
pub fn stack_sha(description: &str, title: &str, author: &str, salt: u128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(description.as_bytes());
    hasher.update(title.as_bytes());
    hasher.update(author.as_bytes());
    hasher.update(salt.to_be_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..SHA_LENGTH].to_string()
}

/// Returns the first [stack_sha] not yet taken in `stack`, bumping `salt` until one is free.
pub(crate) fn unique_sha(
    stack: &Stack,
    description: &str,
    title: &str,
    author: &str,
    mut salt: u128,
) -> String {
    loop {
        let sha = stack_sha(description, title, author, salt);
        if stack.find_sha(&sha).is_none() {
            return sha;
        }
        debug!(%sha, "id taken, trying the next one");
        salt = salt.wrapping_add(1);
    }
}

/// Nanoseconds since the epoch, so that repeated descriptions still get distinct ids.
fn save_salt() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default()
}

/// Returns the name of the branch holding a diff.
pub fn branch_name(prefix: &str, title: &str, sha: &str) -> String {
    format!("{}-{}-{}", prefix, title, sha)
}

impl<G: GitRunner> StContext<G> {
    /// Creates a new stack, or selects it if it already exists, and makes it the current stack.
    ///
    /// The checked out branch is recorded as the base branch of a stack that has none yet.
    ///
    /// ## Returns
    /// - `Ok(String)` - The sanitized title of the stack.
    /// - `Err(StError::InvalidTitle)` - If nothing of the title survives sanitization.
    pub fn create(&self, title: &str) -> StResult<String> {
        let (sanitized, replaced) = sanitize_title(title);
        if sanitized.is_empty() {
            return Err(StError::InvalidTitle(title.to_string()));
        }
        if replaced {
            warn!(title, %sanitized, "title sanitized");
            println!(
                "{} title contained invalid characters and was changed to `{}`.",
                Color::Yellow.bold().paint("warning:"),
                Color::Blue.paint(&sanitized)
            );
        }

        self.git.set_local_config(CURRENT_STACK_CONFIG_KEY, &sanitized)?;
        self.store.add_stack_dir(&sanitized)?;

        if self.store.base_branch(&sanitized)?.is_none() {
            // On a detached `HEAD` the default branch of the remote is used later on.
            if let Ok(branch) = self.git.current_branch() {
                if !branch.is_empty() {
                    self.store.set_base_branch(&sanitized, &branch)?;
                }
            }
        }

        info!(title = %sanitized, "stack ready");
        Ok(sanitized)
    }

    /// Saves the uncommitted changes as a new diff at the end of the current stack.
    ///
    /// ## Takes
    /// - `options` - The description and paths of the diff.
    /// - `describe` - Prompts for a description when none was passed.
    ///
    /// ## Returns
    /// - `Ok(StackRef)` - The new ref.
    /// - `Err(_)` - If there is nothing to save, no description, or the stack is not valid. Nothing is changed in
    ///   these cases.
    pub fn save<F>(&self, options: SaveOptions, describe: F) -> StResult<StackRef>
    where
        F: FnOnce(&str) -> StResult<String>,
    {
        if !self.git.has_uncommitted_changes()? {
            return Err(StError::NoChanges);
        }

        let title = self.current_title()?;
        let mut stack = self.store.gather_refs(&title)?;

        let description = match options.description {
            Some(description) => description,
            None => describe("")?,
        };
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(StError::MissingDescription);
        }

        let author = self.git.user_name()?;
        let sha = unique_sha(&stack, &description, &title, &author, save_salt());
        let branch = branch_name(&self.config.branch_prefix(), &title, &sha);

        self.git.add(&options.paths)?;
        self.git.checkout_new_branch(&branch)?;
        self.git.commit(&description)?;

        let id = stack.push(StackRef::new(sha, branch, description))?;
        if let Some(prev) = stack.prev(id) {
            self.store.update_ref(&stack, prev)?;
        }
        self.store.add_ref_file(&title, &stack.record(id))?;

        info!(branch = %stack[id].branch, sha = %stack[id].sha, "saved diff");
        Ok(stack[id].clone())
    }

    /// Amends the diff of the checked out branch with the uncommitted changes.
    ///
    /// The SHA, branch and position of the ref never change.
    ///
    /// ## Takes
    /// - `options` - The new description and the paths to stage.
    /// - `describe` - Prompts for a description when none was passed. Receives the current description.
    pub fn amend<F>(&self, options: AmendOptions, describe: F) -> StResult<StackRef>
    where
        F: FnOnce(&str) -> StResult<String>,
    {
        if !self.git.has_uncommitted_changes()? {
            return Err(StError::NoChanges);
        }

        let mut stack = self.current_stack()?;
        let id = self.current_ref(&stack)?;
        let existing = stack[id].description.clone();

        let description = match options.description {
            Some(description) => description,
            None => describe(&existing)?,
        };
        let description = Some(description.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or(existing);

        self.git.add(&options.paths)?;
        self.git.amend_commit(&description)?;

        if let Some(stack_ref) = stack.get_mut(id) {
            stack_ref.description = description;
        }
        self.store.update_ref(&stack, id)?;

        info!(branch = %stack[id].branch, "amended diff");
        Ok(stack[id].clone())
    }
}
