//! Constants for the `stacked` application.

use nu_ansi_term::Color;

pub(crate) const GIT_DIR: &str = ".git";
pub(crate) const STACK_DIR: &str = "stacked";
pub(crate) const BASE_BRANCH_FILE: &str = "BASE_BRANCH";
pub(crate) const REF_FILE_EXTENSION: &str = "json";

/// Local git config key holding the title of the active stack.
pub(crate) const CURRENT_STACK_CONFIG_KEY: &str = "glab.currentstack";

pub(crate) const DEFAULT_REMOTE: &str = "origin";
pub(crate) const UPSTREAM_REMOTE: &str = "upstream";
pub(crate) const DEFAULT_BRANCH_PREFIX: &str = "glab-stack";
pub(crate) const DEFAULT_HOST: &str = "gitlab.com";

pub(crate) const CONFIG_DIR_NAME: &str = "stacked";
pub(crate) const CONFIG_FILE_NAME: &str = "config.toml";

/// Number of hex digits of the content hash used as a ref's id.
pub(crate) const SHA_LENGTH: usize = 8;

/// Longest merge request title accepted before truncation.
pub(crate) const MAX_REVIEW_TITLE_LENGTH: usize = 252;

pub(crate) const POLL_ATTEMPTS: usize = 5;
pub(crate) const POLL_DELAY_MS: u64 = 1_000;

pub(crate) const COLORS: [Color; 6] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Yellow,
    Color::Purple,
];

pub(crate) const FILLED_CIRCLE: char = '●';
pub(crate) const EMPTY_CIRCLE: char = '○';
pub(crate) const BOTTOM_LEFT_BOX: char = '└';
pub(crate) const LEFT_FORK_BOX: char = '├';
pub(crate) const HORIZONTAL_BOX: char = '─';
pub(crate) const PROGRESS_DOT: char = '•';
