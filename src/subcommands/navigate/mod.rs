//! Subcommands pertaining to movement within the current stack.

mod step;
pub use step::{FirstCmd, LastCmd, NextCmd, PrevCmd};

mod pick;
pub use pick::MoveCmd;
