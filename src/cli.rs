//! The CLI for `stacked`.

use crate::{
    config::StConfig,
    ctx::StContext,
    git::{active_repository, workdir_root, StandardGit},
    store::RefStore,
    subcommands::Subcommands,
};
use anyhow::{anyhow, Result};
use clap::{
    builder::styling::{AnsiColor, Color, Style},
    ArgAction, Parser,
};
use std::io;
use tracing::Level;

const ABOUT: &str =
    "stacked is a CLI application for managing stacks of dependent merge requests on GitLab.";

/// The CLI application for `stacked`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-4)
    #[arg(short, action = ArgAction::Count, global = true)]
    pub v: u8,
    /// The subcommand to run
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

impl Cli {
    /// Run the CLI application with the given arguments.
    pub fn run(self) -> Result<()> {
        let repository = active_repository()?;
        let root = workdir_root(&repository)?;
        let config = StConfig::load()?;

        let ctx = StContext::new(StandardGit::new(root.clone()), RefStore::new(root), config);

        match self.subcommand.run(ctx) {
            // Reaching either end of the stack is not a failure.
            Err(e) if e.is_benign() => {
                println!("{}", e);
                Ok(())
            }
            result => result.map_err(Into::into),
        }
    }

    /// Initializes the tracing subscriber
    ///
    /// # Returns
    /// - `Result<()>` - Ok if successful, Err otherwise.
    pub(crate) fn init_tracing_subscriber(self) -> Result<Self> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match self.v {
                0 => Level::ERROR,
                1 => Level::WARN,
                2 => Level::INFO,
                3 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .with_writer(io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))?;

        Ok(self)
    }
}

/// Styles for the CLI application.
const fn cli_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

#[cfg(test)]
mod test {
    use super::Cli;
    use crate::subcommands::Subcommands;
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["stacked", "-vvv", "list"]).unwrap();
        assert_eq!(cli.v, 3);
        assert!(matches!(cli.subcommand, Subcommands::List(_)));
    }

    #[test]
    fn description_and_message_conflict() {
        assert!(Cli::try_parse_from(["stacked", "save", "-d", "a", "-m", "b"]).is_err());
        let cli = Cli::try_parse_from(["stacked", "save", "-m", "msg", "src/lib.rs"]).unwrap();
        let Subcommands::Save(save) = cli.subcommand else {
            panic!("expected save");
        };
        assert_eq!(save.diff.description().as_deref(), Some("msg"));
        assert_eq!(save.diff.paths, vec!["src/lib.rs"]);
    }
}
