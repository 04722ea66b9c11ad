//! `first`, `last`, `next` and `prev` subcommands.

use crate::{ctx::StContext, errors::StResult, git::GitRunner};
use clap::Args;

/// CLI arguments for the `first` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct FirstCmd;

impl FirstCmd {
    /// Run the `first` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        ctx.first().map(|_| ())
    }
}

/// CLI arguments for the `last` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct LastCmd;

impl LastCmd {
    /// Run the `last` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        ctx.last().map(|_| ())
    }
}

/// CLI arguments for the `next` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct NextCmd;

impl NextCmd {
    /// Run the `next` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        ctx.next().map(|_| ())
    }
}

/// CLI arguments for the `prev` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PrevCmd;

impl PrevCmd {
    /// Run the `prev` subcommand.
    pub fn run<G: GitRunner>(self, ctx: StContext<G>) -> StResult<()> {
        ctx.prev().map(|_| ())
    }
}
