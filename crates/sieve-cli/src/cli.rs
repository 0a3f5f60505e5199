//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};

/// Predicate expression playground.
///
/// Input is read from stdin, one entry per line:
///
///   line   := expression | label SP expression | define
///   define := 'Define' SP name SP arglist SP body
///
/// where `arglist` is a comma-separated parameter list and `body` is an
/// expression over `(ref 'param')` placeholders.
#[derive(Parser)]
#[command(name = "sieve", version, about, verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge, transform, and render the graph as Graphviz dot
    Dot(DotArgs),
    /// Parse, validate, and transform; report every finding
    Check(CheckArgs),
    /// Evaluate each root against an in-memory field context
    Eval(EvalArgs),
}

#[derive(Args)]
pub struct DotArgs {
    /// Render the merged graph without validating or transforming
    #[arg(long)]
    pub parse_only: bool,

    /// Skip the post-transform validation pass
    #[arg(long)]
    pub no_post_validate: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Emit findings as JSON instead of rendered text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct EvalArgs {
    /// Define a field as NAME=LITERAL; list literals provide several
    /// values
    #[arg(long = "field", value_name = "NAME=LITERAL")]
    pub fields: Vec<String>,

    /// Phase number to evaluate at
    #[arg(long)]
    pub phase: Option<u32>,
}
