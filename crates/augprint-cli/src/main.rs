//! augprint CLI
//!
//! Loads a configuration file into a tree and prints it as `set` directives
//! whose paths select siblings by value instead of by position, so the output
//! can be replayed against an edited copy of the file without clobbering the
//! wrong entries.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use augprint_core::{Config, UnresolvedGroup, UnresolvedReport, WildcardStyle};
use augprint_tree::MemTree;
use clap::Parser;
use colored::Colorize;
use serde::Serialize;

mod convert;
mod logging;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "augprint")]
#[command(
    author,
    version,
    about = "Print a configuration file as idempotent set directives"
)]
struct Cli {
    /// File to print.
    #[arg(default_value = "/etc/hosts")]
    filename: String,

    /// Load the file with this lens instead of auto-detecting one.
    #[arg(long)]
    lens: Option<String>,

    /// Use `seq::*` (y) or `*` (n) for unlabeled numbered entries.
    #[arg(short, long, default_value = "y")]
    seq: String,

    /// Log progress to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Log group and tail selection details to stderr.
    #[arg(short, long)]
    debug: bool,

    /// Replay the output into an empty tree and check a second replay changes nothing.
    #[arg(long)]
    verify: bool,

    /// Also write the unresolved-tail diagnostics as JSON.
    #[arg(long, value_name = "PATH")]
    diagnostics_json: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Diagnostics<'a> {
    filename: &'a str,
    grammar: &'a str,
    config: Config,
    directives: usize,
    skipped: usize,
    unresolved: &'a [UnresolvedGroup],
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<verify::Verification>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.debug);

    let config = Config::with_wildcard(WildcardStyle::from_seq_flag(&cli.seq));
    tracing::debug!(?config, filename = %cli.filename, "starting");

    let mut tree = MemTree::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let loaded = convert::load(&mut tree, &cli.filename, cli.lens.as_deref(), &mut out)?;
    let conversion = convert::write_directives(&tree, &loaded, &config, &mut out)?;
    out.flush()?;

    if !conversion.is_fully_resolved() {
        eprint!(
            "{}",
            UnresolvedReport(&conversion.unresolved).to_string().yellow()
        );
    }

    let verification = if cli.verify {
        let verification = verify::replay(&loaded.filename, &conversion.directives, &config)?;
        if verification.is_idempotent() {
            eprintln!(
                "{} replay of {} directives is idempotent",
                "ok".green().bold(),
                conversion.directives.len()
            );
        } else {
            eprintln!(
                "{} second replay changed {} nodes",
                "error:".red().bold(),
                verification.second_pass_changes
            );
        }
        Some(verification)
    } else {
        None
    };

    if let Some(path) = &cli.diagnostics_json {
        let diagnostics = Diagnostics {
            filename: &loaded.filename,
            grammar: &loaded.grammar,
            config,
            directives: conversion.directives.len(),
            skipped: conversion.skipped,
            unresolved: &conversion.unresolved,
            verification,
        };
        let json = serde_json::to_string_pretty(&diagnostics)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }

    if verification.is_some_and(|v| !v.is_idempotent()) {
        bail!("generated directives are not idempotent for {}", loaded.filename);
    }
    Ok(())
}
