use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::commands::fill_links::{self, FillLinksOptions};
use crate::commands::index::{self, IndexOptions};
use crate::commands::prune::{self, PruneOptions};
use crate::commands::rebuild_global::{self, RebuildGlobalOptions};
use crate::commands::CommandReport;

#[derive(Parser)]
#[command(name = "ligi", version, about = "Local-first, git-native artifact tags and indexes")]
struct Cli {
    /// Print the report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan `art/` and rewrite the tag indexes.
    Index(IndexArgs),
    /// Rebuild the global index from an explicit list of repositories.
    RebuildGlobal(RebuildGlobalArgs),
    /// Remove index entries whose files no longer exist.
    Prune(PruneArgs),
    /// Add links from `[[t/tag]]` tokens to their tag pages.
    FillLinks(FillLinksArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Repository root or its `art` directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Re-index a single document instead of the whole tree.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Merge into the global index even when disabled in config.
    #[arg(long)]
    global: bool,
    /// Fill tag links before indexing.
    #[arg(long)]
    fill_links: bool,
}

#[derive(Args)]
struct RebuildGlobalArgs {
    /// Repository roots to aggregate.
    #[arg(long = "repo", required = true)]
    repos: Vec<PathBuf>,
    /// Leave each repository's local index alone.
    #[arg(long)]
    no_local: bool,
}

#[derive(Args)]
struct PruneArgs {
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Prune the global index instead of the local one.
    #[arg(long)]
    global: bool,
    /// Repositories whose entries count as valid in a global prune.
    #[arg(long = "repo")]
    repos: Vec<PathBuf>,
}

#[derive(Args)]
struct FillLinksArgs {
    #[arg(long, default_value = ".")]
    root: PathBuf,
    #[arg(long)]
    file: Option<PathBuf>,
}

fn render_human(report: &CommandReport) -> String {
    let mut out = format!(
        "{}: {}",
        report.command,
        if report.ok { "ok" } else { "issues" }
    );
    for line in &report.details {
        out.push_str(&format!("\n  {line}"));
    }
    for line in &report.issues {
        out.push_str(&format!("\n  issue: {line}"));
    }
    if !report.warnings.is_empty() {
        out.push_str(&format!("\n  warnings: {}", report.warnings.len()));
    }
    out
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, report)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{}", render_human(report))?;
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Index(args) => index::run(&IndexOptions {
            root: args.root,
            file: args.file,
            global: args.global,
            fill_links: args.fill_links,
        })?,
        Command::RebuildGlobal(args) => rebuild_global::run(&RebuildGlobalOptions {
            repos: args.repos,
            no_local: args.no_local,
        })?,
        Command::Prune(args) => prune::run(&PruneOptions {
            root: args.root,
            global: args.global,
            repos: args.repos,
        })?,
        Command::FillLinks(args) => fill_links::run(&FillLinksOptions {
            root: args.root,
            file: args.file,
        })?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!("{} finished with {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
