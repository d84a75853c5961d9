use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, record_audit};
use crate::ligi::paths::resolve_art_root;
use crate::ligi::prune::{PruneOutcome, prune_global, prune_local};

#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub root: PathBuf,
    pub global: bool,
    pub repos: Vec<PathBuf>,
}

fn describe(report: &mut CommandReport, scope: &str, out: &PruneOutcome) {
    report.detail(format!(
        "{scope}: pruned_entries={} pruned_tags={} remaining_tags={}",
        out.pruned_entries, out.pruned_tags, out.stats.tags
    ));
}

pub fn run(opts: &PruneOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("prune");
    let ctx = load_context(&mut report)?;

    if opts.global {
        if opts.repos.is_empty() {
            report.issue("global prune needs at least one --repo; every entry would be dropped");
            return Ok(report);
        }
        let out = prune_global(&ctx.paths.global_art_root, &opts.repos)?;
        describe(&mut report, "global", &out);
        report.add_warnings(out.warnings);
    } else {
        let art_root = resolve_art_root(&opts.root)?;
        report.detail(format!("art_root={}", art_root.display()));
        let out = prune_local(&art_root)?;
        describe(&mut report, "local", &out);
    }

    record_audit(&ctx.paths, &mut report);
    Ok(report)
}
