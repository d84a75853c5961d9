use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, record_audit};
use crate::ligi::global_index::{RebuildOptions, rebuild_global_tag_indexes_from_repos};

#[derive(Debug, Clone, Default)]
pub struct RebuildGlobalOptions {
    pub repos: Vec<PathBuf>,
    pub no_local: bool,
}

pub fn run(opts: &RebuildGlobalOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("rebuild-global");
    let ctx = load_context(&mut report)?;
    report.detail(format!("ligi_home={}", ctx.paths.ligi_home.display()));
    report.detail(format!(
        "global_art_root={}",
        ctx.paths.global_art_root.display()
    ));

    if opts.repos.is_empty() {
        report.issue("no repositories given; refusing to replace the global index with nothing");
        return Ok(report);
    }

    let rebuild = RebuildOptions {
        scan: ctx.scan.clone(),
        write_local: ctx.config.global.rebuild_local && !opts.no_local,
    };
    let out = rebuild_global_tag_indexes_from_repos(
        &ctx.paths.global_art_root,
        &opts.repos,
        &rebuild,
    )?;

    report.detail(format!(
        "repos_indexed={} repos_skipped={} tags={} files={}",
        out.repos_indexed, out.repos_skipped, out.tags, out.files
    ));
    report.detail(format!(
        "global: created={} updated={} unchanged={} tombstoned={}",
        out.stats.created, out.stats.updated, out.stats.unchanged, out.stats.tombstoned
    ));
    if rebuild.write_local {
        report.detail(format!("local_writes={}", out.local_writes));
    }
    report.add_warnings(out.warnings);

    record_audit(&ctx.paths, &mut report);
    Ok(report)
}
