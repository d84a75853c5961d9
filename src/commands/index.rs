use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::commands::{CommandReport, load_context, record_audit};
use crate::ligi::global_index::write_global_indexes;
use crate::ligi::index_writer::IndexWriteStats;
use crate::ligi::link_fill::{fill_art_tree, fill_document};
use crate::ligi::local_index::{index_repository, update_single_file};
use crate::ligi::paths::{repo_root_of, resolve_art_root};

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub root: PathBuf,
    pub file: Option<PathBuf>,
    pub global: bool,
    pub fill_links: bool,
}

fn describe(report: &mut CommandReport, scope: &str, stats: &IndexWriteStats) {
    report.detail(format!(
        "{scope}: tags={} created={} updated={} unchanged={} tombstoned={}",
        stats.tags, stats.created, stats.updated, stats.unchanged, stats.tombstoned
    ));
}

pub fn run(opts: &IndexOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("index");
    let ctx = load_context(&mut report)?;
    let art_root = resolve_art_root(&opts.root)?;
    report.detail(format!("art_root={}", art_root.display()));

    if opts.fill_links || ctx.config.index.fill_links {
        match &opts.file {
            Some(file) if file.is_file() => {
                let added = fill_document(&art_root, file)?;
                report.detail(format!("links_added={added}"));
            }
            Some(_) => {}
            None => {
                let filled = fill_art_tree(&art_root, &ctx.scan);
                report.detail(format!(
                    "links_added={} documents_changed={}",
                    filled.links_added, filled.documents_changed
                ));
                report.add_warnings(filled.warnings);
            }
        }
    }

    let map = match &opts.file {
        Some(file) => {
            let (map, outcome) = update_single_file(&art_root, file)?;
            if outcome.removed {
                report.detail(format!("removed {}", outcome.file_ref));
            } else {
                let tags: Vec<String> = outcome
                    .tags
                    .iter()
                    .map(|tag| format!("{}:{}", tag.name, tag.line))
                    .collect();
                report.detail(format!(
                    "indexed {} tags=[{}]",
                    outcome.file_ref,
                    tags.join(", ")
                ));
            }
            describe(&mut report, "local", &outcome.stats);
            map
        }
        None => {
            let (scan, stats) = index_repository(&art_root, &ctx.scan)?;
            report.detail(format!("files_indexed={}", scan.files_scanned));
            describe(&mut report, "local", &stats);
            report.add_warnings(scan.warnings);
            scan.map
        }
    };

    let global_root = &ctx.paths.global_art_root;
    let is_global_tree = fs::canonicalize(global_root)
        .ok()
        .zip(fs::canonicalize(&art_root).ok())
        .is_some_and(|(global, local)| global == local);
    if (opts.global || ctx.config.global.enabled) && !is_global_tree {
        let stats = write_global_indexes(global_root, &repo_root_of(&art_root), &map)?;
        describe(&mut report, "global", &stats);
    }

    record_audit(&ctx.paths, &mut report);
    Ok(report)
}
