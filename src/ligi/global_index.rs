//! The home-tier index: one union of many repositories, keyed by absolute path.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LigiError;
use crate::ligi::index_writer::{
    IndexWriteStats, read_master_tags, read_tag_page, write_index, write_tombstone,
};
use crate::ligi::local_index::{scan_art_tree, write_local_index};
use crate::ligi::paths::{ART_DIR, IndexLayout};
use crate::ligi::render::{IndexScope, render_master_from_tags, render_tag_page};
use crate::ligi::tag_map::TagMap;
use crate::ligi::util::write_if_changed;
use crate::ligi::walk::ScanOptions;
use crate::ligi::warn::{self, WarnEvent};

#[derive(Debug, Clone, Default)]
pub struct RebuildOptions {
    pub scan: ScanOptions,
    /// Also regenerate each repository's own index while scanning it.
    pub write_local: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildOutcome {
    pub repos_indexed: usize,
    pub repos_skipped: usize,
    pub tags: usize,
    pub files: usize,
    pub local_writes: usize,
    pub stats: IndexWriteStats,
    pub warnings: Vec<String>,
}

fn ensure_global_index(global_art_root: &Path) -> Result<IndexLayout> {
    let layout = IndexLayout::for_art_root(global_art_root);
    fs::create_dir_all(&layout.tags_dir).map_err(|err| {
        LigiError::GlobalHomeUnavailable(format!("{}: {err}", layout.tags_dir.display()))
    })?;
    Ok(layout)
}

/// Absolute form of a repository-relative `art/...` reference.
pub fn global_ref_for(repo_root: &Path, file_ref: &str) -> String {
    let mut path = repo_root.to_path_buf();
    for segment in file_ref.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.display().to_string()
}

pub fn to_global_map(repo_root: &Path, local: &TagMap) -> TagMap {
    local.map_refs(|file_ref| global_ref_for(repo_root, file_ref))
}

/// Merge one repository's map into the global index.
///
/// Entries under `repo_root` are replaced wholesale; entries belonging to any
/// other repository are carried over untouched.
pub fn write_global_indexes(
    global_art_root: &Path,
    repo_root: &Path,
    local: &TagMap,
) -> Result<IndexWriteStats> {
    let layout = ensure_global_index(global_art_root)?;
    let repo_root = fs::canonicalize(repo_root)
        .with_context(|| format!("failed to resolve {}", repo_root.display()))?;
    let incoming = to_global_map(&repo_root, local);

    let mut touched: BTreeSet<String> = read_master_tags(&layout)?.into_iter().collect();
    touched.extend(incoming.sorted_tags().into_iter().map(str::to_string));

    let mut stats = IndexWriteStats::default();
    let mut live_tags = Vec::new();
    for tag in &touched {
        let mut files: Vec<String> = read_tag_page(&layout, tag)?
            .into_iter()
            .filter(|file| !Path::new(file).starts_with(&repo_root))
            .collect();
        for file in incoming.sorted_files(tag) {
            if !files.iter().any(|existing| existing == file) {
                files.push(file.to_string());
            }
        }

        if files.is_empty() {
            stats.record(write_tombstone(&layout, tag, IndexScope::Global)?);
            stats.tombstoned += 1;
            continue;
        }
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        stats.record(write_if_changed(
            &layout.tag_page(tag),
            &render_tag_page(tag, &refs, IndexScope::Global),
        )?);
        live_tags.push(tag.as_str());
    }

    stats.tags = live_tags.len();
    stats.record(write_if_changed(
        &layout.master_index,
        &render_master_from_tags(&live_tags),
    )?);
    Ok(stats)
}

/// Replace the global index with exactly `global`, tombstoning vanished tags.
pub fn write_global_indexes_authoritative(
    global_art_root: &Path,
    global: &TagMap,
) -> Result<IndexWriteStats> {
    let layout = ensure_global_index(global_art_root)?;
    write_index(&layout, global, IndexScope::Global)
}

fn skip_repo(out: &mut RebuildOutcome, repo: &Path, reason: &str, err: &str) {
    out.repos_skipped += 1;
    out.warnings.push(warn::emit(WarnEvent {
        code: "REPO_SKIPPED",
        stage: "global-rebuild",
        action: "scan-repo",
        path: &repo.display().to_string(),
        reason,
        err,
    }));
}

/// Re-scan every repository and rewrite the global index from scratch.
///
/// A missing repository or `art` directory is a warning; the rest go on.
pub fn rebuild_global_tag_indexes_from_repos(
    global_art_root: &Path,
    repos: &[PathBuf],
    opts: &RebuildOptions,
) -> Result<RebuildOutcome> {
    let mut out = RebuildOutcome::default();
    let mut global = TagMap::new();

    for repo in repos {
        let repo_root = match fs::canonicalize(repo) {
            Ok(path) => path,
            Err(err) => {
                skip_repo(&mut out, repo, "repo-missing", &err.to_string());
                continue;
            }
        };
        let art_root = repo_root.join(ART_DIR);
        if !art_root.is_dir() {
            skip_repo(&mut out, repo, "art-dir-missing", "");
            continue;
        }

        let scan = scan_art_tree(&art_root, &opts.scan);
        out.warnings.extend(scan.warnings);
        if opts.write_local {
            match write_local_index(&art_root, &scan.map) {
                Ok(stats) => out.local_writes += stats.writes(),
                Err(err) => out.warnings.push(warn::emit(WarnEvent {
                    code: "LOCAL_INDEX_FAILED",
                    stage: "global-rebuild",
                    action: "write-local-index",
                    path: &art_root.display().to_string(),
                    reason: "local-index-skipped",
                    err: &format!("{err:#}"),
                })),
            }
        }
        global.merge(&to_global_map(&repo_root, &scan.map));
        out.repos_indexed += 1;
    }

    out.stats = write_global_indexes_authoritative(global_art_root, &global)?;
    out.tags = global.tag_count();
    out.files = global.file_count();
    Ok(out)
}
