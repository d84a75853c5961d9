use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::ligi::paths::INDEX_DIR;
use crate::ligi::warn::{self, WarnEvent};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub ignore: GlobSet,
    pub follow_symlinks: bool,
}

impl ScanOptions {
    pub fn new(ignore_patterns: &[String], follow_symlinks: bool) -> Result<Self> {
        Ok(Self {
            ignore: build_ignore_set(ignore_patterns)?,
            follow_symlinks,
        })
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore: GlobSet::empty(),
            follow_symlinks: false,
        }
    }
}

pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern).with_context(|| format!("invalid ignore pattern `{pattern}`"))?,
        );
    }
    Ok(builder.build()?)
}

#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    pub documents: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Markdown documents under `art_root`, sorted, excluding the index itself.
pub fn collect_documents(art_root: &Path, opts: &ScanOptions) -> WalkOutcome {
    let index_dir = art_root.join(INDEX_DIR);
    let mut out = WalkOutcome::default();

    let walker = WalkDir::new(art_root)
        .follow_links(opts.follow_symlinks)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry) && entry.path() != index_dir);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                out.warnings.push(warn::emit(WarnEvent {
                    code: "WALK_ENTRY_FAILED",
                    stage: "walk",
                    action: "read-dir-entry",
                    path: &path,
                    reason: "skipped",
                    err: &err.to_string(),
                }));
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(art_root) else {
            continue;
        };
        if opts.ignore.is_match(rel) {
            continue;
        }
        out.documents.push(entry.into_path());
    }

    out.documents.sort();
    out
}
