use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::ligi::index_writer::{IndexWriteStats, load_tag_map, write_index};
use crate::ligi::paths::{ART_DIR, IndexLayout, document_path};
use crate::ligi::render::IndexScope;
use crate::ligi::tag_map::TagMap;
use crate::ligi::tag_parser::{ParsedTag, parse_tags};
use crate::ligi::walk::{ScanOptions, collect_documents};
use crate::ligi::warn::{self, WarnEvent};

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub map: TagMap,
    pub files_scanned: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SingleFileOutcome {
    pub file_ref: String,
    pub tags: Vec<ParsedTag>,
    pub removed: bool,
    pub stats: IndexWriteStats,
}

/// `art/notes/plan.md` for `<art_root>/notes/plan.md`.
pub fn file_ref_for(art_root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(art_root).ok()?;
    let mut out = String::from(ART_DIR);
    for component in rel.components() {
        out.push('/');
        out.push_str(component.as_os_str().to_str()?);
    }
    Some(out)
}

fn read_document(path: &Path, warnings: &mut Vec<String>) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) => {
            warnings.push(warn::emit(WarnEvent {
                code: "DOC_READ_FAILED",
                stage: "scan",
                action: "read-document",
                path: &path.display().to_string(),
                reason: "skipped",
                err: &err.to_string(),
            }));
            None
        }
    }
}

/// Build a repository's tag map from every document under `art_root`.
///
/// Unreadable documents are reported and skipped.
pub fn scan_art_tree(art_root: &Path, opts: &ScanOptions) -> ScanOutcome {
    let walked = collect_documents(art_root, opts);
    let mut out = ScanOutcome {
        warnings: walked.warnings,
        ..ScanOutcome::default()
    };

    for path in walked.documents {
        let Some(file_ref) = file_ref_for(art_root, &path) else {
            continue;
        };
        let Some(raw) = read_document(&path, &mut out.warnings) else {
            continue;
        };
        out.files_scanned += 1;
        for tag in parse_tags(&raw) {
            out.map.add_file(&tag.name, &file_ref);
        }
    }

    out
}

pub fn write_local_index(art_root: &Path, map: &TagMap) -> Result<IndexWriteStats> {
    write_index(&IndexLayout::for_art_root(art_root), map, IndexScope::Local)
}

/// Scan the whole tree and rewrite the local index.
pub fn index_repository(art_root: &Path, opts: &ScanOptions) -> Result<(ScanOutcome, IndexWriteStats)> {
    let scan = scan_art_tree(art_root, opts);
    let stats = write_local_index(art_root, &scan.map)?;
    Ok((scan, stats))
}

/// Re-index one document against the existing on-disk index.
///
/// The file's previous tags are dropped before its current tags are added,
/// so a deleted file simply disappears from the index.
pub fn update_single_file(art_root: &Path, file: &Path) -> Result<(TagMap, SingleFileOutcome)> {
    let art_root = document_path(art_root)?;
    let file = document_path(file)?;
    let file_ref = file_ref_for(&art_root, &file).with_context(|| {
        format!(
            "{} is not inside {}",
            file.display(),
            art_root.display()
        )
    })?;

    let layout = IndexLayout::for_art_root(&art_root);
    let mut map = load_tag_map(&layout)?;
    map.remove_file(&file_ref);

    let mut tags = Vec::new();
    let removed = !file.is_file();
    if !removed {
        let raw = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        for tag in parse_tags(&raw) {
            map.add_file(&tag.name, &file_ref);
            tags.push(tag);
        }
    }

    let stats = write_index(&layout, &map, IndexScope::Local)?;
    Ok((
        map,
        SingleFileOutcome {
            file_ref,
            tags,
            removed,
            stats,
        },
    ))
}
