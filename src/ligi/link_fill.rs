use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::ligi::local_index::file_ref_for;
use crate::ligi::paths::{INDEX_DIR, TAGS_DIR, document_path};
use crate::ligi::tag_parser::{is_valid_tag_name, scan_tag_tokens};
use crate::ligi::util::{WriteStatus, write_if_changed};
use crate::ligi::walk::{ScanOptions, collect_documents};
use crate::ligi::warn::{self, WarnEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledContent {
    pub content: String,
    pub rewritten: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FillOutcome {
    pub documents_scanned: usize,
    pub documents_changed: usize,
    pub links_added: usize,
    pub warnings: Vec<String>,
}

/// Link target from a document `depth` directories below the art root to a
/// tag's page.
pub fn tag_page_link(depth: usize, tag: &str) -> String {
    format!("{}{INDEX_DIR}/{TAGS_DIR}/{tag}.md", "../".repeat(depth))
}

/// Append `(link)` to every bare `[[t/tag]]` in prose.
///
/// `doc_rel_path` is the document's path below the art root, with `/`
/// separators. Tokens already followed by `(` are left alone, so a second
/// pass over the output adds nothing.
pub fn fill_tag_links(content: &str, doc_rel_path: &str) -> FilledContent {
    let depth = doc_rel_path.matches('/').count();
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0usize;
    let mut rewritten = 0usize;

    for token in scan_tag_tokens(content) {
        if !is_valid_tag_name(token.name) || content[token.end..].starts_with('(') {
            continue;
        }
        out.push_str(&content[cursor..token.end]);
        out.push('(');
        out.push_str(&tag_page_link(depth, token.name));
        out.push(')');
        cursor = token.end;
        rewritten += 1;
    }

    if rewritten == 0 {
        return FilledContent {
            content: content.to_string(),
            rewritten,
        };
    }
    out.push_str(&content[cursor..]);
    FilledContent {
        content: out,
        rewritten,
    }
}

/// Fill links in one document on disk; returns the number of links added.
pub fn fill_document(art_root: &Path, path: &Path) -> Result<usize> {
    let art_root = document_path(art_root)?;
    let path = document_path(path)?;
    let file_ref = file_ref_for(&art_root, &path)
        .with_context(|| format!("{} is not inside {}", path.display(), art_root.display()))?;
    let rel = file_ref.split_once('/').map(|(_, rest)| rest).unwrap_or("");
    let raw =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let filled = fill_tag_links(&raw, rel);
    if filled.rewritten > 0 && write_if_changed(&path, &filled.content)? != WriteStatus::Unchanged {
        return Ok(filled.rewritten);
    }
    Ok(0)
}

pub fn fill_art_tree(art_root: &Path, opts: &ScanOptions) -> FillOutcome {
    let walked = collect_documents(art_root, opts);
    let mut out = FillOutcome {
        warnings: walked.warnings,
        ..FillOutcome::default()
    };

    for path in walked.documents {
        out.documents_scanned += 1;
        match fill_document(art_root, &path) {
            Ok(0) => {}
            Ok(added) => {
                out.documents_changed += 1;
                out.links_added += added;
            }
            Err(err) => out.warnings.push(warn::emit(WarnEvent {
                code: "LINK_FILL_FAILED",
                stage: "fill-links",
                action: "rewrite-document",
                path: &path.display().to_string(),
                reason: "skipped",
                err: &format!("{err:#}"),
            })),
        }
    }
    out
}
