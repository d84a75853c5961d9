//! Markdown rendering of tag indexes and the matching reader.
//!
//! The index files are a narrow, self-imposed format. The reader only
//! understands what the renderer writes plus the older bare-path bullets.

use crate::ligi::tag_map::TagMap;
use crate::ligi::tag_parser::is_valid_tag_name;

pub const ART_PREFIX: &str = "art/";
const MAINTAINED_NOTE: &str = "This file is maintained by `ligi index`. Manual edits are overwritten.";
const TAGS_HEADING: &str = "## Tags";
const FILES_HEADING: &str = "## Files";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexScope {
    /// Repository index; refs look like `art/notes/plan.md`.
    Local,
    /// Home-tier index; refs are absolute paths.
    Global,
}

pub fn render_master_index(map: &TagMap) -> String {
    render_master_from_tags(&map.sorted_tags())
}

pub fn render_master_from_tags(tags: &[&str]) -> String {
    let mut sorted = tags.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = String::new();
    out.push_str("# Ligi Tag Index\n\n");
    out.push_str(MAINTAINED_NOTE);
    out.push_str("\n\n");
    out.push_str(TAGS_HEADING);
    out.push_str("\n\n");
    for tag in sorted {
        out.push_str(&format!("- [{tag}](tags/{tag}.md)\n"));
    }
    out
}

/// Relative link from a per-tag page back to a file under the art root.
///
/// Pages live at `index/tags/<tag>.md`, so the climb is two levels plus one
/// per `/` in the tag name.
pub fn local_file_link(tag: &str, file_ref: &str) -> String {
    let depth = tag.matches('/').count() + 2;
    let stripped = file_ref.strip_prefix(ART_PREFIX).unwrap_or(file_ref);
    format!("{}{stripped}", "../".repeat(depth))
}

pub fn render_tag_page(tag: &str, files: &[&str], scope: IndexScope) -> String {
    let mut sorted = files.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = String::new();
    out.push_str(&format!("# Tag: {tag}\n\n"));
    out.push_str(MAINTAINED_NOTE);
    out.push_str("\n\n");
    out.push_str(FILES_HEADING);
    out.push_str("\n\n");
    for file in sorted {
        match scope {
            IndexScope::Local => {
                out.push_str(&format!("- [{file}]({})\n", local_file_link(tag, file)));
            }
            IndexScope::Global => {
                out.push_str(&format!("- {file}\n"));
            }
        }
    }
    out
}

pub fn render_empty_tag_page(tag: &str, scope: IndexScope) -> String {
    render_tag_page(tag, &[], scope)
}

/// Label of a bullet line: `- [label](target)` or the older `- label`.
fn bullet_label(line: &str) -> Option<&str> {
    let item = line.trim_end().strip_prefix("- ")?.trim();
    if item.is_empty() {
        return None;
    }
    if let Some(linked) = item.strip_prefix('[') {
        let close = linked.find("](")?;
        let label = linked[..close].trim();
        return (!label.is_empty()).then_some(label);
    }
    Some(item)
}

/// Tags listed in a master index, in file order. Invalid names are skipped.
pub fn parse_master_tags(content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in content.lines() {
        let Some(label) = bullet_label(line) else {
            continue;
        };
        if is_valid_tag_name(label) && !out.iter().any(|t| t == label) {
            out.push(label.to_string());
        }
    }
    out
}

/// File references from a per-tag page's `## Files` section.
///
/// Pages without the heading are read as a flat bullet list.
pub fn parse_tag_page_files(content: &str) -> Vec<String> {
    let has_heading = content.lines().any(|line| line.trim() == FILES_HEADING);
    let mut in_files = !has_heading;
    let mut out: Vec<String> = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("## ") {
            in_files = trimmed == FILES_HEADING || !has_heading;
            continue;
        }
        if !in_files {
            continue;
        }
        if let Some(label) = bullet_label(line)
            && !out.iter().any(|f| f == label)
        {
            out.push(label.to_string());
        }
    }
    out
}
