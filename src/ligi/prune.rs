use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::ligi::index_writer::{
    IndexWriteStats, read_master_tags, read_tag_page, write_tombstone,
};
use crate::ligi::paths::IndexLayout;
use crate::ligi::render::{ART_PREFIX, IndexScope, render_master_from_tags, render_tag_page};
use crate::ligi::util::write_if_changed;
use crate::ligi::warn::{self, WarnEvent};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneOutcome {
    pub pruned_entries: usize,
    pub pruned_tags: usize,
    pub stats: IndexWriteStats,
    pub warnings: Vec<String>,
}

/// Path below the art root for an `art/...` reference, if it is well formed.
fn art_relative(file_ref: &str) -> Option<&Path> {
    let rel = Path::new(file_ref.strip_prefix(ART_PREFIX)?);
    if rel.as_os_str().is_empty() {
        return None;
    }
    rel.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(rel)
}

pub fn local_ref_resolves(art_root: &Path, file_ref: &str) -> bool {
    art_relative(file_ref).is_some_and(|rel| art_root.join(rel).exists())
}

pub fn global_ref_resolves(repo_roots: &[PathBuf], file_ref: &str) -> bool {
    let path = Path::new(file_ref);
    path.is_absolute()
        && path.exists()
        && repo_roots.iter().any(|root| path.starts_with(root))
}

fn prune_index(
    layout: &IndexLayout,
    scope: IndexScope,
    keep: impl Fn(&str) -> bool,
) -> Result<PruneOutcome> {
    let mut out = PruneOutcome::default();
    let mut live_tags = Vec::new();
    let tags = read_master_tags(layout)?;

    for tag in &tags {
        let files = read_tag_page(layout, tag)?;
        let survivors: Vec<&str> = files
            .iter()
            .map(String::as_str)
            .filter(|file| keep(*file))
            .collect();
        out.pruned_entries += files.len() - survivors.len();

        if survivors.is_empty() {
            out.pruned_tags += 1;
            out.stats.record(write_tombstone(layout, tag, scope)?);
            out.stats.tombstoned += 1;
            continue;
        }
        out.stats.record(write_if_changed(
            &layout.tag_page(tag),
            &render_tag_page(tag, &survivors, scope),
        )?);
        live_tags.push(tag.as_str());
    }

    out.stats.tags = live_tags.len();
    if layout.master_index.exists() {
        out.stats.record(write_if_changed(
            &layout.master_index,
            &render_master_from_tags(&live_tags),
        )?);
    }
    Ok(out)
}

/// Drop references to files that no longer exist under `art_root`.
pub fn prune_local(art_root: &Path) -> Result<PruneOutcome> {
    let layout = IndexLayout::for_art_root(art_root);
    prune_index(&layout, IndexScope::Local, |file| {
        local_ref_resolves(art_root, file)
    })
}

/// Drop global references that are missing on disk or whose repository is
/// not among `known_repos`.
pub fn prune_global(global_art_root: &Path, known_repos: &[PathBuf]) -> Result<PruneOutcome> {
    let mut warnings = Vec::new();
    let mut roots = Vec::new();
    for repo in known_repos {
        match fs::canonicalize(repo) {
            Ok(root) => roots.push(root),
            Err(err) => warnings.push(warn::emit(WarnEvent {
                code: "REPO_SKIPPED",
                stage: "global-prune",
                action: "resolve-repo",
                path: &repo.display().to_string(),
                reason: "repo-missing",
                err: &err.to_string(),
            })),
        }
    }

    let layout = IndexLayout::for_art_root(global_art_root);
    let mut out = prune_index(&layout, IndexScope::Global, |file| {
        global_ref_resolves(&roots, file)
    })?;
    out.warnings = warnings;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ligi::global_index::write_global_indexes;
    use crate::ligi::local_index::write_local_index;
    use crate::ligi::tag_map::TagMap;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    #[test]
    fn malformed_refs_never_resolve() {
        let tmp = tempdir().expect("tempdir");
        let art = tmp.path().join("art");
        write(&art.join("a.md"), "");
        write(&tmp.path().join("outside.md"), "");

        assert!(local_ref_resolves(&art, "art/a.md"));
        assert!(!local_ref_resolves(&art, "a.md"));
        assert!(!local_ref_resolves(&art, "art/../outside.md"));
        assert!(!local_ref_resolves(&art, "art/"));
    }

    #[test]
    fn prune_local_drops_missing_files_and_empty_tags() {
        let tmp = tempdir().expect("tempdir");
        let art = tmp.path().join("art");
        write(&art.join("keep.md"), "[[t/alpha]]");

        let mut map = TagMap::new();
        map.add_file("alpha", "art/keep.md");
        map.add_file("alpha", "art/gone1.md");
        map.add_file("alpha", "art/gone2.md");
        map.add_file("beta", "art/gone3.md");
        write_local_index(&art, &map).expect("write index");

        let out = prune_local(&art).expect("prune");
        assert_eq!(out.pruned_entries, 3);
        assert_eq!(out.pruned_tags, 1);

        let layout = IndexLayout::for_art_root(&art);
        assert_eq!(read_master_tags(&layout).expect("master"), vec!["alpha"]);
        assert_eq!(read_tag_page(&layout, "alpha").expect("alpha"), vec!["art/keep.md"]);
        assert!(layout.tag_page("beta").exists());

        let again = prune_local(&art).expect("prune again");
        assert_eq!(again.pruned_entries, 0);
        assert_eq!(again.stats.writes(), 0);
    }

    #[test]
    fn prune_global_requires_known_repo() {
        let tmp = tempdir().expect("tempdir");
        let global_art = tmp.path().join("home/art");
        let repo_a = tmp.path().join("a");
        let repo_b = tmp.path().join("b");
        write(&repo_a.join("art/x.md"), "");
        write(&repo_b.join("art/y.md"), "");

        let mut map_a = TagMap::new();
        map_a.add_file("shared", "art/x.md");
        map_a.add_file("shared", "art/missing.md");
        let mut map_b = TagMap::new();
        map_b.add_file("shared", "art/y.md");
        map_b.add_file("b-only", "art/y.md");
        write_global_indexes(&global_art, &repo_a, &map_a).expect("merge a");
        write_global_indexes(&global_art, &repo_b, &map_b).expect("merge b");

        let out = prune_global(&global_art, &[repo_a.clone()]).expect("prune");
        assert_eq!(out.pruned_entries, 3);
        assert_eq!(out.pruned_tags, 1);

        let layout = IndexLayout::for_art_root(&global_art);
        assert_eq!(read_master_tags(&layout).expect("master"), vec!["shared"]);
        let canon_a = fs::canonicalize(&repo_a).expect("canon");
        assert_eq!(
            read_tag_page(&layout, "shared").expect("shared"),
            vec![canon_a.join("art/x.md").display().to_string()]
        );
    }
}
