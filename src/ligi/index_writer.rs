//! Persisting a [`TagMap`] as a master index plus one page per tag.
//!
//! Every file goes through [`write_if_changed`], so rerunning with the same
//! map touches nothing. Tags that drop out of the map keep an emptied page
//! instead of being deleted; links into the index keep resolving. Those
//! tombstones accumulate over a project's life, there is no cleanup pass.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;

use crate::ligi::paths::IndexLayout;
use crate::ligi::render::{
    IndexScope, parse_master_tags, parse_tag_page_files, render_empty_tag_page,
    render_master_index, render_tag_page,
};
use crate::ligi::tag_map::TagMap;
use crate::ligi::util::{WriteStatus, read_index_file, write_if_changed};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexWriteStats {
    pub tags: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub tombstoned: usize,
}

impl IndexWriteStats {
    pub fn record(&mut self, status: WriteStatus) {
        match status {
            WriteStatus::Created => self.created += 1,
            WriteStatus::Updated => self.updated += 1,
            WriteStatus::Unchanged => self.unchanged += 1,
        }
    }

    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}

/// Tags currently listed in the master index; empty when there is none yet.
pub fn read_master_tags(layout: &IndexLayout) -> Result<Vec<String>> {
    Ok(read_index_file(&layout.master_index)?
        .map(|raw| parse_master_tags(&raw))
        .unwrap_or_default())
}

pub fn read_tag_page(layout: &IndexLayout, tag: &str) -> Result<Vec<String>> {
    Ok(read_index_file(&layout.tag_page(tag))?
        .map(|raw| parse_tag_page_files(&raw))
        .unwrap_or_default())
}

/// Rebuild the map an index describes.
pub fn load_tag_map(layout: &IndexLayout) -> Result<TagMap> {
    let mut map = TagMap::new();
    for tag in read_master_tags(layout)? {
        for file in read_tag_page(layout, &tag)? {
            map.add_file(&tag, &file);
        }
    }
    Ok(map)
}

pub fn write_tombstone(
    layout: &IndexLayout,
    tag: &str,
    scope: IndexScope,
) -> Result<WriteStatus> {
    write_if_changed(&layout.tag_page(tag), &render_empty_tag_page(tag, scope))
}

pub fn write_index(layout: &IndexLayout, map: &TagMap, scope: IndexScope) -> Result<IndexWriteStats> {
    fs::create_dir_all(&layout.tags_dir)
        .with_context(|| format!("failed to create {}", layout.tags_dir.display()))?;

    let prior_tags = read_master_tags(layout)?;
    let mut stats = IndexWriteStats {
        tags: map.tag_count(),
        ..IndexWriteStats::default()
    };

    stats.record(write_if_changed(
        &layout.master_index,
        &render_master_index(map),
    )?);

    for tag in map.sorted_tags() {
        let page = render_tag_page(tag, &map.sorted_files(tag), scope);
        stats.record(write_if_changed(&layout.tag_page(tag), &page)?);
    }

    for tag in prior_tags.iter().filter(|tag| !map.contains_tag(tag)) {
        stats.record(write_tombstone(layout, tag, scope)?);
        stats.tombstoned += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_map() -> TagMap {
        let mut map = TagMap::new();
        map.add_file("alpha", "art/a.md");
        map.add_file("area/infra", "art/notes/b.md");
        map
    }

    #[test]
    fn rewrite_with_same_map_writes_nothing() {
        let tmp = tempdir().expect("tempdir");
        let layout = IndexLayout::for_art_root(&tmp.path().join("art"));
        let map = sample_map();

        let first = write_index(&layout, &map, IndexScope::Local).expect("first");
        assert_eq!(first.created, 3);

        let second = write_index(&layout, &map, IndexScope::Local).expect("second");
        assert_eq!(second.writes(), 0);
        assert_eq!(second.unchanged, 3);
    }

    #[test]
    fn dropped_tag_leaves_empty_page() {
        let tmp = tempdir().expect("tempdir");
        let layout = IndexLayout::for_art_root(&tmp.path().join("art"));
        write_index(&layout, &sample_map(), IndexScope::Local).expect("first");

        let mut map = TagMap::new();
        map.add_file("alpha", "art/a.md");
        let stats = write_index(&layout, &map, IndexScope::Local).expect("second");

        assert_eq!(stats.tombstoned, 1);
        let page = layout.tag_page("area/infra");
        assert!(page.exists());
        assert!(read_tag_page(&layout, "area/infra").expect("read").is_empty());
        assert_eq!(read_master_tags(&layout).expect("master"), vec!["alpha"]);
    }

    #[test]
    fn load_reproduces_written_map() {
        let tmp = tempdir().expect("tempdir");
        let layout = IndexLayout::for_art_root(&tmp.path().join("art"));
        let map = sample_map();
        write_index(&layout, &map, IndexScope::Local).expect("write");

        assert_eq!(load_tag_map(&layout).expect("load"), map);
    }
}
