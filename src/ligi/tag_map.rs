use std::collections::BTreeMap;

/// Tag name to the files carrying it.
///
/// File lists keep insertion order and never hold duplicates; renderers go
/// through [`TagMap::sorted_files`] so output does not depend on scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    tags: BTreeMap<String, Vec<String>>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, tag: &str, file_ref: &str) {
        let files = self.tags.entry(tag.to_string()).or_default();
        if !files.iter().any(|existing| existing == file_ref) {
            files.push(file_ref.to_string());
        }
    }

    /// Drop `file_ref` from every tag; tags left without files disappear.
    pub fn remove_file(&mut self, file_ref: &str) {
        for files in self.tags.values_mut() {
            files.retain(|existing| existing != file_ref);
        }
        self.tags.retain(|_, files| !files.is_empty());
    }

    pub fn sorted_tags(&self) -> Vec<&str> {
        self.tags.keys().map(String::as_str).collect()
    }

    pub fn sorted_files(&self, tag: &str) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .tags
            .get(tag)
            .map(|files| files.iter().map(String::as_str).collect())
            .unwrap_or_default();
        files.sort_unstable();
        files.dedup();
        files
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Number of distinct file references across all tags.
    pub fn file_count(&self) -> usize {
        let mut all: Vec<&str> = self.tags.values().flatten().map(String::as_str).collect();
        all.sort_unstable();
        all.dedup();
        all.len()
    }

    /// Rewrite every file reference through `f`, keeping set semantics.
    pub fn map_refs(&self, mut f: impl FnMut(&str) -> String) -> TagMap {
        let mut out = TagMap::new();
        for (tag, files) in &self.tags {
            for file in files {
                out.add_file(tag, &f(file));
            }
        }
        out
    }

    pub fn merge(&mut self, other: &TagMap) {
        for (tag, files) in &other.tags {
            for file in files {
                self.add_file(tag, file);
            }
        }
    }
}
