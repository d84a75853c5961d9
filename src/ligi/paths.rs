use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LigiError;

pub const ART_DIR: &str = "art";
pub const INDEX_DIR: &str = "index";
pub const MASTER_INDEX_FILE: &str = "ligi_tags.md";
pub const TAGS_DIR: &str = "tags";

#[derive(Debug, Clone)]
pub struct LigiPaths {
    pub ligi_home: PathBuf,
    pub global_art_root: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(LigiError::GlobalHomeUnavailable("HOME directory could not be resolved".into()).into())
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<LigiPaths> {
    let ligi_home = match env::var("LIGI_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".ligi"),
    };

    let global_art_root = env_or_default_path("LIGI_GLOBAL_ART", ligi_home.join(ART_DIR));
    let logs_dir = env_or_default_path("LIGI_LOGS_DIR", ligi_home.join("logs"));
    let config_file = env_or_default_path("LIGI_CONFIG_PATH", ligi_home.join("config.toml"));

    Ok(LigiPaths {
        ligi_home,
        global_art_root,
        logs_dir,
        config_file,
    })
}

/// On-disk locations of one index (local or global) below an art root.
#[derive(Debug, Clone)]
pub struct IndexLayout {
    pub art_root: PathBuf,
    pub index_dir: PathBuf,
    pub master_index: PathBuf,
    pub tags_dir: PathBuf,
}

impl IndexLayout {
    pub fn for_art_root(art_root: &Path) -> Self {
        let index_dir = art_root.join(INDEX_DIR);
        Self {
            art_root: art_root.to_path_buf(),
            master_index: index_dir.join(MASTER_INDEX_FILE),
            tags_dir: index_dir.join(TAGS_DIR),
            index_dir,
        }
    }

    /// `tags/area/infra.md` for tag `area/infra`. Callers pass validated names.
    pub fn tag_page(&self, tag: &str) -> PathBuf {
        let mut path = self.tags_dir.clone();
        let mut segments = tag.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.md"));
            }
        }
        path
    }
}

/// Accept either a repository root or its `art` directory.
///
/// The result is canonical, so `.` inside `art/` and a bare `art` both
/// resolve to a path with a real parent.
pub fn resolve_art_root(root: &Path) -> Result<PathBuf> {
    let Ok(root) = fs::canonicalize(root) else {
        return Err(LigiError::MissingArtRoot(root.to_path_buf()).into());
    };
    if root.file_name().is_some_and(|name| name == ART_DIR) && root.is_dir() {
        return Ok(root);
    }
    let art = root.join(ART_DIR);
    if art.is_dir() {
        return Ok(art);
    }
    Err(LigiError::MissingArtRoot(root).into())
}

/// Absolute form of a document path with its directory canonicalized.
///
/// The file itself may be gone; only its parent has to exist for the
/// symlinks on the way to be resolved.
pub fn document_path(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    let (Some(parent), Some(name)) = (abs.parent(), abs.file_name()) else {
        return Ok(abs);
    };
    match fs::canonicalize(parent) {
        Ok(dir) => Ok(dir.join(name)),
        Err(_) => Ok(abs),
    }
}

/// Repository root owning an art directory.
pub fn repo_root_of(art_root: &Path) -> PathBuf {
    art_root
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| art_root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn nested_tag_maps_to_nested_page() {
        let layout = IndexLayout::for_art_root(Path::new("/r/art"));
        assert_eq!(
            layout.tag_page("area/infra"),
            PathBuf::from("/r/art/index/tags/area/infra.md")
        );
        assert_eq!(
            layout.master_index,
            PathBuf::from("/r/art/index/ligi_tags.md")
        );
    }

    #[test]
    fn art_root_resolves_from_repo_or_art_dir() {
        let tmp = tempdir().expect("tempdir");
        let art = tmp.path().join("art");
        std::fs::create_dir_all(&art).expect("mkdir");

        let canon = fs::canonicalize(&art).expect("canon");

        assert_eq!(resolve_art_root(tmp.path()).expect("repo root"), canon);
        assert_eq!(resolve_art_root(&art).expect("art root"), canon);
        assert_eq!(
            resolve_art_root(&art.join("..").join("art")).expect("dotted"),
            canon
        );
        assert!(resolve_art_root(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn document_path_survives_a_deleted_file() {
        let tmp = tempdir().expect("tempdir");
        let art = tmp.path().join("art");
        std::fs::create_dir_all(&art).expect("mkdir");

        let resolved = document_path(&art.join("gone.md")).expect("doc path");
        assert_eq!(
            resolved,
            fs::canonicalize(&art).expect("canon").join("gone.md")
        );
    }

    #[test]
    fn resolved_art_root_has_a_repo_parent() {
        let tmp = tempdir().expect("tempdir");
        let art = tmp.path().join("art");
        std::fs::create_dir_all(&art).expect("mkdir");

        let resolved = resolve_art_root(&art).expect("art root");
        assert!(resolved.is_absolute());
        assert_eq!(
            repo_root_of(&resolved),
            fs::canonicalize(tmp.path()).expect("canon")
        );
    }
}
