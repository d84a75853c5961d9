use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::LigiError;

pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Created,
    Updated,
    Unchanged,
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Write `content` to `path` unless the file already holds exactly those
/// bytes. Unchanged files are not touched, so their mtime survives.
pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteStatus> {
    let status = match fs::read(path) {
        Ok(existing) => {
            if digest(&existing) == digest(content.as_bytes()) {
                return Ok(WriteStatus::Unchanged);
            }
            WriteStatus::Updated
        }
        Err(err) if err.kind() == ErrorKind::NotFound => WriteStatus::Created,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(status)
}

/// Read an index file; `None` when it does not exist yet.
pub fn read_index_file(path: &Path) -> Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let text = String::from_utf8(bytes).map_err(|_| LigiError::MalformedIndex {
        path: path.to_path_buf(),
        reason: "not valid UTF-8".to_string(),
    })?;
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_identical_write_is_skipped() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("nested/dir/page.md");

        assert_eq!(
            write_if_changed(&path, "hello\n").expect("first write"),
            WriteStatus::Created
        );
        let before = fs::metadata(&path).expect("meta").modified().expect("mtime");
        assert_eq!(
            write_if_changed(&path, "hello\n").expect("second write"),
            WriteStatus::Unchanged
        );
        let after = fs::metadata(&path).expect("meta").modified().expect("mtime");
        assert_eq!(before, after);

        assert_eq!(
            write_if_changed(&path, "changed\n").expect("third write"),
            WriteStatus::Updated
        );
    }

    #[test]
    fn missing_index_reads_as_none() {
        let tmp = tempdir().expect("tempdir");
        assert!(
            read_index_file(&tmp.path().join("absent.md"))
                .expect("read")
                .is_none()
        );
    }

    #[test]
    fn non_utf8_index_is_malformed() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("bad.md");
        fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");
        let err = read_index_file(&path).expect_err("should fail");
        assert!(err.to_string().contains("malformed index"));
    }
}
