use std::path::PathBuf;

use thiserror::Error;

pub const MAX_TAG_LEN: usize = 255;

/// Why a captured `[[t/...]]` name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagNameError {
    #[error("tag name is empty")]
    Empty,
    #[error("tag name is {len} bytes, limit is 255")]
    TooLong { len: usize },
    #[error("tag name contains `..`")]
    PathTraversal,
    #[error("tag name contains invalid character {0:?}")]
    InvalidChar(char),
    #[error("tag name has an empty or `.` path segment")]
    InvalidSegment,
}

#[derive(Debug, Error)]
pub enum LigiError {
    #[error("no art directory found under {}", .0.display())]
    MissingArtRoot(PathBuf),
    #[error("global ligi home is not accessible: {0}")]
    GlobalHomeUnavailable(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("malformed index file {}: {reason}", .path.display())]
    MalformedIndex { path: PathBuf, reason: String },
}
