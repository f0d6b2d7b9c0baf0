//! Logical-to-physical path translation.

use std::path::Path;

use thiserror::Error;

use crate::directive::{self, Directive};

/// Buffer capacity for a translated path, in bytes, counting the terminator.
/// A usable path is at most `MAX_PATH_LEN - 1` bytes long.
pub const MAX_PATH_LEN: usize = 4096;

/// Storage-layer directive naming the local root prefix.
pub const LOCALROOT_DIRECTIVE: &str = "oss.localroot";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("invalid logical path {0:?}")]
    InvalidPath(String),

    #[error("translated path needs {needed} bytes, capacity is {capacity}")]
    NameTooLong { needed: usize, capacity: usize },
}

/// Translates logical file names into paths on the local filesystem.
pub trait PathMapper: Send + Sync {
    /// Translate `path`, failing unless the result is shorter than `capacity`.
    fn lfn_to_pfn(&self, path: &str, capacity: usize) -> Result<String, MapError>;
}

/// Prepends the configured local root to logical paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalRootMapper {
    local_root: Option<String>,
}

impl LocalRootMapper {
    pub fn new(local_root: Option<String>) -> Self {
        // "/data/" + "/f" would otherwise produce "//f".
        let local_root = local_root
            .map(|root| root.trim_end_matches('/').to_string())
            .filter(|root| !root.is_empty());
        Self { local_root }
    }

    /// Read `oss.localroot` from a directive file; no file means no prefix.
    pub fn load(path: &Path) -> Self {
        let directives = directive::load_or_empty(path);
        let local_root = directive::last_named(&directives, LOCALROOT_DIRECTIVE)
            .and_then(Directive::value)
            .map(str::to_string);
        Self::new(local_root)
    }

    pub fn local_root(&self) -> Option<&str> {
        self.local_root.as_deref()
    }
}

impl PathMapper for LocalRootMapper {
    fn lfn_to_pfn(&self, path: &str, capacity: usize) -> Result<String, MapError> {
        if !path.starts_with('/') {
            return Err(MapError::InvalidPath(path.to_string()));
        }
        let root = self.local_root.as_deref().unwrap_or("");
        let needed = root.len() + path.len();
        if needed >= capacity {
            return Err(MapError::NameTooLong { needed, capacity });
        }
        Ok(format!("{root}{path}"))
    }
}
