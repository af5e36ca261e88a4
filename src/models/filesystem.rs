//! Virtual filesystem tree nodes.
//!
//! The tree is owned by the desktop store; the shell reads snapshots of it and
//! changes it only through the store's mutators.

use serde::{Deserialize, Serialize};

/// Node type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsKind {
    File,
    Folder,
}

/// A file or folder in the virtual filesystem.
///
/// `path` is absolute and normalized; `name` is its last segment (empty for
/// the root).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FsItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FsKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FsItem>,
    /// Last modification time, Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
}

impl FsItem {
    /// The `/` directory.
    pub fn root(children: Vec<FsItem>) -> Self {
        Self::folder("/", children)
    }

    pub fn folder(path: impl Into<String>, children: Vec<FsItem>) -> Self {
        let path = path.into();
        Self {
            name: last_segment(&path).to_string(),
            path,
            kind: FsKind::Folder,
            content: None,
            children,
            modified: None,
        }
    }

    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: last_segment(&path).to_string(),
            path,
            kind: FsKind::File,
            content: Some(content.into()),
            children: Vec::new(),
            modified: None,
        }
    }

    pub fn with_modified(mut self, timestamp_ms: u64) -> Self {
        self.modified = Some(timestamp_ms);
        self
    }

    /// Parse a tree exported by the host as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FsKind::Folder
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == FsKind::File
    }

    /// Dotfiles are hidden from plain listings.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Content length in bytes (0 for folders).
    pub fn size(&self) -> u64 {
        self.content.as_ref().map_or(0, |c| c.len() as u64)
    }

    pub fn child(&self, name: &str) -> Option<&FsItem> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Last `/`-separated segment of a path.
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}
