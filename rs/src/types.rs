use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Which of the two directory trees an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// Original uploads. Never modified by saves.
    Source,
    /// Every saved version.
    Versioned,
}

impl Root {
    /// Root selected by the `editable` flag of the HTTP surface.
    pub fn from_editable(editable: bool) -> Self {
        if editable {
            Self::Versioned
        } else {
            Self::Source
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Versioned => f.write_str("versioned"),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// A file as returned to callers, and the body of a save request.
///
/// `content` is always serialized, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(
        default,
        rename = "commitDiff",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit_diff: Option<[String; 2]>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, version: i64, content: Option<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
            content,
            commit: None,
            commit_diff: None,
        }
    }
}

/// Body of a save request. Other fields a client echoes back are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveRequest {
    pub name: String,
    pub content: String,
}

/// Listing of one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirListing {
    pub dirname: String,
    pub files: Vec<String>,
}

/// Result of a delete. `deleted` is true even when nothing was there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReceipt {
    pub name: String,
    pub deleted: bool,
}

/// Result of an upload into the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub dirpath: String,
    pub filenames: Vec<String>,
}

// ---------------------------------------------------------------------------
// Signature / OpenOptions
// ---------------------------------------------------------------------------

/// Author/committer identity for remote commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            name: "verstore".into(),
            email: "verstore@localhost".into(),
        }
    }
}

/// Options for opening or creating a [`crate::GitRemote`].
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Create a bare repository if none exists at the path.
    pub create: bool,
    /// Branch commits go to. Defaults to `main`.
    pub branch: Option<String>,
    /// Default author name.
    pub author: Option<String>,
    /// Default author email.
    pub email: Option<String>,
}
