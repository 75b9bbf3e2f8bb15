//! Path-encoded version naming.
//!
//! A version lives in the final path segment, either as a bare numeric
//! suffix (`notes.3`) or as a numeric segment right before the extension
//! (`main.3.py`). Only the final segment is inspected, so directories with
//! dots in their names are never split.
//!
//! The scheme is inherently ambiguous for names whose last dot-segment is
//! numeric for unrelated reasons: `report.2024` reads as version 2024 of
//! `report`.

use crate::error::{Error, Result};
use crate::paths::{join, normalize_path, split_parent};
use crate::types::Root;

/// A decomposed version-aware path.
///
/// `ext` keeps its leading dot (`".py"`) and is empty for bare-suffix names.
/// Version 0 is the unversioned form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedPath {
    pub dir: String,
    pub base: String,
    pub version: u64,
    pub ext: String,
}

impl VersionedPath {
    pub fn new(
        dir: impl Into<String>,
        base: impl Into<String>,
        version: u64,
        ext: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            version,
            ext: ext.into(),
        }
    }

    /// Split `path` into directory, base, version and extension.
    ///
    /// Pure; never touches the filesystem. `path` is expected to be
    /// normalized already.
    pub fn decompose(path: &str) -> Self {
        let (dir, file) = split_parent(path);

        // Leading dots belong to the name (`.env`), not to an extension.
        let body_start = file.len() - file.trim_start_matches('.').len();
        let (prefix, body) = file.split_at(body_start);
        let parts: Vec<&str> = body.split('.').collect();
        let n = parts.len();

        if n == 1 {
            return Self::new(dir, file, 0, "");
        }

        let head = |upto: usize| format!("{}{}", prefix, parts[..upto].join("."));

        if let Some(version) = parse_version(parts[n - 1]) {
            return Self::new(dir, head(n - 1), version, "");
        }

        let ext = format!(".{}", parts[n - 1]);
        if let Some(version) = parse_version(parts[n - 2]) {
            return Self::new(dir, head(n - 2), version, ext);
        }

        Self::new(dir, head(n - 1), 0, ext)
    }

    /// Render back to a relative path.
    ///
    /// An empty base (`7.txt` decomposes to base `""`, version 7) renders
    /// without a leading separator: `8.txt` at version 8, `txt` unversioned.
    pub fn compose(&self) -> String {
        let mut file = self.base.clone();
        if self.version > 0 {
            if !file.is_empty() && !file.ends_with('.') {
                file.push('.');
            }
            file.push_str(&self.version.to_string());
        }
        if file.is_empty() || file.ends_with('.') {
            file.push_str(self.ext.trim_start_matches('.'));
        } else {
            file.push_str(&self.ext);
        }
        join(&self.dir, &file)
    }

    /// Same path at another version.
    pub fn with_version(&self, version: u64) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// The unversioned name: the key shared by every version of a file.
    pub fn canonical(&self) -> String {
        self.with_version(0).compose()
    }

    /// Whether `other` is a version of the same logical file.
    pub fn same_file(&self, other: &VersionedPath) -> bool {
        self.dir == other.dir && self.base == other.base && self.ext == other.ext
    }
}

fn parse_version(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Decoded version of a file name (0 when it carries none).
pub fn version_of(path: &str) -> u64 {
    VersionedPath::decompose(path).version
}

/// Everything a save needs to know about a logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Root holding the copy this edit is based on.
    pub current_root: Root,
    /// Path of that copy, relative to `current_root`.
    pub current_path: String,
    /// Path the new version will be written to, in the versioned root.
    pub next_path: String,
    pub canonical: String,
    pub current_version: u64,
    pub next_version: u64,
}

impl Resolution {
    /// A versioned name must refer to a version that was actually saved.
    pub fn requires_existing(&self) -> bool {
        self.current_root == Root::Versioned
    }
}

/// Resolve a logical file name into current/next paths.
///
/// Unversioned names (`readme`, `main.py`, `archive.tar.gz`) are based on the
/// source-root copy and get version 1. Versioned names (`readme.1`,
/// `main.2.py`) are based on that version in the versioned root and get the
/// next integer.
///
/// # Errors
/// [`Error::Forbidden`] on traversal, [`Error::InvalidPath`] for an empty
/// name or an exhausted version counter.
pub fn resolve(name: &str) -> Result<Resolution> {
    let name = normalize_path(name)?;
    if name.is_empty() {
        return Err(Error::invalid_path("file name must not be empty"));
    }

    let current = VersionedPath::decompose(&name);
    let next_version = current
        .version
        .checked_add(1)
        .ok_or_else(|| Error::invalid_path(format!("version of [{}] is too large", name)))?;

    let current_root = if current.version == 0 {
        Root::Source
    } else {
        Root::Versioned
    };

    log::debug!(
        "resolved {} -> v{} ({}), next v{}",
        name,
        current.version,
        current_root,
        next_version
    );

    Ok(Resolution {
        current_root,
        next_path: current.with_version(next_version).compose(),
        canonical: current.canonical(),
        current_version: current.version,
        next_version,
        current_path: name,
    })
}
