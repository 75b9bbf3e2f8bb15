use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::namer::VersionedPath;
use crate::paths::{join, natural_sort, normalize_path};
use crate::types::Root;

/// What [`VersionStore::delete`] found at the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Absent,
    File,
    Directory,
}

/// Filesystem-backed store over a source root and a versioned root.
///
/// Cheap to clone. Holds no state beyond the two root paths; every call goes
/// straight to the filesystem.
#[derive(Debug, Clone)]
pub struct VersionStore {
    source: PathBuf,
    versioned: PathBuf,
}

impl VersionStore {
    pub fn new(source: impl Into<PathBuf>, versioned: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            versioned: versioned.into(),
        }
    }

    /// Directory on disk backing `root`.
    pub fn root_dir(&self, root: Root) -> &Path {
        match root {
            Root::Source => &self.source,
            Root::Versioned => &self.versioned,
        }
    }

    /// Validate `rel` and map it under `root`.
    ///
    /// Callers validate first; this re-checks and fails closed.
    fn locate(&self, root: Root, rel: &str) -> Result<(String, PathBuf)> {
        let rel = normalize_path(rel)?;
        if rel.is_empty() {
            return Err(Error::invalid_path("path must not be empty"));
        }
        let full = self.root_dir(root).join(&rel);
        Ok((rel, full))
    }

    // -- Read ---------------------------------------------------------------

    /// Recursively list files under `root` in natural order.
    ///
    /// Files whose name starts with `_` or `.` are skipped.
    pub fn list(&self, root: Root) -> Result<Vec<String>> {
        let dir = self.root_dir(root);
        if !dir.is_dir() {
            return Err(Error::not_found(format!("Could not read {} root", root)));
        }
        let mut results = Vec::new();
        walk_disk(dir, "", &mut results)?;
        natural_sort(&mut results);
        Ok(results)
    }

    /// Returns `true` if `rel` exists under `root` (file or directory).
    pub fn exists(&self, root: Root, rel: &str) -> Result<bool> {
        let (_, full) = self.locate(root, rel)?;
        Ok(full.exists())
    }

    /// Returns `true` if `rel` is a regular file under `root`.
    pub fn is_file(&self, root: Root, rel: &str) -> Result<bool> {
        let (_, full) = self.locate(root, rel)?;
        Ok(full.is_file())
    }

    /// Read raw bytes at `rel`.
    pub fn read_bytes(&self, root: Root, rel: &str) -> Result<Vec<u8>> {
        let (rel, full) = self.locate(root, rel)?;
        if !full.is_file() {
            return Err(Error::not_found(format!("Could not read {}", rel)));
        }
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(format!("Could not read {}", rel)),
            _ => Error::io(&full, e),
        })
    }

    /// Read UTF-8 text at `rel`.
    pub fn read(&self, root: Root, rel: &str) -> Result<String> {
        let data = self.read_bytes(root, rel)?;
        String::from_utf8(data).map_err(|_| {
            Error::invalid_path(format!("File [{}] is not valid UTF-8 text", rel))
        })
    }

    /// Find the highest saved version of the file `rel` refers to.
    ///
    /// Scans the directory of `rel` in the versioned root for names with the
    /// same base and extension. Returns `None` when the directory is missing
    /// or holds no candidates.
    pub fn find_latest_version(&self, rel: &str) -> Result<Option<String>> {
        let (rel, _) = self.locate(Root::Versioned, rel)?;
        let target = VersionedPath::decompose(&rel);
        let dir = self.versioned.join(&target.dir);
        if !dir.is_dir() {
            return Ok(None);
        }

        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&dir, e)),
        };

        let mut best: Option<VersionedPath> = None;
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::io(&dir, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with(".tmp") || !entry.path().is_file() {
                continue;
            }
            let candidate = VersionedPath::decompose(&join(&target.dir, &name));
            if !candidate.same_file(&target) {
                continue;
            }
            if best.as_ref().map_or(true, |b| candidate.version > b.version) {
                best = Some(candidate);
            }
        }

        Ok(best.map(|b| b.compose()))
    }

    // -- Write --------------------------------------------------------------

    /// Create a new version file in the versioned root.
    pub fn write(&self, rel: &str, content: &str) -> Result<()> {
        self.create(Root::Versioned, rel, content.as_bytes())
    }

    /// Create `rel` under `root` with `data`, failing if it already exists.
    ///
    /// Parent directories are created as needed. The data is staged in a
    /// hidden temp file next to the target and linked into place without
    /// clobbering, so the target appears with its full content or not at
    /// all. Losing a race to another writer yields [`Error::Conflict`].
    pub fn create(&self, root: Root, rel: &str, data: &[u8]) -> Result<()> {
        let (rel, full) = self.locate(root, rel)?;
        let parent = full
            .parent()
            .ok_or_else(|| Error::invalid_path(format!("path [{}] has no parent", rel)))?;
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| Error::io(parent, e))?;
        staged
            .write_all(data)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| Error::io(staged.path(), e))?;
        set_default_mode(staged.as_file()).map_err(|e| Error::io(&full, e))?;

        staged.persist_noclobber(&full).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                Error::conflict(format!("File [{}] already exists.", rel))
            } else {
                Error::io(&full, e.error)
            }
        })?;
        log::debug!("created {} in {} root ({} bytes)", rel, root, data.len());
        Ok(())
    }

    /// Delete a file, or a directory if it is empty, from the versioned root.
    ///
    /// A missing path is not an error.
    pub fn delete(&self, rel: &str) -> Result<Removal> {
        let (rel, full) = self.locate(Root::Versioned, rel)?;
        let meta = match std::fs::symlink_metadata(&full) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Removal::Absent),
            Err(e) => return Err(Error::io(&full, e)),
        };

        if meta.is_dir() {
            let mut entries = std::fs::read_dir(&full).map_err(|e| Error::io(&full, e))?;
            if entries.next().is_some() {
                return Err(Error::directory_not_empty(rel));
            }
            std::fs::remove_dir(&full).map_err(|e| Error::io(&full, e))?;
            Ok(Removal::Directory)
        } else {
            match std::fs::remove_file(&full) {
                Ok(()) => Ok(Removal::File),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Removal::Absent),
                Err(e) => Err(Error::io(&full, e)),
            }
        }
    }
}

#[cfg(unix)]
fn set_default_mode(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_mode(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

fn walk_disk(dir: &Path, prefix: &str, results: &mut Vec<String>) -> Result<()> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(dir, e)),
    };

    for entry in read_dir {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = join(prefix, &name);

        // Symlinked directories are not followed.
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        if file_type.is_dir() {
            walk_disk(&path, &rel, results)?;
        } else if file_type.is_symlink() && path.is_dir() {
            continue;
        } else if !is_hidden(&name) {
            results.push(rel);
        }
    }
    Ok(())
}
