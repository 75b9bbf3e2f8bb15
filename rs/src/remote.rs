//! The remote repository capability used for best-effort mirroring.

use crate::error::RemoteError;

/// A remote copy of the canonical (unversioned) files.
///
/// Paths are canonical names relative to the repository root. Every method
/// may fail; [`RemoteError::NotFound`] is the only failure callers tell
/// apart from the rest.
pub trait Remote: Send + Sync {
    /// Current content of `path`.
    fn fetch(&self, path: &str) -> Result<String, RemoteError>;

    /// Add a new file. Returns the commit id.
    fn create(&self, path: &str, content: &str, message: &str) -> Result<String, RemoteError>;

    /// Replace an existing file.
    ///
    /// Returns `None` without committing when the content is unchanged, and
    /// [`RemoteError::NotFound`] when `path` does not exist.
    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<Option<String>, RemoteError>;

    /// Every file path in the repository.
    fn list_tree(&self) -> Result<Vec<String>, RemoteError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "remote".to_string()
    }
}
