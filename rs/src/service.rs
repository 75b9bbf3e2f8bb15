use std::sync::Arc;

use crate::error::{Error, RemoteError, Result};
use crate::namer::{resolve, version_of};
use crate::paths::{join, natural_sort, normalize_path, reject_traversal, split_parent};
use crate::remote::Remote;
use crate::store::VersionStore;
use crate::sync::{reconcile, RemoteSyncOutcome};
use crate::types::{DeleteReceipt, DirListing, FileRecord, Root, SaveRequest, UploadReceipt};

/// Version-aware file operations over a [`VersionStore`], with optional
/// mirroring of saves to a [`Remote`].
///
/// Cheap to clone (`Arc` internally). Built once at startup; holds no other
/// state.
#[derive(Clone)]
pub struct FileService {
    store: VersionStore,
    remote: Option<Arc<dyn Remote>>,
}

impl FileService {
    pub fn new(store: VersionStore) -> Self {
        Self {
            store,
            remote: None,
        }
    }

    /// Mirror saves to `remote`.
    pub fn with_remote(mut self, remote: Arc<dyn Remote>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn remote(&self) -> Option<&dyn Remote> {
        self.remote.as_deref()
    }

    // -- List / read --------------------------------------------------------

    /// List the versioned root when `editable`, else the source root.
    pub fn list(&self, editable: bool) -> Result<DirListing> {
        let files = self.store.list(Root::from_editable(editable))?;
        Ok(DirListing {
            dirname: "/".into(),
            files,
        })
    }

    /// Find the stored file a read of `path` refers to.
    ///
    /// An exact match wins. In the versioned root a miss falls back to the
    /// latest saved version of the same file.
    pub fn locate(&self, path: &str, editable: bool) -> Result<(Root, String)> {
        let path = normalize_path(path)?;
        let root = Root::from_editable(editable);
        if !path.is_empty() && self.store.is_file(root, &path)? {
            return Ok((root, path));
        }
        if editable && !path.is_empty() {
            if let Some(latest) = self.store.find_latest_version(&path)? {
                log::debug!("{} resolved to latest version {}", path, latest);
                return Ok((root, latest));
            }
        }
        let (_, file_name) = split_parent(&path);
        Err(Error::not_found(format!("Could not read {}", file_name)))
    }

    /// Read a file wrapped with its decoded version.
    pub fn read(&self, path: &str, editable: bool) -> Result<FileRecord> {
        let (root, found) = self.locate(path, editable)?;
        let content = self.store.read(root, &found)?;
        let version = version_of(&found);
        Ok(FileRecord::new(found, version_i64(version), Some(content)))
    }

    /// Read a file's raw bytes for download. Returns the resolved path too.
    pub fn read_raw(&self, path: &str, editable: bool) -> Result<(String, Vec<u8>)> {
        let (root, found) = self.locate(path, editable)?;
        let data = self.store.read_bytes(root, &found)?;
        Ok((found, data))
    }

    // -- Delete -------------------------------------------------------------

    /// Delete a file or empty directory. Only the versioned root is mutable.
    pub fn delete(&self, path: &str, editable: bool) -> Result<DeleteReceipt> {
        reject_traversal(path)?;
        if !editable {
            return Err(Error::forbidden(format!(
                "Forbidden access: [{}] is not editable",
                path
            )));
        }
        let removal = self.store.delete(path)?;
        log::info!("delete {}: {:?}", path, removal);
        Ok(DeleteReceipt {
            name: path.to_string(),
            deleted: true,
        })
    }

    // -- Save ---------------------------------------------------------------

    /// Save `request.content` as the next version of `request.name`.
    ///
    /// `dir` is the directory segment of the request URL; it is checked for
    /// traversal only, the name carries the full path.
    ///
    /// Nothing is written unless every check passes. Once the new version
    /// exists locally, a configured remote is reconciled and its outcome is
    /// reported in `commit`; remote problems never fail the save.
    pub fn save(&self, dir: &str, request: &SaveRequest) -> Result<FileRecord> {
        reject_traversal(dir)?;
        reject_traversal(&request.name)?;

        let res = resolve(&request.name)?;

        if res.requires_existing() && !self.store.is_file(Root::Versioned, &res.current_path)? {
            return Err(Error::conflict(format!(
                "Versioned File [{}] with version [{}] does not exist.",
                request.name, res.current_version
            )));
        }

        let already = || {
            Error::conflict(format!(
                "File [{}] with new version [{}] already exists.",
                request.name, res.next_version
            ))
        };
        if self.store.exists(Root::Versioned, &res.next_path)? {
            return Err(already());
        }
        self.store
            .write(&res.next_path, &request.content)
            .map_err(|e| match e {
                Error::Conflict(_) => already(),
                other => other,
            })?;
        log::info!("saved {} as version {}", res.next_path, res.next_version);

        let outcome = match self.remote() {
            Some(remote) => match self.prior_content(res.current_root, &res.current_path) {
                Ok(prior) => {
                    let message = format!("Updating versioned file [{}]", res.next_path);
                    reconcile(
                        Some(remote),
                        &res.canonical,
                        &request.content,
                        prior.as_deref(),
                        &message,
                    )
                }
                Err(e) => {
                    log::warn!("not syncing {}: {}", res.canonical, e);
                    RemoteSyncOutcome::FetchFailed(e)
                }
            },
            None => RemoteSyncOutcome::Skipped,
        };

        Ok(FileRecord {
            name: res.next_path,
            version: Some(version_i64(res.next_version)),
            content: None,
            commit: outcome.status(),
            commit_diff: outcome.diff().cloned(),
        })
    }

    /// Content of the copy an edit was based on, `None` when there is none.
    ///
    /// A copy that exists but cannot be read as text is an error, so the
    /// remote is never written without its divergence check.
    fn prior_content(
        &self,
        root: Root,
        path: &str,
    ) -> std::result::Result<Option<String>, RemoteError> {
        let unreadable = |e: Error| {
            RemoteError::failed(format!("cannot read prior copy {} ({} root): {}", path, root, e))
        };
        if !self.store.is_file(root, path).map_err(unreadable)? {
            return Ok(None);
        }
        self.store.read(root, path).map(Some).map_err(unreadable)
    }

    // -- Upload -------------------------------------------------------------

    /// Add a new text file to the source root.
    ///
    /// `file_name` must be a bare name. Non-UTF-8 content is refused.
    pub fn upload(&self, dir: &str, file_name: &str, data: &[u8]) -> Result<()> {
        reject_traversal(dir)?;
        reject_traversal(file_name)?;
        if file_name.is_empty() || file_name.contains('/') {
            return Err(Error::forbidden(format!(
                "Forbidden file name [{}]",
                file_name
            )));
        }
        if std::str::from_utf8(data).is_err() {
            return Err(Error::forbidden(format!(
                "Forbidden File Type [{}]",
                file_name
            )));
        }

        let dir = normalize_path(dir)?;
        self.store
            .create(Root::Source, &join(&dir, file_name), data)
            .map_err(|e| match e {
                Error::Conflict(_) => Error::conflict(format!(
                    "File [{}] already exists at [{}].",
                    file_name, dir
                )),
                other => other,
            })?;
        log::info!("uploaded {} into [{}]", file_name, dir);
        Ok(())
    }

    /// Upload several files; stops at the first failure.
    pub fn upload_all<'a, I>(&self, dir: &str, files: I) -> Result<UploadReceipt>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut filenames = Vec::new();
        for (name, data) in files {
            self.upload(dir, name, data)?;
            filenames.push(name.to_string());
        }
        Ok(UploadReceipt {
            dirpath: dir.to_string(),
            filenames,
        })
    }

    // -- Remote -------------------------------------------------------------

    fn require_remote(&self) -> Result<&dyn Remote> {
        self.remote()
            .ok_or_else(|| Error::not_found("No Git Repository configured"))
    }

    /// List every file in the remote repository.
    pub fn remote_list(&self) -> Result<DirListing> {
        let mut files = self.require_remote()?.list_tree().map_err(remote_error)?;
        natural_sort(&mut files);
        Ok(DirListing {
            dirname: "/".into(),
            files,
        })
    }

    /// Read a file straight from the remote. Version is reported as -1.
    pub fn remote_read(&self, path: &str) -> Result<FileRecord> {
        let path = normalize_path(path)?;
        let content = self.require_remote()?.fetch(&path).map_err(remote_error)?;
        Ok(FileRecord::new(path, -1, Some(content)))
    }
}

fn remote_error(e: RemoteError) -> Error {
    match e {
        RemoteError::NotFound(path) => Error::not_found(format!("Could not read {} from Git", path)),
        other => Error::Remote(other),
    }
}

fn version_i64(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}
