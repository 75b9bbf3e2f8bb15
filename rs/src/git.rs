use std::path::{Path, PathBuf};
use std::sync::Mutex;

use git2::build::TreeUpdateBuilder;
use git2::{ErrorCode, FileMode, ObjectType, Repository, TreeWalkMode, TreeWalkResult};

use crate::error::{Error, RemoteError, Result};
use crate::lock::with_repo_lock;
use crate::remote::Remote;
use crate::types::{OpenOptions, Signature};

/// A [`Remote`] backed by a git repository on disk.
///
/// Each create or update is one commit on the configured branch. Commits are
/// serialized by an in-process mutex and a lock file in the git directory.
pub struct GitRemote {
    repo: Mutex<Repository>,
    path: PathBuf,
    branch: String,
    signature: Signature,
}

impl GitRemote {
    /// Open (or create) the repository at `path`.
    pub fn open(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let signature = Signature {
            name: options.author.unwrap_or_else(|| Signature::default().name),
            email: options.email.unwrap_or_else(|| Signature::default().email),
        };
        let branch = options.branch.unwrap_or_else(|| "main".into());
        if !git2::Reference::is_valid_name(&format!("refs/heads/{}", branch)) {
            return Err(Error::invalid_path(format!("invalid branch name [{}]", branch)));
        }

        let repo = if path.exists() {
            Repository::open(&path).map_err(RemoteError::git)?
        } else if options.create {
            std::fs::create_dir_all(&path).map_err(|e| Error::io(&path, e))?;
            let repo = Repository::init_bare(&path).map_err(RemoteError::git)?;
            repo.set_head(&format!("refs/heads/{}", branch))
                .map_err(RemoteError::git)?;
            repo
        } else {
            return Err(Error::not_found(format!(
                "repository not found: {}",
                path.display()
            )));
        };

        Ok(GitRemote {
            repo: Mutex::new(repo),
            path,
            branch,
            signature,
        })
    }

    /// Path to the repository on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    fn refname(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    /// Helper: lock the repo mutex and call `f` with the repository.
    fn with_repo<F, T>(&self, f: F) -> std::result::Result<T, RemoteError>
    where
        F: FnOnce(&Repository) -> std::result::Result<T, RemoteError>,
    {
        let repo = self
            .repo
            .lock()
            .map_err(|e| RemoteError::failed(e.to_string()))?;
        f(&repo)
    }

    /// Tip commit of the branch, `None` before the first commit.
    fn tip<'r>(
        &self,
        repo: &'r Repository,
    ) -> std::result::Result<Option<git2::Commit<'r>>, RemoteError> {
        match repo.find_reference(&self.refname()) {
            Ok(r) => r.peel_to_commit().map(Some).map_err(RemoteError::git),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(RemoteError::git(e)),
        }
    }

    /// Blob content at `path` on the branch tip.
    fn blob_at(
        &self,
        repo: &Repository,
        path: &str,
    ) -> std::result::Result<Option<Vec<u8>>, RemoteError> {
        let Some(commit) = self.tip(repo)? else {
            return Ok(None);
        };
        let tree = commit.tree().map_err(RemoteError::git)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(RemoteError::git(e)),
        };
        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }
        let blob = repo.find_blob(entry.id()).map_err(RemoteError::git)?;
        Ok(Some(blob.content().to_vec()))
    }

    /// Commit `content` at `path` on top of the branch tip.
    fn commit_file(
        &self,
        repo: &Repository,
        path: &str,
        content: &str,
        message: &str,
    ) -> std::result::Result<String, RemoteError> {
        let parent = self.tip(repo)?;
        let baseline = match &parent {
            Some(commit) => commit.tree().map_err(RemoteError::git)?,
            None => {
                let empty = repo
                    .treebuilder(None)
                    .and_then(|b| b.write())
                    .map_err(RemoteError::git)?;
                repo.find_tree(empty).map_err(RemoteError::git)?
            }
        };

        let blob = repo.blob(content.as_bytes()).map_err(RemoteError::git)?;
        let mut update = TreeUpdateBuilder::new();
        update.upsert(path, blob, FileMode::Blob);
        let tree_oid = update
            .create_updated(repo, &baseline)
            .map_err(RemoteError::git)?;
        let tree = repo.find_tree(tree_oid).map_err(RemoteError::git)?;

        let sig = git2::Signature::now(&self.signature.name, &self.signature.email)
            .map_err(RemoteError::git)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = repo
            .commit(Some(self.refname().as_str()), &sig, &sig, message, &tree, &parents)
            .map_err(RemoteError::git)?;

        log::info!("committed {} to {} as {}", path, self.branch, oid);
        Ok(oid.to_string())
    }
}

impl Remote for GitRemote {
    fn fetch(&self, path: &str) -> std::result::Result<String, RemoteError> {
        let data = self
            .with_repo(|repo| self.blob_at(repo, path))?
            .ok_or_else(|| RemoteError::not_found(path))?;
        String::from_utf8(data)
            .map_err(|_| RemoteError::failed(format!("{} is not valid UTF-8 text", path)))
    }

    fn create(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> std::result::Result<String, RemoteError> {
        self.with_repo(|repo| {
            with_repo_lock(repo.path(), || {
                if self.blob_at(repo, path)?.is_some() {
                    return Err(RemoteError::failed(format!("{} already exists", path)));
                }
                self.commit_file(repo, path, content, message)
            })
        })
    }

    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> std::result::Result<Option<String>, RemoteError> {
        self.with_repo(|repo| {
            with_repo_lock(repo.path(), || {
                let current = self
                    .blob_at(repo, path)?
                    .ok_or_else(|| RemoteError::not_found(path))?;
                if current == content.as_bytes() {
                    log::info!("no change in {}, skipping commit", path);
                    return Ok(None);
                }
                self.commit_file(repo, path, content, message).map(Some)
            })
        })
    }

    fn list_tree(&self) -> std::result::Result<Vec<String>, RemoteError> {
        self.with_repo(|repo| {
            let Some(commit) = self.tip(repo)? else {
                return Ok(Vec::new());
            };
            let tree = commit.tree().map_err(RemoteError::git)?;
            let mut files = Vec::new();
            tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
                if entry.kind() == Some(ObjectType::Blob) {
                    if let Some(name) = entry.name() {
                        files.push(format!("{}{}", dir, name));
                    }
                }
                TreeWalkResult::Ok
            })
            .map_err(RemoteError::git)?;
            Ok(files)
        })
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.path.display(), self.branch)
    }
}
