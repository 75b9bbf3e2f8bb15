use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use verstore::*;

/// Create `<dir>/oldcode` and `<dir>/newcode` and a store over them.
pub fn create_store(dir: &Path) -> VersionStore {
    std::fs::create_dir_all(dir.join("oldcode")).unwrap();
    std::fs::create_dir_all(dir.join("newcode")).unwrap();
    VersionStore::new(dir.join("oldcode"), dir.join("newcode"))
}

#[allow(dead_code)]
pub fn create_service(dir: &Path) -> FileService {
    FileService::new(create_store(dir))
}

/// Write a file (and its parents) directly on disk.
#[allow(dead_code)]
pub fn put(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[allow(dead_code)]
pub fn save(service: &FileService, name: &str, content: &str) -> Result<FileRecord> {
    service.save(
        "",
        &SaveRequest {
            name: name.into(),
            content: content.into(),
        },
    )
}

/// In-memory [`Remote`] that records every commit.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeRemote {
    pub files: Mutex<BTreeMap<String, String>>,
    pub commits: Mutex<Vec<(String, String)>>,
    pub fetches: Mutex<Vec<String>>,
    pub fail_fetch: bool,
    pub fail_commit: bool,
}

#[allow(dead_code)]
impl FakeRemote {
    pub fn with_file(path: &str, content: &str) -> Self {
        let remote = Self::default();
        remote
            .files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        remote
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }

    fn commit(&self, path: &str, content: &str, message: &str) -> String {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        let mut commits = self.commits.lock().unwrap();
        commits.push((path.to_string(), message.to_string()));
        format!("commit-{}", commits.len())
    }
}

impl Remote for FakeRemote {
    fn fetch(&self, path: &str) -> std::result::Result<String, RemoteError> {
        self.fetches.lock().unwrap().push(path.to_string());
        if self.fail_fetch {
            return Err(RemoteError::failed("connection refused"));
        }
        self.content(path).ok_or_else(|| RemoteError::not_found(path))
    }

    fn create(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> std::result::Result<String, RemoteError> {
        if self.fail_commit {
            return Err(RemoteError::failed("permission denied"));
        }
        if self.content(path).is_some() {
            return Err(RemoteError::failed("already exists"));
        }
        Ok(self.commit(path, content, message))
    }

    fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> std::result::Result<Option<String>, RemoteError> {
        if self.fail_commit {
            return Err(RemoteError::failed("permission denied"));
        }
        match self.content(path) {
            None => Err(RemoteError::not_found(path)),
            Some(current) if current == content => Ok(None),
            Some(_) => Ok(Some(self.commit(path, content, message))),
        }
    }

    fn list_tree(&self) -> std::result::Result<Vec<String>, RemoteError> {
        if self.fail_fetch {
            return Err(RemoteError::failed("connection refused"));
        }
        Ok(self.files.lock().unwrap().keys().cloned().collect())
    }
}
