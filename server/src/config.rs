use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use verstore::{FileService, GitRemote, OpenOptions, VersionStore};

/// HTTP file server for versioned source files
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "VERSTORE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "VERSTORE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Read-only directory of original files
    #[arg(long, env = "VERSTORE_SOURCE_ROOT", default_value = "./oldcode")]
    pub source_root: PathBuf,

    /// Directory receiving every saved version
    #[arg(long, env = "VERSTORE_VERSIONED_ROOT", default_value = "./newcode")]
    pub versioned_root: PathBuf,

    /// Git repository that saves are mirrored to (unset disables mirroring)
    #[arg(long, env = "DOCS_REPONAME")]
    pub docs_repo: Option<PathBuf>,

    /// Branch of the docs repository to commit to
    #[arg(long, env = "DOCS_REPO_BRANCH", default_value = "main")]
    pub docs_branch: String,

    /// Create the docs repository as a bare repository if it is missing
    #[arg(long, env = "VERSTORE_CREATE_DOCS_REPO")]
    pub create_docs_repo: bool,

    /// Committer name for mirrored commits
    #[arg(long, env = "VERSTORE_COMMITTER_NAME", default_value = "verstore")]
    pub committer_name: String,

    /// Committer email for mirrored commits
    #[arg(long, env = "VERSTORE_COMMITTER_EMAIL", default_value = "verstore@localhost")]
    pub committer_email: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "VERSTORE_REQUEST_TIMEOUT", default_value_t = 300)]
    pub request_timeout_secs: u64,

    /// Allow cross-origin requests from any origin
    #[arg(long)]
    pub cors: bool,
}

impl Config {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Docs repository path, treating an empty value as unset.
    pub fn docs_repo(&self) -> Option<&PathBuf> {
        self.docs_repo
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Build the file service, opening the docs repository when configured.
    pub fn build_service(&self) -> verstore::Result<FileService> {
        let store = VersionStore::new(&self.source_root, &self.versioned_root);
        let service = FileService::new(store);

        let Some(repo) = self.docs_repo() else {
            tracing::warn!("Documentation repository not set, saves stay local");
            return Ok(service);
        };

        let remote = GitRemote::open(
            repo,
            OpenOptions {
                create: self.create_docs_repo,
                branch: Some(self.docs_branch.clone()),
                author: Some(self.committer_name.clone()),
                email: Some(self.committer_email.clone()),
            },
        )?;
        tracing::info!(repo = %repo.display(), branch = %self.docs_branch, "mirroring saves");
        Ok(service.with_remote(Arc::new(remote)))
    }
}
