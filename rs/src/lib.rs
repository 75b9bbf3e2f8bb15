//! A versioned source-file store.
//!
//! `verstore` keeps two directory trees: a read-only **source** root holding
//! original uploads, and a **versioned** root where every save lands as a
//! new, never-overwritten file whose name carries its version (`main.3.py`,
//! `notes.2`). Saves can optionally be mirrored to a git repository; that
//! mirroring is best-effort and never fails or reverts a local save.
//!
//! # Key types
//!
//! - [`FileService`]: list, read (with latest-version fallback), delete and
//!   save files; the entry point used by the HTTP server.
//! - [`VersionStore`]: filesystem access to both roots, with atomic
//!   create-exclusive writes.
//! - [`namer::resolve`]: pure mapping from a logical name to its current
//!   and next versioned paths.
//! - [`Remote`] / [`GitRemote`]: the remote repository capability and its
//!   git-backed implementation.
//!
//! # Quick example
//!
//! ```rust,no_run
//! use verstore::{FileService, SaveRequest, VersionStore};
//!
//! let service = FileService::new(VersionStore::new("./oldcode", "./newcode"));
//! let saved = service
//!     .save("docs", &SaveRequest { name: "docs/readme".into(), content: "hi".into() })
//!     .unwrap();
//! assert_eq!(saved.name, "docs/readme.1");
//! ```

pub mod error;
pub mod git;
pub mod lock;
pub mod namer;
pub mod paths;
pub mod remote;
pub mod service;
pub mod store;
pub mod sync;
pub mod types;

// Re-export primary public types at crate root.
pub use error::{Error, RemoteError, Result};
pub use git::GitRemote;
pub use namer::{Resolution, VersionedPath};
pub use remote::Remote;
pub use service::FileService;
pub use store::{Removal, VersionStore};
pub use sync::RemoteSyncOutcome;
pub use types::*;
