//! Best-effort reconciliation of a saved version with the remote copy.
//!
//! Nothing here returns an error: every remote failure becomes a
//! [`RemoteSyncOutcome`]. The local version is already durable by the time
//! [`reconcile`] runs.

use crate::error::RemoteError;
use crate::remote::Remote;

/// What happened on the remote side of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSyncOutcome {
    /// No remote configured.
    Skipped,
    /// New content committed; carries the commit id.
    Committed(String),
    /// Remote already had exactly this content.
    Unchanged,
    /// Remote diverged from the copy this edit was based on. Carries the
    /// characters only the local copy has and those only the remote has.
    ContentMismatch { diff: [String; 2] },
    /// Could not read the remote copy; nothing was written.
    FetchFailed(RemoteError),
    /// The remote rejected the write.
    CommitFailed(RemoteError),
}

impl RemoteSyncOutcome {
    /// Human-readable status for the save response. `None` when skipped.
    pub fn status(&self) -> Option<String> {
        match self {
            Self::Skipped => None,
            Self::Committed(id) => Some(id.clone()),
            Self::Unchanged => Some("No change in contents, Git commit skipped.".into()),
            Self::ContentMismatch { .. } => Some(
                "Git Content mismatch, syncup content with Git. New file version saved locally."
                    .into(),
            ),
            Self::FetchFailed(_) => Some(
                "Git content fetch failed, not committing to Git. New file version saved locally."
                    .into(),
            ),
            Self::CommitFailed(_) => {
                Some("Git Commit failed. New file version saved locally.".into())
            }
        }
    }

    pub fn diff(&self) -> Option<&[String; 2]> {
        match self {
            Self::ContentMismatch { diff } => Some(diff),
            _ => None,
        }
    }
}

/// Mirror a saved version to `remote`.
///
/// * `canonical` - unversioned name, used as the remote path.
/// * `new_content` - content of the version just saved.
/// * `prior` - content of the local copy the edit was based on, if any.
/// * `message` - commit message.
///
/// With a prior copy the remote file is fetched first and must match it;
/// otherwise nothing is pushed. Without one the remote is updated if it has
/// the file and created if not.
pub fn reconcile(
    remote: Option<&dyn Remote>,
    canonical: &str,
    new_content: &str,
    prior: Option<&str>,
    message: &str,
) -> RemoteSyncOutcome {
    let Some(remote) = remote else {
        return RemoteSyncOutcome::Skipped;
    };

    let mut on_remote = None;
    if let Some(prior) = prior {
        match remote.fetch(canonical) {
            Ok(remote_content) => {
                if remote_content != prior {
                    log::warn!(
                        "{} on {} diverged from the local copy, not committing",
                        canonical,
                        remote.describe()
                    );
                    return RemoteSyncOutcome::ContentMismatch {
                        diff: string_diff(prior, &remote_content),
                    };
                }
                on_remote = Some(true);
            }
            Err(RemoteError::NotFound(_)) => on_remote = Some(false),
            Err(e) => {
                log::warn!("fetching {} from {} failed: {}", canonical, remote.describe(), e);
                return RemoteSyncOutcome::FetchFailed(e);
            }
        }
    }

    let result = match on_remote {
        Some(false) => remote.create(canonical, new_content, message).map(Some),
        _ => match remote.update(canonical, new_content, message) {
            Err(RemoteError::NotFound(_)) => remote.create(canonical, new_content, message).map(Some),
            other => other,
        },
    };

    match result {
        Ok(Some(id)) => RemoteSyncOutcome::Committed(id),
        Ok(None) => RemoteSyncOutcome::Unchanged,
        Err(e) => {
            log::warn!("committing {} to {} failed: {}", canonical, remote.describe(), e);
            RemoteSyncOutcome::CommitFailed(e)
        }
    }
}

/// Rough character diff of two strings: `[only_in_a, only_in_b]`.
///
/// Walks both strings in step. On a mismatch the side with more characters
/// left gives up one character while the other side holds its position;
/// with equal remainders both characters are reported. Trailing leftovers go
/// to their side. Not a minimal edit script.
pub fn string_diff(a: &str, b: &str) -> [String; 2] {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut only_a, mut only_b) = (String::new(), String::new());
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            i += 1;
            j += 1;
            continue;
        }
        let (rest_a, rest_b) = (a.len() - i, b.len() - j);
        if rest_a > rest_b {
            only_a.push(a[i]);
            i += 1;
        } else if rest_a < rest_b {
            only_b.push(b[j]);
            j += 1;
        } else {
            only_a.push(a[i]);
            only_b.push(b[j]);
            i += 1;
            j += 1;
        }
    }
    only_a.extend(&a[i..]);
    only_b.extend(&b[j..]);
    [only_a, only_b]
}
