use std::fs::OpenOptions;
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

const LOCK_FILE: &str = "verstore.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Acquire an advisory file lock on the repository, execute `f`, then release.
///
/// Creates `<gitdir>/verstore.lock` and takes an exclusive `fs2` lock on it,
/// retrying with backoff for up to 30 seconds. Serializes commits across
/// processes sharing the repository.
///
/// # Arguments
/// * `gitdir` - Path to the git directory.
/// * `f` - Closure to execute while the lock is held.
///
/// # Errors
/// Returns an error if the lock cannot be acquired within the timeout.
pub fn with_repo_lock<F, T, E>(gitdir: &Path, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<std::io::Error>,
{
    let lock_path = gitdir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;

    let started = Instant::now();
    let mut backoff = Duration::from_millis(10);
    loop {
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => break,
            Err(e) if started.elapsed() >= LOCK_TIMEOUT => {
                return Err(std::io::Error::new(
                    e.kind(),
                    format!("timed out waiting for {}: {}", lock_path.display(), e),
                )
                .into());
            }
            Err(_) => {
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(Duration::from_millis(200));
            }
        }
    }

    let out = f();
    let _ = FileExt::unlock(&file);
    out
}
