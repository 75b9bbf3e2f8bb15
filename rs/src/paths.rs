use std::cmp::Ordering;

use crate::error::{Error, Result};

/// Reject any path that contains a parent-directory marker.
///
/// The check is on the raw string, so `a..b` is refused as well as `../a`.
///
/// # Errors
/// Returns [`Error::Forbidden`] naming the offending path.
pub fn reject_traversal(path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(Error::forbidden(format!("Forbidden access [{}]", path)));
    }
    Ok(())
}

/// Normalize a store path: reject `..`, strip leading/trailing slashes,
/// drop `.` segments and collapse repeated slashes.
///
/// An empty input returns an empty string (root).
///
/// # Errors
/// Returns [`Error::Forbidden`] on traversal and [`Error::InvalidPath`] when
/// the path contains a NUL byte or a backslash.
pub fn normalize_path(path: &str) -> Result<String> {
    reject_traversal(path)?;
    if path.contains('\0') || path.contains('\\') {
        return Err(Error::invalid_path(format!(
            "path [{}] contains an illegal character",
            path.escape_debug(),
        )));
    }

    let segments: Vec<&str> = path
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();
    Ok(segments.join("/"))
}

/// Split a normalized path into `(directory, file_name)`.
///
/// The directory is empty for top-level names.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Join a directory and a name with a single `/`.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Human ordering for path strings: runs of ASCII digits compare by numeric
/// value, everything else compares character by character.
///
/// `file2` sorts before `file10`. Ties between numerically equal runs
/// (`a01` vs `a1`) fall back to plain string order so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ia = a.char_indices().peekable();
    let mut ib = b.char_indices().peekable();

    loop {
        match (ia.peek().copied(), ib.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((sa, ca)), Some((sb, cb))) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let ea = digit_run_end(a, sa);
                    let eb = digit_run_end(b, sb);
                    let ord = cmp_digit_runs(&a[sa..ea], &b[sb..eb]);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    while ia.peek().is_some_and(|(i, _)| *i < ea) {
                        ia.next();
                    }
                    while ib.peek().is_some_and(|(i, _)| *i < eb) {
                        ib.next();
                    }
                } else {
                    if ca != cb {
                        return ca.cmp(&cb);
                    }
                    ia.next();
                    ib.next();
                }
            }
        }
    }
}

fn digit_run_end(s: &str, start: usize) -> usize {
    s[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |off| start + off)
}

/// Compare two digit strings by value without parsing (no overflow).
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort paths in natural order, in place.
pub fn natural_sort(paths: &mut [String]) {
    paths.sort_by(|a, b| natural_cmp(a, b));
}
