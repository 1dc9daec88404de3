//! Work-tree helpers: path normalisation, file listing and cleanup.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{EngineError, EngineResult};
use crate::repository::SIT_DIR;

/// Normalise `path` to a forward-slash path relative to `root`.
///
/// Relative paths are taken relative to `root`. The result is `""` for the
/// root itself. Paths that leave the work tree or enter `.sit` are refused.
pub fn relativize(root: &Path, path: &Path) -> EngineResult<String> {
    let outside = || EngineError::OutsideWorkTree(path.to_path_buf());

    let rest = if path.is_absolute() {
        let absolute = lexical_normalize(path).ok_or_else(outside)?;
        match absolute.strip_prefix(root) {
            Ok(rest) => rest.to_path_buf(),
            Err(_) => {
                let resolved = canonicalize_existing(&absolute)?;
                resolved.strip_prefix(root).map_err(|_| outside())?.to_path_buf()
            }
        }
    } else {
        lexical_normalize(path).ok_or_else(outside)?
    };

    let mut parts = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
            _ => return Err(outside()),
        }
    }
    if parts.first().map(String::as_str) == Some(SIT_DIR) {
        return Err(outside());
    }
    Ok(parts.join("/"))
}

/// Resolve `.` and `..` without touching the filesystem. `None` if `..`
/// climbs above the start.
fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

/// Canonicalize the longest existing ancestor of `path` and re-append the
/// rest, so symlinked spellings of the root still relativize.
fn canonicalize_existing(path: &Path) -> EngineResult<PathBuf> {
    let mut existing = path;
    let mut tail = Vec::new();
    loop {
        if existing.exists() {
            let mut resolved = existing.canonicalize()?;
            for name in tail.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
}

/// Join a forward-slash relative path onto `root`.
pub fn absolute(root: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        root.to_path_buf()
    } else {
        rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

/// Every regular file under `start` (a file or directory inside `root`),
/// as `(relative path, absolute path)` in path order. `.sit` is skipped.
pub fn list_files(root: &Path, start: &Path) -> EngineResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != OsStr::new(SIT_DIR));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            if entry.file_type().is_symlink() {
                debug!(path = %entry.path().display(), "symlink not tracked");
            }
            continue;
        }
        let Ok(rest) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rest
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((rel, entry.path().to_path_buf()));
    }
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

/// Delete a tracked file. A file that is already gone is not an error.
pub fn remove_file(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove `dir` and then each parent while empty, stopping at `stop_at`.
pub fn remove_empty_dirs(dir: &Path, stop_at: &Path) -> io::Result<()> {
    let mut current = dir.to_path_buf();
    while current != stop_at && current.starts_with(stop_at) {
        match fs::read_dir(&current) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        if current.exists() {
            fs::remove_dir(&current)?;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    Ok(())
}
