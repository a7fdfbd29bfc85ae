//! Path validation
//!
//! Lexical path cleaning shared by the authorizer, the storage layer and the
//! share resolver. Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::error::PathError;

fn segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim()
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
}

/// Normalizes a request path into canonical absolute form.
///
/// `..` at the root stays at the root, so the result never climbs out of `/`.
/// The result has no trailing slash unless it is `/` itself.
pub fn normalize_virtual_path(raw: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in segments(raw) {
        if segment == ".." {
            stack.pop();
        } else {
            stack.push(segment);
        }
    }
    format!("/{}", stack.join("/"))
}

/// Cleans an untrusted relative path into its segments.
///
/// Unlike [`normalize_virtual_path`] this is strict: a `..` that would leave
/// the starting directory is rejected instead of clamped.
pub fn clean_relative_path(raw: &str) -> Result<Vec<String>, PathError> {
    let mut stack: Vec<String> = Vec::new();
    for segment in segments(raw) {
        if segment.contains('\0') {
            return Err(PathError::InvalidPath(raw.to_string()));
        }
        if segment == ".." {
            if stack.pop().is_none() {
                return Err(PathError::InvalidPath(raw.to_string()));
            }
        } else {
            stack.push(segment.to_string());
        }
    }
    Ok(stack)
}

/// Joins cleaned segments onto `root` one component at a time.
pub fn join_segments<S: AsRef<str>>(root: &Path, segments: &[S]) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment.as_ref());
    }
    path
}

/// Maps a virtual path onto the real path under `user_root`.
pub fn virtual_to_real_path(user_root: &Path, virtual_path: &str) -> PathBuf {
    let normalized = normalize_virtual_path(virtual_path);
    let parts: Vec<&str> = segments(&normalized).collect();
    join_segments(user_root, &parts)
}

/// True if `path` is `root` or lies beneath it, comparing whole components.
pub fn is_contained(root: &Path, path: &Path) -> bool {
    path == root || path.starts_with(root)
}

/// Splits a normalized virtual path into its parent directory and base name.
pub fn split_virtual_path(virtual_path: &str) -> (String, String) {
    let normalized = normalize_virtual_path(virtual_path);
    match normalized.rsplit_once('/') {
        Some(("", name)) => ("/".to_string(), name.to_string()),
        Some((parent, name)) => (parent.to_string(), name.to_string()),
        None => ("/".to_string(), normalized),
    }
}
