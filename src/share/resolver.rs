//! Share path resolution
//!
//! Turns an untrusted path relative to a share into an absolute path that can
//! never leave the share root. Pure: no filesystem access.

use std::path::{Path, PathBuf};

use crate::error::PathError;
use crate::share::record::ShareRecord;
use crate::storage::validation::{clean_relative_path, is_contained, join_segments};

/// Result of resolving a path inside a share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSharePath {
    /// Absolute path of the shared file or directory
    pub root: PathBuf,
    /// Absolute path the caller asked for
    pub target: PathBuf,
    /// `target` as a path relative to the owner's storage root
    pub virtual_target: String,
}

/// Resolves `relative` inside `share`, whose owner's storage root is `owner_root`.
pub fn resolve_share_path(
    owner_root: &Path,
    share: &ShareRecord,
    relative: &str,
) -> Result<ResolvedSharePath, PathError> {
    let stored = clean_relative_path(&share.stored_path)?;
    let root = join_segments(owner_root, &stored);

    let relative = clean_relative_path(relative)?;

    let segments: Vec<String> = if share.is_directory {
        relative
    } else {
        // A file share only answers to its own name.
        match relative.as_slice() {
            [] => Vec::new(),
            [name] if Some(name.as_str()) == stored.last().map(String::as_str) => Vec::new(),
            _ => {
                return Err(PathError::InvalidPath(format!(
                    "{} is a file share",
                    share.stored_path
                )));
            }
        }
    };

    let target = join_segments(&root, &segments);
    if !is_contained(&root, &target) {
        return Err(PathError::InvalidPath(target.to_string_lossy().to_string()));
    }

    let virtual_target = format!(
        "/{}",
        stored
            .iter()
            .chain(segments.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/")
    );

    Ok(ResolvedSharePath {
        root,
        target,
        virtual_target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::CapabilitySet;
    use crate::share::record::ShareKind;

    fn share(stored_path: &str, is_directory: bool) -> ShareRecord {
        ShareRecord::new(
            "1001",
            "alice",
            ShareKind::Directed {
                target_id: "1002".into(),
            },
            stored_path.into(),
            is_directory,
            CapabilitySet::from_actions(["read"]),
            None,
        )
    }

    #[test]
    fn test_directory_share_root_and_children() {
        let share = share("/projects/alpha", true);
        let owner_root = Path::new("/");

        let resolved = resolve_share_path(owner_root, &share, "").unwrap();
        assert_eq!(resolved.target, PathBuf::from("/projects/alpha"));
        assert_eq!(resolved.root, resolved.target);

        let resolved = resolve_share_path(owner_root, &share, "notes/todo.txt").unwrap();
        assert_eq!(resolved.target, PathBuf::from("/projects/alpha/notes/todo.txt"));
        assert_eq!(resolved.virtual_target, "/projects/alpha/notes/todo.txt");
    }

    #[test]
    fn test_relative_round_trip() {
        let share = share("/projects/alpha", true);
        let owner_root = Path::new("/srv/drive/alice");
        let resolved = resolve_share_path(owner_root, &share, "a/b").unwrap();
        let stripped = resolved.target.strip_prefix(&resolved.root).unwrap();
        assert_eq!(stripped, Path::new("a/b"));
    }

    #[test]
    fn test_traversal_is_rejected() {
        let share = share("/projects/alpha", true);
        let owner_root = Path::new("/srv/drive/alice");
        for input in [
            "../../etc",
            "..",
            "/..",
            "a/../..",
            "a/../../beta",
            "..\\..\\etc",
            "./../alpha",
            "notes/../../../../../etc/passwd",
        ] {
            assert!(
                matches!(
                    resolve_share_path(owner_root, &share, input),
                    Err(PathError::InvalidPath(_))
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn test_no_dotdot_sequence_escapes() {
        let share = share("/projects/alpha", true);
        let owner_root = Path::new("/srv/drive/alice");
        for depth in 0..6 {
            for tail in ["", "x", "alpha", "etc/passwd"] {
                let input = format!("{}{}", "../".repeat(depth), tail);
                if let Ok(resolved) = resolve_share_path(owner_root, &share, &input) {
                    assert!(resolved.target.starts_with(&resolved.root), "{input}");
                }
            }
        }
    }

    #[test]
    fn test_absolute_looking_input_stays_inside() {
        let share = share("/projects/alpha", true);
        let resolved = resolve_share_path(Path::new("/srv"), &share, "/etc/passwd").unwrap();
        assert_eq!(resolved.target, PathBuf::from("/srv/projects/alpha/etc/passwd"));
    }

    #[test]
    fn test_file_share_accepts_only_its_name() {
        let share = share("/docs/report.pdf", false);
        let owner_root = Path::new("/srv/drive/alice");

        let root = PathBuf::from("/srv/drive/alice/docs/report.pdf");
        assert_eq!(resolve_share_path(owner_root, &share, "").unwrap().target, root);
        assert_eq!(
            resolve_share_path(owner_root, &share, "report.pdf").unwrap().target,
            root
        );
        for input in ["other.pdf", "report.pdf/inner", "../report.pdf", "x/report.pdf"] {
            assert!(
                resolve_share_path(owner_root, &share, input).is_err(),
                "{input}"
            );
        }
    }
}
