//! Storage operations
//!
//! File system operations behind the protocol verbs: list, stat, read,
//! write, make collection, move and copy. Callers pass real paths that have
//! already been authorized and contained.

use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::results::EntryInfo;

/// A user's storage root under the server storage root
pub fn user_root(storage_root: &Path, username: &str) -> PathBuf {
    storage_root.join(username)
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn not_found(path: &Path) -> StorageError {
    StorageError::NotFound(display(path))
}

/// Stats a single entry
pub fn stat(path: &Path) -> Result<EntryInfo, StorageError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(path)),
        Err(e) => return Err(e.into()),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string());
    Ok(EntryInfo::from_metadata(name, &metadata))
}

/// Lists the contents of a directory, sorted by name
pub fn list_directory(path: &Path) -> Result<Vec<EntryInfo>, StorageError> {
    if !path.exists() {
        return Err(not_found(path));
    }
    if !path.is_dir() {
        return Err(StorageError::NotADirectory(display(path)));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        match entry.metadata() {
            Ok(metadata) => entries.push(EntryInfo::from_metadata(name, &metadata)),
            Err(e) => debug!("Skipping {} in listing: {}", name, e),
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    info!("Listed directory {} - {} entries", path.display(), entries.len());
    Ok(entries)
}

/// Reads a whole file
pub fn read_file(path: &Path) -> Result<Vec<u8>, StorageError> {
    if !path.exists() {
        return Err(not_found(path));
    }
    if !path.is_file() {
        return Err(StorageError::InvalidPath(format!(
            "{} is a directory",
            display(path)
        )));
    }
    Ok(fs::read(path)?)
}

/// Writes a file through a temporary sibling and renames it into place.
///
/// Returns `true` when the file was created, `false` when it was replaced.
pub fn write_file(path: &Path, data: &[u8]) -> Result<bool, StorageError> {
    let parent = path
        .parent()
        .ok_or_else(|| StorageError::InvalidPath(display(path)))?;
    if !parent.is_dir() {
        return Err(StorageError::NotFound(display(parent)));
    }
    if path.is_dir() {
        return Err(StorageError::AlreadyExists(display(path)));
    }

    let created = !path.exists();
    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(display(path)))?;
    let temp_path = parent.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));

    let result = (|| -> std::io::Result<()> {
        let mut temp_file = fs::File::create(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.flush()?;
        drop(temp_file);
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    info!("Stored {} ({} bytes)", path.display(), data.len());
    Ok(created)
}

/// Creates a single directory; the parent must already exist
pub fn make_collection(path: &Path) -> Result<(), StorageError> {
    if path.exists() {
        return Err(StorageError::AlreadyExists(display(path)));
    }
    match path.parent() {
        Some(parent) if parent.is_dir() => {}
        Some(parent) => return Err(StorageError::NotFound(display(parent))),
        None => return Err(StorageError::InvalidPath(display(path))),
    }
    fs::create_dir(path)?;
    info!("Created collection {}", path.display());
    Ok(())
}

fn check_transfer(source: &Path, destination: &Path) -> Result<(), StorageError> {
    if !source.exists() {
        return Err(not_found(source));
    }
    if destination.exists() {
        return Err(StorageError::AlreadyExists(display(destination)));
    }
    if destination.starts_with(source) {
        return Err(StorageError::InvalidPath(format!(
            "{} is inside {}",
            display(destination),
            display(source)
        )));
    }
    match destination.parent() {
        Some(parent) if parent.is_dir() => Ok(()),
        Some(parent) => Err(StorageError::NotFound(display(parent))),
        None => Err(StorageError::InvalidPath(display(destination))),
    }
}

/// Moves a file or directory; never overwrites
pub fn move_entry(source: &Path, destination: &Path) -> Result<(), StorageError> {
    check_transfer(source, destination)?;
    fs::rename(source, destination)?;
    info!("Moved {} -> {}", source.display(), destination.display());
    Ok(())
}

/// Copies a file or directory tree; never overwrites
pub fn copy_entry(source: &Path, destination: &Path) -> Result<(), StorageError> {
    check_transfer(source, destination)?;
    copy_recursive(source, destination)?;
    info!("Copied {} -> {}", source.display(), destination.display());
    Ok(())
}

fn copy_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        fs::create_dir(destination)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &destination.join(entry.file_name()))?;
        }
    } else {
        fs::copy(source, destination)?;
    }
    Ok(())
}
