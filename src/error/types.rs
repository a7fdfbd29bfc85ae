//! Error types
//!
//! Defines domain-specific error types for each module of the drive server.

use std::fmt;
use std::io;

/// Authentication module errors
#[derive(Debug)]
pub enum AuthError {
    InvalidUsername(String),
    InvalidPassword(String),
    UserNotFound(String),
    MalformedInput(String),
    NotLoggedIn,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidUsername(u) => write!(f, "Invalid username: {}", u),
            AuthError::InvalidPassword(u) => write!(f, "Invalid password for user: {}", u),
            AuthError::UserNotFound(u) => write!(f, "User not found: {}", u),
            AuthError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
            AuthError::NotLoggedIn => write!(f, "User not logged in"),
        }
    }
}

impl std::error::Error for AuthError {}

/// App scope authorization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// App scoping is configured but the caller presented no app capabilities.
    Required,
    /// The caller is not authorized for the path/action, or presented a malformed token.
    Denied(String),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Required => write!(f, "App capability required"),
            ScopeError::Denied(reason) => write!(f, "App scope denied: {}", reason),
        }
    }
}

impl std::error::Error for ScopeError {}

/// Path resolution errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    InvalidPath(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
        }
    }
}

impl std::error::Error for PathError {}

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    AlreadyExists(String),
    InvalidPath(String),
    NotADirectory(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

impl From<PathError> for StorageError {
    fn from(error: PathError) -> Self {
        match error {
            PathError::InvalidPath(p) => StorageError::InvalidPath(p),
        }
    }
}

/// Share module errors
#[derive(Debug)]
pub enum ShareError {
    NotFound(String),
    PermissionDenied(String),
    InvalidRequest(String),
    Scope(ScopeError),
    Storage(StorageError),
}

impl fmt::Display for ShareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareError::NotFound(id) => write!(f, "Share not found: {}", id),
            ShareError::PermissionDenied(msg) => write!(f, "Share permission denied: {}", msg),
            ShareError::InvalidRequest(msg) => write!(f, "Invalid share request: {}", msg),
            ShareError::Scope(e) => write!(f, "{}", e),
            ShareError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ShareError {}

impl From<ScopeError> for ShareError {
    fn from(error: ScopeError) -> Self {
        ShareError::Scope(error)
    }
}

impl From<StorageError> for ShareError {
    fn from(error: StorageError) -> Self {
        ShareError::Storage(error)
    }
}

impl From<PathError> for ShareError {
    fn from(error: PathError) -> Self {
        ShareError::Storage(error.into())
    }
}

impl From<io::Error> for ShareError {
    fn from(error: io::Error) -> Self {
        ShareError::Storage(StorageError::IoError(error))
    }
}

/// Recycle bin errors
#[derive(Debug)]
pub enum RecycleError {
    NotFound(String),
    AlreadyExists(String),
    InvalidPath(String),
    Scope(ScopeError),
    IoError(io::Error),
}

impl fmt::Display for RecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecycleError::NotFound(h) => write!(f, "Recycle item not found: {}", h),
            RecycleError::AlreadyExists(p) => write!(f, "File already exists: {}", p),
            RecycleError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            RecycleError::Scope(e) => write!(f, "{}", e),
            RecycleError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for RecycleError {}

impl From<ScopeError> for RecycleError {
    fn from(error: ScopeError) -> Self {
        RecycleError::Scope(error)
    }
}

impl From<io::Error> for RecycleError {
    fn from(error: io::Error) -> Self {
        RecycleError::IoError(error)
    }
}

impl From<PathError> for RecycleError {
    fn from(error: PathError) -> Self {
        match error {
            PathError::InvalidPath(p) => RecycleError::InvalidPath(p),
        }
    }
}

/// General drive server error that encompasses all error types
#[derive(Debug)]
pub enum DriveError {
    Auth(AuthError),
    Scope(ScopeError),
    Path(PathError),
    Storage(StorageError),
    Share(ShareError),
    Recycle(RecycleError),
    ProtocolError(String),
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveError::Auth(e) => write!(f, "Authentication error: {}", e),
            DriveError::Scope(e) => write!(f, "Authorization error: {}", e),
            DriveError::Path(e) => write!(f, "Path error: {}", e),
            DriveError::Storage(e) => write!(f, "Storage error: {}", e),
            DriveError::Share(e) => write!(f, "Share error: {}", e),
            DriveError::Recycle(e) => write!(f, "Recycle error: {}", e),
            DriveError::ProtocolError(e) => write!(f, "Protocol error: {}", e),
        }
    }
}

impl std::error::Error for DriveError {}

impl From<AuthError> for DriveError {
    fn from(error: AuthError) -> Self {
        DriveError::Auth(error)
    }
}

impl From<ScopeError> for DriveError {
    fn from(error: ScopeError) -> Self {
        DriveError::Scope(error)
    }
}

impl From<PathError> for DriveError {
    fn from(error: PathError) -> Self {
        DriveError::Path(error)
    }
}

impl From<StorageError> for DriveError {
    fn from(error: StorageError) -> Self {
        DriveError::Storage(error)
    }
}

impl From<ShareError> for DriveError {
    fn from(error: ShareError) -> Self {
        DriveError::Share(error)
    }
}

impl From<RecycleError> for DriveError {
    fn from(error: RecycleError) -> Self {
        DriveError::Recycle(error)
    }
}

impl From<io::Error> for DriveError {
    fn from(error: io::Error) -> Self {
        DriveError::Storage(StorageError::IoError(error))
    }
}
