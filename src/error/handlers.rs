//! Error handlers
//!
//! Maps errors onto response status codes and logs them at the right severity.

use crate::error::types::{
    DriveError, PathError, RecycleError, ScopeError, ShareError, StorageError,
};
use log::{error, info};

/// Log a drive server error.
///
/// Authorization and data-state outcomes are routine and stay at info level;
/// only I/O failures are logged as errors.
pub fn handle_error(err: &DriveError) {
    if is_expected(err) {
        info!("Request rejected: {}", err);
    } else {
        error!("Drive server error: {}", err);
    }
}

/// Whether the error is a routine, user-facing outcome rather than a defect
pub fn is_expected(err: &DriveError) -> bool {
    !matches!(status_code(err), 500)
}

/// Convert error to response status code
pub fn status_code(err: &DriveError) -> u16 {
    match err {
        DriveError::Auth(_) => 530,
        DriveError::Scope(e) => scope_code(e),
        DriveError::Path(PathError::InvalidPath(_)) => 400,
        DriveError::Storage(e) => storage_code(e),
        DriveError::Share(e) => match e {
            ShareError::NotFound(_) => 404,
            ShareError::PermissionDenied(_) => 403,
            ShareError::InvalidRequest(_) => 400,
            ShareError::Scope(e) => scope_code(e),
            ShareError::Storage(e) => storage_code(e),
        },
        DriveError::Recycle(e) => match e {
            RecycleError::NotFound(_) => 404,
            RecycleError::AlreadyExists(_) => 409,
            RecycleError::InvalidPath(_) => 400,
            RecycleError::Scope(e) => scope_code(e),
            RecycleError::IoError(_) => 500,
        },
        DriveError::ProtocolError(_) => 400,
    }
}

fn scope_code(_err: &ScopeError) -> u16 {
    403
}

fn storage_code(err: &StorageError) -> u16 {
    match err {
        StorageError::NotFound(_) => 404,
        StorageError::AlreadyExists(_) => 409,
        StorageError::InvalidPath(_) => 400,
        StorageError::NotADirectory(_) => 409,
        StorageError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => 404,
        StorageError::IoError(_) => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_errors_map_to_forbidden() {
        assert_eq!(status_code(&ScopeError::Required.into()), 403);
        assert_eq!(status_code(&ScopeError::Denied("x".into()).into()), 403);
        assert!(is_expected(&ScopeError::Required.into()));
    }

    #[test]
    fn test_data_state_errors() {
        assert_eq!(status_code(&PathError::InvalidPath("..".into()).into()), 400);
        assert_eq!(
            status_code(&RecycleError::AlreadyExists("/a".into()).into()),
            409
        );
        assert_eq!(status_code(&RecycleError::NotFound("h".into()).into()), 404);
        assert_eq!(
            status_code(&ShareError::PermissionDenied("write".into()).into()),
            403
        );
    }

    #[test]
    fn test_auth_errors_map_to_not_logged_in() {
        let err: DriveError = crate::error::AuthError::NotLoggedIn.into();
        assert_eq!(status_code(&err), 530);
    }

    #[test]
    fn test_io_errors_are_not_expected() {
        let err: DriveError = std::io::Error::other("disk on fire").into();
        assert_eq!(status_code(&err), 500);
        assert!(!is_expected(&err));
    }
}
