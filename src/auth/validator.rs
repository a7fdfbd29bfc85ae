//! Authentication validator
//!
//! Username and password validation against the credential store.

use super::credentials::CREDENTIALS;
use super::principal::Principal;
use crate::error::AuthError;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Validates that the given username exists in the credential store.
///
/// Usernames double as storage directory names, so separators and leading
/// dots are rejected.
pub fn validate_user(username: &str, max_length: usize) -> Result<(), AuthError> {
    if username.contains(['@', '#', ',', '%', '/', '\\', '_'])
        || username.starts_with('.')
        || username.starts_with(char::is_numeric)
    {
        return Err(AuthError::InvalidUsername(username.to_string()));
    }

    if !is_valid_input(username, max_length) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }

    if CREDENTIALS.contains_key(username) {
        Ok(())
    } else {
        Err(AuthError::UserNotFound(username.to_string()))
    }
}

/// Validates the password and returns the authenticated principal.
pub fn validate_password(
    username: &str,
    password: &str,
    max_length: usize,
) -> Result<Principal, AuthError> {
    if !is_valid_input(password, max_length) {
        return Err(AuthError::MalformedInput("Invalid password format".into()));
    }

    match CREDENTIALS.get(username) {
        Some(account) if account.password == password => {
            Ok(Principal::new(account.user_id, username))
        }
        Some(_) => Err(AuthError::InvalidPassword(username.to_string())),
        None => Err(AuthError::UserNotFound(username.to_string())),
    }
}
