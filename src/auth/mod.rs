//! Authentication system
//!
//! Handles credential validation and the request principal with its
//! presented app capability tokens.

pub mod credentials;
pub mod principal;
pub mod validator;

pub use principal::{AppCapabilityClaim, Principal, parse_app_token};
pub use validator::{validate_password, validate_user};
