//! Response handling
//!
//! Status codes used on the control connection and response formatting.

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const NO_CONTENT: u16 = 204;
pub const MULTI_STATUS: u16 = 207;
pub const GOODBYE: u16 = 221;
pub const LOGIN_SUCCESS: u16 = 230;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const BAD_REQUEST: u16 = 400;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const TOO_MANY_CLIENTS: u16 = 421;
pub const NOT_IMPLEMENTED: u16 = 501;
pub const NOT_LOGGED_IN: u16 = 530;

/// Format a single response line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
