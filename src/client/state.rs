//! Module `state`
//!
//! Defines the `Client` struct holding one connection's session state:
//! authentication progress, the logged-in principal and the app capability
//! tokens presented on the connection.

use std::net::SocketAddr;

use crate::auth::Principal;

/// Session state of a connected client.
#[derive(Default)]
pub struct Client {
    username: Option<String>,
    client_addr: Option<SocketAddr>,
    principal: Option<Principal>,
    app_tokens: Vec<String>,
    is_user_valid: bool,
}

impl Client {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr: Some(client_addr),
            ..Self::default()
        }
    }

    /// Clears authentication state and presented tokens.
    pub fn logout(&mut self) {
        self.username = None;
        self.principal = None;
        self.app_tokens.clear();
        self.is_user_valid = false;
    }

    /// Whether the USER command was accepted.
    pub fn is_user_valid(&self) -> bool {
        self.is_user_valid
    }

    pub fn is_logged_in(&self) -> bool {
        self.principal.is_some()
    }

    pub fn username(&self) -> Option<&String> {
        self.username.as_ref()
    }

    pub fn client_addr(&self) -> Option<&SocketAddr> {
        self.client_addr.as_ref()
    }

    pub fn app_tokens(&self) -> &[String] {
        &self.app_tokens
    }

    /// A fresh principal for one request, carrying every token presented so far.
    ///
    /// Tokens are re-parsed on each call; nothing derived from them is cached
    /// on the session.
    pub fn principal(&self) -> Option<Principal> {
        let mut principal = self.principal.clone()?;
        for raw in &self.app_tokens {
            principal.present_token(raw);
        }
        Some(principal)
    }

    /// Accepts a USER command; any previous login is dropped.
    pub fn set_user(&mut self, username: Option<String>) {
        self.is_user_valid = username.is_some();
        self.username = username;
        self.principal = None;
    }

    pub fn set_logged_in(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn present_token(&mut self, raw: &str) {
        self.app_tokens.push(raw.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_carries_presented_tokens() {
        let mut client = Client::default();
        assert!(client.principal().is_none());

        client.set_user(Some("alice".into()));
        client.set_logged_in(Principal::new("1001", "alice"));
        client.present_token("app:shop.example=read");
        client.present_token("not-a-token");

        let principal = client.principal().unwrap();
        assert_eq!(principal.app_claims.len(), 1);
        assert_eq!(principal.invalid_app_tokens, vec!["not-a-token".to_string()]);

        client.logout();
        assert!(!client.is_logged_in());
        assert!(client.app_tokens().is_empty());
    }
}
