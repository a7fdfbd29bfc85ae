//! Credential storage
//!
//! Static credential store used until an external identity provider is wired in.

use std::collections::HashMap;
use std::sync::LazyLock;

/// A known account: stable user id and password.
pub(crate) struct Account {
    pub user_id: &'static str,
    pub password: &'static str,
}

pub(crate) static CREDENTIALS: LazyLock<HashMap<&'static str, Account>> = LazyLock::new(|| {
    let mut creds = HashMap::new();
    creds.insert(
        "alice",
        Account {
            user_id: "1001",
            password: "alice123",
        },
    );
    creds.insert(
        "bob",
        Account {
            user_id: "1002",
            password: "bob123",
        },
    );
    creds.insert(
        "admin",
        Account {
            user_id: "1000",
            password: "admin123",
        },
    );
    creds
});

/// Looks up the user id of a known account.
pub fn user_id_for(username: &str) -> Option<&'static str> {
    CREDENTIALS.get(username).map(|account| account.user_id)
}
