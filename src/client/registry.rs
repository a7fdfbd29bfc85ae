//! Client registry
//!
//! Tracks connected clients for the connection limit and for logging.

use std::collections::HashMap;
use std::net::SocketAddr;

/// Registry of connected clients and the user each one logged in as
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, Option<String>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection unless `max_clients` are already connected.
    pub fn try_insert(&mut self, addr: SocketAddr, max_clients: usize) -> bool {
        if self.clients.len() >= max_clients {
            return false;
        }
        self.clients.insert(addr, None);
        true
    }

    pub fn set_username(&mut self, addr: &SocketAddr, username: Option<String>) {
        if let Some(entry) = self.clients.get_mut(addr) {
            *entry = username;
        }
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Option<String>> {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_limit() {
        let mut registry = ClientRegistry::new();
        let a: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:5001".parse().unwrap();

        assert!(registry.try_insert(a, 1));
        assert!(!registry.try_insert(b, 1));
        registry.set_username(&a, Some("alice".into()));
        assert_eq!(registry.remove(&a), Some(Some("alice".into())));
        assert!(registry.is_empty());
    }
}
