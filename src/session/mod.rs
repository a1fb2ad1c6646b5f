//! Session bookkeeping: which entity belongs to which connection.
//!
//! The association is explicit and owned here; the world task never sees
//! connection handles and the network layer never holds entity state.

use dashmap::DashMap;
use uuid::Uuid;

/// Metadata for one active connection
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Unix millis when the session became active
    pub connected_at: u64,
    /// Peer address of the underlying TCP connection
    pub remote_addr: std::net::SocketAddr,
}

/// Registry of active sessions keyed by entity id
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionInfo>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Record a session once its entity has been allocated (Connecting -> Active)
    pub fn register(&self, entity_id: Uuid, info: SessionInfo) {
        self.sessions.insert(entity_id, info);
    }

    /// Remove a session on disconnect (Active -> Disconnected, terminal)
    pub fn unregister(&self, entity_id: Uuid) -> Option<SessionInfo> {
        self.sessions.remove(&entity_id).map(|(_, info)| info)
    }

    pub fn get(&self, entity_id: Uuid) -> Option<SessionInfo> {
        self.sessions.get(&entity_id).map(|s| s.value().clone())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        let addr = "203.0.113.7:52814".parse().unwrap();
        registry.register(
            id,
            SessionInfo {
                connected_at: 1234,
                remote_addr: addr,
            },
        );
        assert_eq!(registry.active_sessions(), 1);
        assert_eq!(registry.get(id).unwrap().remote_addr, addr);

        let info = registry.unregister(id).unwrap();
        assert_eq!(info.connected_at, 1234);
        assert_eq!(registry.active_sessions(), 0);
        assert!(registry.unregister(id).is_none());
    }
}
