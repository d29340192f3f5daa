//! Session correlation: session_id -> originating address.
//!
//! Created on the first inbound message carrying a session_id, read when the
//! matching answer is ready, never explicitly deleted. A later bind for the
//! same session_id overwrites unconditionally, so the most recent sender wins
//! the binding.

use dashmap::DashMap;

pub struct SessionStore {
    bindings: DashMap<String, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// Inserts or overwrites the binding unconditionally.
    pub fn bind(&self, session_id: &str, address: &str) {
        self.bindings
            .insert(session_id.to_string(), address.to_string());
    }

    /// Address that should receive the session's final answer, if bound.
    pub fn resolve(&self, session_id: &str) -> Option<String> {
        self.bindings.get(session_id).map(|a| a.clone())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_resolve() {
        let store = SessionStore::new();
        store.bind("S1", "agent://alpha");
        assert_eq!(store.resolve("S1").as_deref(), Some("agent://alpha"));
        assert_eq!(store.resolve("S2"), None);
    }

    #[test]
    fn rebind_overwrites_last_write_wins() {
        let store = SessionStore::new();
        store.bind("S1", "agent://alpha");
        store.bind("S1", "agent://beta");
        assert_eq!(store.resolve("S1").as_deref(), Some("agent://beta"));
        assert_eq!(store.len(), 1);
    }
}
