//! Per-session chat history, kept in memory for the life of the process.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

pub const DEFAULT_MAX_TURNS: usize = 100;
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Default)]
struct Session {
    turns: Vec<Turn>,
    /// Value of the store's clock at the last `record`.
    last_used: u64,
}

/// Chat turns keyed by session id. Oldest turns are dropped once a session
/// exceeds `max_turns`; the least recently used session is evicted once more
/// than `max_sessions` are held.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_turns: usize,
    max_sessions: usize,
    hasher: RandomState,
    counter: AtomicU64,
    clock: AtomicU64,
}

impl SessionStore {
    pub fn new(max_turns: usize) -> Self {
        Self::with_limits(max_turns, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_limits(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns: max_turns.max(2),
            max_sessions: max_sessions.max(1),
            hasher: RandomState::new(),
            counter: AtomicU64::new(0),
            clock: AtomicU64::new(0),
        }
    }

    /// `session_<unix millis>_<9 base36 chars>`.
    pub fn new_id(&self) -> String {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut h = self.hasher.hash_one((millis, n));
        let mut suffix = String::with_capacity(9);
        for _ in 0..9 {
            let digit = (h % 36) as u32;
            suffix.push(char::from_digit(digit, 36).unwrap_or('0'));
            h /= 36;
        }
        format!("session_{millis}_{suffix}")
    }

    pub fn record(&self, id: &str, question: &str, reply: &str) {
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(id) && sessions.len() >= self.max_sessions {
            let oldest = sessions.iter().min_by_key(|(_, s)| s.last_used).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!(session = %oldest, "evicted idle session");
            }
        }
        let session = sessions.entry(id.to_string()).or_default();
        session.last_used = self.clock.fetch_add(1, Ordering::Relaxed);
        let turns = &mut session.turns;
        turns.push(Turn { role: Role::User, text: question.to_string() });
        turns.push(Turn { role: Role::Bot, text: reply.to_string() });
        if turns.len() > self.max_turns {
            let excess = turns.len() - self.max_turns;
            turns.drain(..excess);
        }
    }

    pub fn history(&self, id: &str) -> Option<Vec<Turn>> {
        self.sessions.read().get(id).map(|s| s.turns.clone())
    }

    pub fn len(&self) -> usize { self.sessions.read().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Default for SessionStore {
    fn default() -> Self { Self::with_limits(DEFAULT_MAX_TURNS, DEFAULT_MAX_SESSIONS) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_well_formed() {
        let store = SessionStore::default();
        let a = store.new_id();
        let b = store.new_id();
        assert_ne!(a, b);
        let parts: Vec<&str> = a.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn history_is_capped() {
        let store = SessionStore::new(4);
        for i in 0..3 {
            store.record("s", &format!("q{i}"), &format!("a{i}"));
        }
        let turns = store.history("s").unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].text, "q1");
        assert_eq!(turns[3].role, Role::Bot);
        assert!(store.history("other").is_none());
    }

    #[test]
    fn session_count_is_capped() {
        let store = SessionStore::with_limits(10, 3);
        for i in 0..10_000 {
            store.record(&format!("s{i}"), "q", "a");
        }
        assert_eq!(store.len(), 3);
        assert!(store.history("s9999").is_some());
        assert!(store.history("s0").is_none());
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let store = SessionStore::with_limits(10, 2);
        store.record("a", "q", "a");
        store.record("b", "q", "a");
        // touching "a" makes "b" the idle one
        store.record("a", "again", "a");
        store.record("c", "q", "a");
        assert!(store.history("a").is_some());
        assert!(store.history("b").is_none());
        assert!(store.history("c").is_some());
        assert_eq!(store.history("a").unwrap().len(), 4);
    }
}
