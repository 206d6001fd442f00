//! Conversation sessions keyed by id, each holding a short rolling history.

use crate::error::{Result, SyllabusError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Who said a message in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    fn label(self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionMessage {
    speaker: Speaker,
    content: String,
}

#[derive(Default)]
struct Sessions {
    counter: u64,
    histories: HashMap<String, Vec<SessionMessage>>,
}

/// Thread-safe store of conversation sessions.
///
/// Each session keeps at most `max_history` exchanges (two messages per
/// exchange). Older messages are dropped first.
pub struct SessionManager {
    max_history: usize,
    inner: Mutex<Sessions>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            inner: Mutex::new(Sessions::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>> {
        self.inner
            .lock()
            .map_err(|e| SyllabusError::Session(format!("Failed to acquire lock: {}", e)))
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> Result<String> {
        let mut sessions = self.lock()?;
        sessions.counter += 1;
        let id = format!("session_{}", sessions.counter);
        sessions.histories.insert(id.clone(), Vec::new());
        debug!("Created {}", id);
        Ok(id)
    }

    /// Append one message, creating the session if it does not exist.
    pub fn add_message(&self, session_id: &str, speaker: Speaker, content: &str) -> Result<()> {
        let limit = self.max_history * 2;
        let mut sessions = self.lock()?;
        let history = sessions.histories.entry(session_id.to_string()).or_default();

        history.push(SessionMessage {
            speaker,
            content: content.to_string(),
        });
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
        Ok(())
    }

    /// Record a question and its answer.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()> {
        self.add_message(session_id, Speaker::User, user)?;
        self.add_message(session_id, Speaker::Assistant, assistant)
    }

    /// History rendered as `User: ...` / `Assistant: ...` lines, or `None`
    /// for an unknown or empty session.
    pub fn get_conversation_history(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.lock()?;
        Ok(sessions
            .histories
            .get(session_id)
            .filter(|h| !h.is_empty())
            .map(|history| {
                history
                    .iter()
                    .map(|m| format!("{}: {}", m.speaker.label(), m.content))
                    .collect::<Vec<_>>()
                    .join("\n")
            }))
    }

    /// Forget a session and its history. Unknown ids are ignored; a later
    /// write under the same id starts a fresh history.
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        if sessions.histories.remove(session_id).is_some() {
            debug!("Cleared {}", session_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_count_up() {
        let manager = SessionManager::new(2);
        assert_eq!(manager.create_session().unwrap(), "session_1");
        assert_eq!(manager.create_session().unwrap(), "session_2");
    }

    #[test]
    fn test_history_rendering() {
        let manager = SessionManager::new(2);
        let id = manager.create_session().unwrap();
        assert_eq!(manager.get_conversation_history(&id).unwrap(), None);

        manager.add_exchange(&id, "What is MCP?", "A protocol.").unwrap();
        assert_eq!(
            manager.get_conversation_history(&id).unwrap().as_deref(),
            Some("User: What is MCP?\nAssistant: A protocol.")
        );
    }

    #[test]
    fn test_history_keeps_latest_exchanges() {
        let manager = SessionManager::new(2);
        let id = manager.create_session().unwrap();
        for i in 1..=3 {
            manager
                .add_exchange(&id, &format!("q{}", i), &format!("a{}", i))
                .unwrap();
        }

        let history = manager.get_conversation_history(&id).unwrap().unwrap();
        assert_eq!(history, "User: q2\nAssistant: a2\nUser: q3\nAssistant: a3");
    }

    #[test]
    fn test_unknown_session_is_created_on_write() {
        let manager = SessionManager::new(2);
        assert_eq!(manager.get_conversation_history("session_9").unwrap(), None);

        manager.add_exchange("session_9", "hi", "hello").unwrap();
        assert!(manager.get_conversation_history("session_9").unwrap().is_some());
    }

    #[test]
    fn test_clear_session() {
        let manager = SessionManager::new(2);
        let id = manager.create_session().unwrap();
        manager.add_exchange(&id, "hi", "hello").unwrap();

        manager.clear_session(&id).unwrap();
        manager.clear_session("missing").unwrap();

        assert_eq!(manager.get_conversation_history(&id).unwrap(), None);
    }

    #[test]
    fn test_cleared_sessions_are_released() {
        let manager = SessionManager::new(2);
        let first = manager.create_session().unwrap();
        let second = manager.create_session().unwrap();
        manager.add_exchange(&first, "hi", "hello").unwrap();

        manager.clear_session(&first).unwrap();
        manager.clear_session(&second).unwrap();
        assert!(manager.inner.lock().unwrap().histories.is_empty());

        manager.add_exchange(&first, "again", "welcome back").unwrap();
        assert_eq!(
            manager.get_conversation_history(&first).unwrap().as_deref(),
            Some("User: again\nAssistant: welcome back")
        );
    }
}
