//! Per-session conversation state.
//!
//! One `SessionState` exists per collaborator session. It is owned by that
//! session's controller, mutated only through it, and discarded when the
//! session ends. Nothing here is persisted across restarts.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Author of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Mutable state of one coaching session.
///
/// Fresh sessions start with no name and an empty transcript. The
/// transcript is append-only; the first entry is synthesized when
/// onboarding completes.
#[derive(Debug, Default)]
pub struct SessionState {
    pub user_name: Option<String>,
    pub transcript: Vec<Turn>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether name onboarding has completed.
    pub fn is_onboarded(&self) -> bool {
        self.user_name.is_some()
    }

    pub fn push(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_nameless_and_empty() {
        let state = SessionState::new();
        assert!(!state.is_onboarded());
        assert!(state.is_empty());
    }

    #[test]
    fn turns_append_in_order() {
        let mut state = SessionState::new();
        state.user_name = Some("Dana".to_string());
        state.push(Turn::user("first"));
        state.push(Turn::assistant("second"));
        state.push(Turn::user("third"));

        assert_eq!(state.len(), 3);
        assert_eq!(state.transcript[0].role, Role::User);
        assert_eq!(state.transcript[1].role, Role::Assistant);
        assert_eq!(state.transcript[2].content, "third");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
