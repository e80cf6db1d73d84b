//! Conversation memory types.
//!
//! Short-term memory is a per-session log of conversational turns; long-term
//! memory is a per-actor namespace of extracted records searched by meaning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Role of a stored conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "USER",
            TurnRole::Assistant => "ASSISTANT",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(TurnRole::User),
            "ASSISTANT" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// One message persisted to short-term memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// Identifies a durable memory scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub actor_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(actor_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.actor_id, self.session_id)
    }
}

/// An event as stored by the memory service.
///
/// One event may hold several turns (the long-term hook writes the user and
/// assistant texts together).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

/// A long-term memory record returned by semantic retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub text: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_role_wire_format_is_uppercase() {
        let json = serde_json::to_string(&TurnRole::Assistant).unwrap();
        assert_eq!(json, "\"ASSISTANT\"");
        assert_eq!("user".parse::<TurnRole>().unwrap(), TurnRole::User);
        assert!("tool".parse::<TurnRole>().is_err());
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new("chief-7", "incident-42");
        assert_eq!(key.to_string(), "chief-7/incident-42");
    }
}
