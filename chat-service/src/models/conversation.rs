//! Conversation model for the per-user context cache.

use serde::{Deserialize, Serialize};

/// Marker phrase embedded in every grounding message. Kept for parity with
/// the user-visible conversation; classification uses [`MessageKind`].
pub const GROUNDING_MARKER: &str = "OCR-extracted context";

/// Fixed system prompt seeded into every new session.
pub const SYSTEM_PROMPT: &str =
    "You are an AI assistant helping the user based on previous OCR data and chat context.";

/// Fallback grounding text used when the user has no documents or the
/// fetch fails.
pub const GROUNDING_FALLBACK: &str = "No OCR data available.";

/// Message role as sent to the completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

/// Explicit message classification.
///
/// Grounding messages carry document-derived context and are replaced
/// wholesale on reinjection; turn messages are ordinary conversation and
/// are never touched after being appended. Payloads written before this
/// field existed decode as `Turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Grounding,
    #[default]
    Turn,
}

/// A single message in a conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub kind: MessageKind,
    pub content: String,
}

impl ChatMessage {
    pub fn system() -> Self {
        Self {
            role: Role::System,
            kind: MessageKind::Turn,
            content: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            kind: MessageKind::Turn,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Turn,
            content: content.into(),
        }
    }

    /// Build the grounding message for a fresh session.
    pub fn grounding(text: &str) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Grounding,
            content: format!(
                "Here is some {} from the user's documents:\n\n{}",
                GROUNDING_MARKER, text
            ),
        }
    }

    /// Build the grounding message used on reinjection, framed as an update.
    pub fn grounding_updated(text: &str) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Grounding,
            content: format!(
                "Here is an updated {} from the user's documents:\n\n{}",
                GROUNDING_MARKER, text
            ),
        }
    }

    pub fn is_grounding(&self) -> bool {
        self.kind == MessageKind::Grounding
    }
}

/// The ordered conversation held for one user.
///
/// The wire/storage form is the bare message array; expiry lives in the
/// backing store as TTL metadata, never in the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationSession {
    pub messages: Vec<ChatMessage>,
}

impl ConversationSession {
    /// Seed a new session: system prompt followed by one grounding message.
    pub fn seeded(grounding_text: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(), ChatMessage::grounding(grounding_text)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace any existing grounding messages with `message`, positioned
    /// immediately after the system message (or at the front when none).
    ///
    /// Removal is not assumed singular: every grounding message goes, so a
    /// session that somehow accumulated duplicates converges back to one.
    pub fn replace_grounding(&mut self, message: ChatMessage) {
        self.messages.retain(|m| !m.is_grounding());

        let insert_at = self
            .messages
            .iter()
            .position(|m| m.role == Role::System)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.messages.insert(insert_at, message);
    }

    /// The single grounding message, if present.
    pub fn grounding_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.is_grounding())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_session_has_system_then_grounding() {
        let session = ConversationSession::seeded("BP 120/80");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::System);
        assert!(session.messages[1].is_grounding());
        assert!(session.messages[1].content.contains(GROUNDING_MARKER));
        assert!(session.messages[1].content.contains("BP 120/80"));
    }

    #[test]
    fn replace_grounding_removes_all_duplicates() {
        let mut session = ConversationSession::seeded("one");
        // Force a duplicate that the invariant says should never exist.
        session.push(ChatMessage::grounding("two"));
        session.push(ChatMessage::user("hello"));

        session.replace_grounding(ChatMessage::grounding_updated("three"));

        let grounding: Vec<_> = session.messages.iter().filter(|m| m.is_grounding()).collect();
        assert_eq!(grounding.len(), 1);
        assert!(grounding[0].content.contains("three"));
        assert_eq!(session.messages[0].role, Role::System);
        assert!(session.messages[1].is_grounding());
    }

    #[test]
    fn replace_grounding_inserts_at_front_without_system() {
        let mut session = ConversationSession::default();
        session.push(ChatMessage::user("hi"));

        session.replace_grounding(ChatMessage::grounding_updated("text"));

        assert!(session.messages[0].is_grounding());
        assert_eq!(session.messages[1].role, Role::User);
    }

    #[test]
    fn legacy_payload_without_kind_decodes_as_turn() {
        let raw = r#"[{"role":"user","content":"hello"}]"#;
        let session: ConversationSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.messages[0].kind, MessageKind::Turn);
    }
}
