use serde::{Deserialize, Serialize};

/// Speaker of a single chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation. Fields are private so a message cannot be
/// edited after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    #[allow(dead_code)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Caller-supplied chat history, oldest turn first. Length is not bounded here;
/// trimming old turns is left to the caller.
pub type ConversationHistory = Vec<ChatMessage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, r#""assistant""#);
    }

    #[test]
    fn test_history_deserializes_in_order() {
        let json = r#"[
            {"role": "user", "content": "What is a closure?"},
            {"role": "assistant", "content": "A function that captures its environment."},
            {"role": "user", "content": "Show me one in Python."}
        ]"#;
        let history: ConversationHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role(), ChatRole::User);
        assert_eq!(history[1].role(), ChatRole::Assistant);
        assert_eq!(history[2].content(), "Show me one in Python.");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let json = r#"{"role": "tool", "content": "x"}"#;
        let result: Result<ChatMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
