//! Generation request - The conversation a host asks the worker to continue

use serde::{Deserialize, Serialize};

use crate::entities::ChatMessage;

/// Ordered conversation to continue
///
/// Sampling parameters are deliberately absent: they come from the variant
/// profile, never from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationRequest {
    messages: Vec<ChatMessage>,
}

impl GenerationRequest {
    /// Create a request from an ordered list of messages
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Create a single-turn request
    pub fn simple(user_message: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(user_message)])
    }

    /// Messages in conversation order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<ChatMessage>> for GenerationRequest {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self::new(messages)
    }
}
