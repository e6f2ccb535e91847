use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Request body of the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's message, already trimmed.
    pub message: String,

    /// Selected character slug; empty when no character is selected.
    pub character_slug: String,
}

impl ChatRequest {
    /// Create a chat request for the given message and optional character.
    pub fn new(message: impl Into<String>, character_slug: Option<&str>) -> Self {
        Self {
            message: message.into(),
            character_slug: character_slug.unwrap_or_default().to_string(),
        }
    }
}

/// Response body of the chat endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    /// The assistant's answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Conversation length the backend holds after this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
}

impl ChatReply {
    /// Validate the reply into a [`ChatTurn`].  A reply without a response, or with an
    /// empty one, is malformed.
    pub fn into_turn(self) -> Result<ChatTurn> {
        match self.response.filter(|response| !response.is_empty()) {
            Some(response) => Ok(ChatTurn {
                response,
                message_count: self.message_count,
            }),
            None => Err(Error::serialization(
                "chat reply carried no response",
                None,
            )),
        }
    }
}

/// A completed chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// The assistant's answer.
    pub response: String,

    /// Conversation length the backend holds after this turn, when reported.
    pub message_count: Option<u64>,
}
