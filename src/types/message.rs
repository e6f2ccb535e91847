use crate::types::GeneratedImage;

/// Who a displayed message belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageRole {
    /// The person at the keyboard.
    User,

    /// The backend's chat persona.
    Assistant,

    /// UI-only notices: errors, confirmations, seed changes.
    System,
}

impl MessageRole {
    /// Label printed above the message body.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "You",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        }
    }
}

/// Body of a displayed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain text.
    Text(String),

    /// A generated image with its annotation.
    Image(GeneratedImage),
}

/// A message as shown in the view.  Nothing is kept beyond what the view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// The author of the message.
    pub role: MessageRole,

    /// The message body.
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a text message.
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create an assistant image message.
    pub fn image(image: GeneratedImage) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Image(image),
        }
    }

    /// The text body, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Image(_) => None,
        }
    }
}
