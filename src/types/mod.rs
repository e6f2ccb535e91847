// Public modules
pub mod character;
pub mod chat_exchange;
pub mod clear_reply;
pub mod image;
pub mod message;
pub mod seed;

// Re-exports
pub use character::{Character, CharacterList};
pub use chat_exchange::{ChatReply, ChatRequest, ChatTurn};
pub use clear_reply::ClearReply;
pub use image::{GeneratedImage, ImageReply, ImageRequest};
pub use message::{ChatMessage, MessageContent, MessageRole};
pub use seed::{Seed, SeedReply};
