use serde::{Deserialize, Serialize};

/// A backend persona that can be selected to shape chat and image behavior.
///
/// The backend sends more fields than these (descriptions, tags, ...); they are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    /// Stable identifier sent back to the backend as `character_slug`.
    pub slug: String,

    /// Human-readable label.
    pub name: String,
}

impl Character {
    /// Create a new `Character`.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// Response body of the character listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterList {
    /// The available characters, possibly empty.
    #[serde(default)]
    pub characters: Vec<Character>,
}
