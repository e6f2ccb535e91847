use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Seed;

/// Request body of the image generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRequest {
    /// Description of the image to generate.
    pub prompt: String,

    /// Whether the backend should fold recent conversation into the prompt.
    pub use_context: bool,
}

impl ImageRequest {
    /// Create an image request that asks the backend to use conversation context.
    pub fn with_context(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            use_context: true,
        }
    }
}

/// Response body of the image generation endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageReply {
    /// Base64-encoded PNG data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// The prompt the backend actually used (it may have been enriched with context).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// The seed the image was generated with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Seed>,
}

impl ImageReply {
    /// Decode the reply into a [`GeneratedImage`].
    ///
    /// `requested_prompt` annotates the image when the backend did not echo a prompt back.
    /// A reply without image data or without a seed is malformed.
    pub fn into_image(self, requested_prompt: &str) -> Result<GeneratedImage> {
        let Some(data) = self.image.filter(|data| !data.is_empty()) else {
            return Err(Error::serialization(
                "image reply carried no image data",
                None,
            ));
        };
        let Some(seed) = self.seed else {
            return Err(Error::serialization("image reply carried no seed", None));
        };
        let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
        Ok(GeneratedImage {
            bytes,
            prompt: self
                .prompt
                .unwrap_or_else(|| requested_prompt.to_string()),
            seed,
        })
    }
}

/// A decoded image ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw PNG bytes.
    pub bytes: Vec<u8>,

    /// Prompt text to annotate the image with.
    pub prompt: String,

    /// Seed the image was generated with.
    pub seed: Seed,
}

impl GeneratedImage {
    /// The caption shown next to the image.
    pub fn caption(&self) -> String {
        format!("Prompt: {} | Seed: {}", self.prompt, self.seed)
    }

    /// Write the image bytes to a new file at `path`.
    ///
    /// Fails with an [`std::io::ErrorKind::AlreadyExists`] I/O error instead of overwriting.
    pub fn save_new<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| Error::io(format!("failed to create {}", path.display()), err))?;
        file.write_all(&self.bytes)
            .map_err(|err| Error::io(format!("failed to write {}", path.display()), err))
    }
}
