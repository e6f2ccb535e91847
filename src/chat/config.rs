//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

/// Default directory generated images are written to.
const DEFAULT_IMAGE_DIR: &str = "seedchat-images";

/// Command-line arguments for the seedchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(
        optional,
        "Backend base URL (default: $SEEDCHAT_BASE_URL or http://localhost:5000/api/)",
        "URL"
    )]
    pub base_url: Option<String>,

    /// Character to select at startup.
    #[arrrg(optional, "Character slug, name or number to select at startup", "CHARACTER")]
    pub character: Option<String>,

    /// Where generated images are saved.
    #[arrrg(optional, "Directory for generated images (default: seedchat-images)", "DIR")]
    pub image_dir: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL.  `None` defers to the environment, then the built-in default.
    pub base_url: Option<String>,

    /// Character to select once the character list is loaded.
    pub character: Option<String>,

    /// Directory generated images are written to.
    pub image_dir: PathBuf,

    /// Per-request timeout.  `None` waits as long as the backend takes.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: from the environment or the built-in default
    /// - Character: none
    /// - Image directory: `seedchat-images`
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            character: None,
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the character selected at startup.
    pub fn with_character(mut self, character: Option<String>) -> Self {
        self.character = character;
        self
    }

    /// Sets the image directory.
    pub fn with_image_dir(mut self, image_dir: impl Into<PathBuf>) -> Self {
        self.image_dir = image_dir.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            base_url: args.base_url,
            character: args.character,
            image_dir: args
                .image_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR)),
            // A zero timeout would fail every request; treat it as "no timeout".
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            use_color: !args.no_color,
        }
    }
}
