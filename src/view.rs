//! Rendering for the chat controller.
//!
//! The controller never touches a terminal (or any other toolkit) directly.  It talks to a
//! [`View`], and this module ships the terminal implementation used by the `seedchat` binary.

use std::fs;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::types::{Character, ChatMessage, GeneratedImage, MessageContent, MessageRole, Seed};

/// ANSI escape code for dim text (used for system notices).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for magenta text (used for image captions).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for yellow text (used for alerts).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI sequence that returns to column zero and erases the line.
const ANSI_ERASE_LINE: &str = "\r\x1b[2K";

/// ANSI sequence that moves up one line and erases it.
const ANSI_ERASE_PREVIOUS_LINE: &str = "\x1b[1A\x1b[2K";

/// Seed display text when no seed is known.
pub const SEED_NOT_SET: &str = "Not set";

/// Label of the explicit "no character" entry.
pub const NO_CHARACTER_LABEL: &str = "No character (default)";

/// Label shown when the backend has no characters to offer.
pub const NO_CHARACTERS_AVAILABLE_LABEL: &str = "No characters available";

/// Label shown when the character list could not be fetched.
pub const CHARACTERS_ERROR_LABEL: &str = "Error loading characters";

/// Text shown for a seed display.
pub fn seed_display_text(seed: Option<Seed>) -> String {
    seed.map(|seed| seed.to_string())
        .unwrap_or_else(|| SEED_NOT_SET.to_string())
}

/// Input fields the controller clears after consuming their text.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputField {
    /// The chat message input.
    Chat,

    /// The image prompt input.
    ImagePrompt,
}

/// Contents of the character selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterOptions {
    /// Characters to choose from, offered after an explicit "no character" entry.
    Available(Vec<Character>),

    /// The backend answered with an empty list.
    Empty,

    /// The list could not be fetched.
    Error,
}

/// One entry of the character selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Value carried by the entry; empty means "no character".
    pub value: String,

    /// Text shown to the user.
    pub label: String,

    /// Whether the entry can be chosen.
    pub disabled: bool,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>, disabled: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled,
        }
    }
}

impl CharacterOptions {
    /// Build the selector contents from a fetched character list.
    pub fn from_characters(characters: Vec<Character>) -> Self {
        if characters.is_empty() {
            CharacterOptions::Empty
        } else {
            CharacterOptions::Available(characters)
        }
    }

    /// The entries, in display order.
    pub fn options(&self) -> Vec<SelectOption> {
        match self {
            CharacterOptions::Available(characters) => {
                let mut options = Vec::with_capacity(characters.len() + 1);
                options.push(SelectOption::new("", NO_CHARACTER_LABEL, false));
                options.extend(
                    characters
                        .iter()
                        .map(|c| SelectOption::new(c.slug.clone(), c.name.clone(), false)),
                );
                options
            }
            CharacterOptions::Empty => {
                vec![SelectOption::new("", NO_CHARACTERS_AVAILABLE_LABEL, false)]
            }
            CharacterOptions::Error => vec![SelectOption::new("", CHARACTERS_ERROR_LABEL, true)],
        }
    }
}

/// The rendering surface the chat controller drives.
///
/// This abstraction allows for different rendering strategies:
/// - a line-oriented terminal with or without ANSI styling
/// - a full-screen TUI
/// - an in-memory recorder for tests
pub trait View {
    /// Append a text message to the message list.
    fn append_message(&mut self, role: MessageRole, text: &str);

    /// Append a generated image, annotated with its prompt and seed.
    fn append_image(&mut self, image: &GeneratedImage);

    /// Show the current seed, or that none is set.
    fn set_seed_display(&mut self, seed: Option<Seed>);

    /// Show or hide the blocking loading indicator.
    fn set_loading(&mut self, loading: bool);

    /// Empty the message list.
    fn clear_messages(&mut self);

    /// Replace the contents of the character selector.
    fn set_character_options(&mut self, options: &CharacterOptions);

    /// Empty an input field after its text was consumed.
    fn clear_input(&mut self, field: InputField) {
        _ = field;
    }

    /// Tell the user something that needs acknowledging.
    fn alert(&mut self, message: &str);

    /// Ask a yes/no question.  Anything but an explicit yes declines.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Line-oriented terminal view with optional ANSI styling.
///
/// Images cannot be drawn inline, so each one is written as a PNG file under the image
/// directory and its path is printed with the caption.
pub struct TerminalView {
    stdout: Stdout,
    use_color: bool,
    image_dir: PathBuf,
    images_saved: usize,
    loading: bool,
    echoed_input: bool,
    options: CharacterOptions,
    editor: Option<DefaultEditor>,
}

impl TerminalView {
    /// Creates a new TerminalView saving images under `image_dir`.
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self::with_color(image_dir, true)
    }

    /// Creates a new TerminalView with specified color setting.
    pub fn with_color(image_dir: impl Into<PathBuf>, use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            image_dir: image_dir.into(),
            images_saved: 0,
            loading: false,
            echoed_input: false,
            options: CharacterOptions::Empty,
            editor: None,
        }
    }

    /// The directory images are written to.
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Read one line of input with history support.
    pub fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        let line = self.editor()?.readline(prompt)?;
        self.echoed_input = true;
        if !line.trim().is_empty() {
            let _ = self.editor()?.add_history_entry(line.as_str());
        }
        Ok(line)
    }

    /// Print an informational line.
    pub fn print_info(&mut self, info: &str) {
        self.end_loading_line();
        println!("{info}");
        self.flush();
    }

    /// Print an error line to stderr.
    pub fn print_error(&mut self, error: &str) {
        self.end_loading_line();
        eprintln!("Error: {error}");
    }

    /// Print the character selector as a numbered list.
    pub fn print_character_options(&mut self) {
        let options = self.options.options();
        self.end_loading_line();
        println!("    Characters:");
        for (index, option) in options.iter().enumerate() {
            let suffix = if option.disabled { " (unavailable)" } else { "" };
            if option.value.is_empty() {
                println!("      -  {}{suffix}", option.label);
            } else {
                println!("      {index}. {} [{}]{suffix}", option.label, option.value);
            }
        }
        self.flush();
    }

    fn editor(&mut self) -> Result<&mut DefaultEditor, ReadlineError> {
        if self.editor.is_none() {
            self.editor = Some(DefaultEditor::new()?);
        }
        match self.editor.as_mut() {
            Some(editor) => Ok(editor),
            None => Err(ReadlineError::Eof),
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn style(&self, code: &'static str) -> &'static str {
        if self.use_color { code } else { "" }
    }

    fn end_loading_line(&mut self) {
        if self.loading {
            if self.use_color {
                print!("{ANSI_ERASE_LINE}");
            } else {
                println!();
            }
            self.loading = false;
            self.flush();
        }
    }

    fn next_image_path(&mut self, seed: Seed) -> PathBuf {
        self.images_saved += 1;
        self.image_dir
            .join(format!("image-{:03}-seed-{seed}.png", self.images_saved))
    }

    /// Write `image` under the image directory, skipping names earlier sessions used.
    fn save_image(&mut self, image: &GeneratedImage) -> crate::Result<PathBuf> {
        fs::create_dir_all(&self.image_dir).map_err(|err| {
            crate::Error::io(
                format!("failed to create {}", self.image_dir.display()),
                err,
            )
        })?;
        loop {
            let path = self.next_image_path(image.seed);
            match image.save_new(&path) {
                Ok(()) => return Ok(path),
                Err(err) if err.is_already_exists() => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn render(&mut self, message: &ChatMessage) {
        self.end_loading_line();
        match &message.content {
            MessageContent::Text(text) => self.render_text(message.role, text),
            MessageContent::Image(image) => self.render_image(image),
        }
        self.flush();
    }

    fn render_text(&mut self, role: MessageRole, text: &str) {
        // The line editor already echoed what the user typed; replace it with the labeled copy.
        if role == MessageRole::User && std::mem::take(&mut self.echoed_input) && self.use_color {
            print!("{ANSI_ERASE_PREVIOUS_LINE}");
        }
        let (dim, bold, reset) = (
            self.style(ANSI_DIM),
            self.style(ANSI_BOLD),
            self.style(ANSI_RESET),
        );
        match role {
            MessageRole::System => {
                println!("{dim}  * {text}{reset}");
            }
            MessageRole::User | MessageRole::Assistant => {
                let color = if role == MessageRole::User {
                    self.style(ANSI_CYAN)
                } else {
                    self.style(ANSI_GREEN)
                };
                println!("{bold}{color}{}:{reset}", role.label());
                for line in text.lines() {
                    println!("  {line}");
                }
            }
        }
    }

    fn render_image(&mut self, image: &GeneratedImage) {
        let (bold, magenta, reset) = (
            self.style(ANSI_BOLD),
            self.style(ANSI_MAGENTA),
            self.style(ANSI_RESET),
        );
        println!("{bold}Generated Image:{reset}");
        match self.save_image(image) {
            Ok(path) => println!("  {}", path.display()),
            Err(err) => {
                tracing::warn!(error = %err, "could not save generated image");
                println!("  (could not save image: {err})");
            }
        }
        println!("  {magenta}{}{reset}", image.caption());
    }
}

impl View for TerminalView {
    fn append_message(&mut self, role: MessageRole, text: &str) {
        self.render(&ChatMessage::text(role, text));
    }

    fn append_image(&mut self, image: &GeneratedImage) {
        self.render(&ChatMessage::image(image.clone()));
    }

    fn set_seed_display(&mut self, seed: Option<Seed>) {
        self.end_loading_line();
        let (dim, reset) = (self.style(ANSI_DIM), self.style(ANSI_RESET));
        println!("{dim}  [seed: {}]{reset}", seed_display_text(seed));
        self.flush();
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            if !self.loading {
                let (dim, reset) = (self.style(ANSI_DIM), self.style(ANSI_RESET));
                print!("{dim}waiting for the backend...{reset}");
                self.loading = true;
                self.flush();
            }
        } else {
            self.end_loading_line();
        }
    }

    fn clear_messages(&mut self) {
        self.end_loading_line();
        if self.use_color {
            print!("\x1b[2J\x1b[H");
        } else {
            println!("----------------------------------------");
        }
        self.flush();
    }

    fn set_character_options(&mut self, options: &CharacterOptions) {
        self.options = options.clone();
        self.print_character_options();
    }

    fn alert(&mut self, message: &str) {
        self.end_loading_line();
        let (yellow, reset) = (self.style(ANSI_YELLOW), self.style(ANSI_RESET));
        println!("{yellow}! {message}{reset}");
        self.flush();
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.end_loading_line();
        let prompt = format!("{question} [y/N] ");
        match self.editor().and_then(|editor| editor.readline(&prompt)) {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
