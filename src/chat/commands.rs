//! Slash command parsing for the chat application.
//!
//! Anything that does not start with `/` is a chat message.  Commands map onto the
//! controller's other actions and onto local display commands.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Generate an image from the prompt.  An empty prompt is passed through so the
    /// controller can alert about it.
    Image(String),

    /// Ask the backend for a fresh seed.
    NewSeed,

    /// Clear the conversation history (after confirmation).
    Clear,

    /// Select a character by slug, name or list number.
    /// `None` goes back to no character.
    Character(Option<String>),

    /// List the available characters.
    Characters,

    /// Display session statistics (seed, character, message count).
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it should be sent
/// as a chat message.
///
/// # Examples
///
/// ```
/// # use seedchat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/seed"), Some(ChatCommand::NewSeed));
/// assert!(parse_command("/image a lighthouse at dusk").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "image" | "img" => ChatCommand::Image(argument.unwrap_or_default().to_string()),
        "seed" | "new-seed" | "newseed" => match argument {
            None => ChatCommand::NewSeed,
            Some(_) => ChatCommand::Invalid(
                "/seed takes no argument; seeds come from the backend".to_string(),
            ),
        },
        "clear" => ChatCommand::Clear,
        "character" | "char" => ChatCommand::Character(argument.map(|s| s.to_string())),
        "characters" | "chars" => ChatCommand::Characters,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("Empty command; type /help for commands".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  <text>                 Send a chat message
  /image <prompt>        Generate an image using the conversation as context
  /seed                  Ask for a new seed so later images vary
  /character [choice]    Select a character by slug, name or number (no argument clears it)
  /characters            List the available characters
  /clear                 Clear the conversation history
  /stats                 Show the seed, character and message count
  /help                  Show this help message
  /quit                  Exit the chat"#
}
