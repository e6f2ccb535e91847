//! Interactive terminal client for the seedchat backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on the default address
//! seedchat
//!
//! # Point at another backend and start with a character selected
//! seedchat --base-url http://chat.local/api --character ada
//!
//! # Save images elsewhere and disable colors
//! seedchat --image-dir ~/pictures --no-color
//! ```
//!
//! # Commands
//!
//! Plain text is sent as a chat message.  Slash commands:
//! - `/image <prompt>` - Generate an image
//! - `/seed` - Ask for a new seed
//! - `/character [choice]` - Select a character
//! - `/characters` - List characters
//! - `/clear` - Clear the conversation history
//! - `/stats` - Show session state
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::error::ReadlineError;
use tracing_subscriber::{EnvFilter, fmt};

use seedchat::HttpBackend;
use seedchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, TerminalView, help_text, interruptible,
    parse_command,
};
use seedchat::view::seed_display_text;

type TerminalController = ChatController<HttpBackend, TerminalView>;

/// Main entry point for the seedchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("seedchat [OPTIONS]");
    let config = ChatConfig::from(args);
    init_tracing();

    let backend = HttpBackend::with_options(config.base_url.clone(), config.timeout)?;
    let view = TerminalView::with_color(config.image_dir.clone(), config.use_color);
    let mut controller = ChatController::new(backend, view);

    // Flag for interrupt handling while a request is in flight
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("seedchat (backend: {})", controller.backend().base_url());
    println!("Type /help for commands, /quit to exit\n");

    let finished = interruptible(controller.initialize(), &interrupted).await;
    report_interrupt(&mut controller, finished);
    if config.character.is_some() {
        controller.select_character(config.character.as_deref());
    }

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = controller.view_mut().read_line("> ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Image(prompt) => {
                            let finished =
                                interruptible(controller.generate_image(&prompt), &interrupted)
                                    .await;
                            report_interrupt(&mut controller, finished);
                        }
                        ChatCommand::NewSeed => {
                            let finished =
                                interruptible(controller.request_new_seed(), &interrupted).await;
                            report_interrupt(&mut controller, finished);
                        }
                        ChatCommand::Clear => {
                            let finished =
                                interruptible(controller.clear_history(), &interrupted).await;
                            report_interrupt(&mut controller, finished);
                        }
                        ChatCommand::Character(choice) => {
                            if controller.select_character(choice.as_deref()) && choice.is_none()
                            {
                                controller.view_mut().print_info("Character cleared.");
                            }
                        }
                        ChatCommand::Characters => {
                            controller.view_mut().print_character_options();
                        }
                        ChatCommand::Stats => {
                            print_stats(&controller);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            controller.view_mut().print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the backend
                let finished =
                    interruptible(controller.send_chat_message(line), &interrupted).await;
                report_interrupt(&mut controller, finished);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                controller
                    .view_mut()
                    .print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

fn report_interrupt(controller: &mut TerminalController, finished: bool) {
    if !finished {
        controller.view_mut().print_info("[interrupted]");
    }
}

fn print_stats(controller: &TerminalController) {
    let state = controller.state();
    println!("    Session:");
    println!("      Backend: {}", controller.backend().base_url());
    match state.character() {
        Some(slug) => {
            let name = controller
                .characters()
                .iter()
                .find(|c| c.slug == slug)
                .map(|c| c.name.as_str())
                .unwrap_or(slug);
            println!("      Character: {} [{}]", name, slug);
        }
        None => println!("      Character: (none)"),
    }
    println!("      Seed: {}", seed_display_text(state.seed()));
    match controller.message_count() {
        Some(count) => println!("      Messages: {}", count),
        None => println!("      Messages: (unknown)"),
    }
    println!("      Image directory: {}", controller.view().image_dir().display());
}
