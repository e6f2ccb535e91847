//! The chat controller.
//!
//! `ChatController` mediates between user actions and backend calls.  Each operation is a
//! single linear request/response cycle whose result lands in the [`View`]; no failure
//! escapes an operation, so the session always stays interactive.
//!
//! Operations take `&mut self`, which means two actions on one controller can never be in
//! flight at the same time.

use std::future::Future;

use tracing::{debug, warn};

use crate::chat::state::SessionState;
use crate::client::Backend;
use crate::observability::{
    CHAT_HISTORY_CLEARED, CHAT_IMAGES_GENERATED, CHAT_MESSAGES_SENT, CHAT_SEEDS_REQUESTED,
};
use crate::types::{Character, ChatRequest, ImageRequest, MessageRole};
use crate::view::{CharacterOptions, InputField, View};

/// Shown when a chat request fails without a backend error.
pub const CHAT_FAILURE_MESSAGE: &str = "Error: Failed to send message. Please try again.";

/// Shown when an image request fails without a backend error.
pub const IMAGE_FAILURE_MESSAGE: &str = "Error: Failed to generate image. Please try again.";

/// Alert raised for an empty image prompt.
pub const EMPTY_PROMPT_ALERT: &str = "Please enter an image description";

/// Question asked before clearing the history.
pub const CLEAR_CONFIRMATION: &str = "Are you sure you want to clear the chat history?";

/// Notice appended after the history was cleared.
pub const HISTORY_CLEARED_MESSAGE: &str = "Chat history cleared.";

/// Drives one chat session against a backend and renders into a view.
pub struct ChatController<B: Backend, V: View> {
    backend: B,
    view: V,
    state: SessionState,
    characters: Vec<Character>,
    message_count: Option<u64>,
}

impl<B: Backend, V: View> ChatController<B, V> {
    /// Creates a controller with empty session state.
    pub fn new(backend: B, view: V) -> Self {
        Self {
            backend,
            view,
            state: SessionState::new(),
            characters: Vec::new(),
            message_count: None,
        }
    }

    /// Returns the session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Returns the view for mutation.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the characters fetched by [`initialize`](Self::initialize).
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Conversation length the backend reported after the last successful chat turn.
    pub fn message_count(&self) -> Option<u64> {
        self.message_count
    }

    /// Fetches the character list and fills the selector.
    ///
    /// A failed fetch leaves a single disabled error entry in the selector and is otherwise
    /// harmless: every other operation keeps working.
    pub async fn initialize(&mut self) {
        let options = match self.backend.list_characters().await {
            Ok(characters) => {
                debug!(count = characters.len(), "loaded characters");
                self.characters = characters.clone();
                CharacterOptions::from_characters(characters)
            }
            Err(err) => {
                warn!(error = %err, "failed to load characters");
                self.characters.clear();
                CharacterOptions::Error
            }
        };
        self.view.set_character_options(&options);
        self.view.set_seed_display(self.state.seed());
    }

    /// Changes the selected character.
    ///
    /// `selection` is a slug, a 1-based index into the character list, or `None`/`"none"` to
    /// go back to no character.  Returns false, leaving the selection unchanged, when nothing
    /// matches.
    pub fn select_character(&mut self, selection: Option<&str>) -> bool {
        let selection = selection.map(str::trim).filter(|s| !s.is_empty());
        let Some(selection) = selection.filter(|s| !s.eq_ignore_ascii_case("none")) else {
            self.state.set_character(None);
            return true;
        };
        match find_character(&self.characters, selection) {
            Some(character) => {
                let notice = format!("Character changed to: {}", character.name);
                self.state.set_character(Some(character.slug.clone()));
                self.view.append_message(MessageRole::System, &notice);
                true
            }
            None => {
                self.view.append_message(
                    MessageRole::System,
                    &format!("Error: Unknown character: {selection}"),
                );
                false
            }
        }
    }

    /// Sends a chat message.
    ///
    /// Whitespace-only input is ignored without contacting the backend.
    pub async fn send_chat_message(&mut self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }

        self.view.append_message(MessageRole::User, message);
        self.view.clear_input(InputField::Chat);
        CHAT_MESSAGES_SENT.click();

        let request = ChatRequest::new(message, self.state.character());
        let result = with_loading(&mut self.view, self.backend.chat(request)).await;

        match result {
            Ok(turn) => {
                if turn.message_count.is_some() {
                    self.message_count = turn.message_count;
                }
                self.view
                    .append_message(MessageRole::Assistant, &turn.response);
            }
            Err(err) => match err.backend_message() {
                Some(message) => {
                    self.view
                        .append_message(MessageRole::System, &format!("Error: {message}"));
                }
                None => {
                    warn!(error = %err, "chat request failed");
                    self.view
                        .append_message(MessageRole::System, CHAT_FAILURE_MESSAGE);
                }
            },
        }
    }

    /// Generates an image from `prompt`, using conversation context.
    ///
    /// An empty prompt raises an alert and issues no request.  On success the seed display
    /// follows the seed the backend reported.
    pub async fn generate_image(&mut self, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.view.alert(EMPTY_PROMPT_ALERT);
            return;
        }

        let request = ImageRequest::with_context(prompt);
        let result = with_loading(&mut self.view, self.backend.generate_image(request)).await;

        match result {
            Ok(image) => {
                CHAT_IMAGES_GENERATED.click();
                self.state.set_seed(image.seed);
                self.view.set_seed_display(Some(image.seed));
                self.view.append_image(&image);
                self.view.clear_input(InputField::ImagePrompt);
            }
            Err(err) => match err.backend_message() {
                Some(message) => {
                    self.view
                        .append_message(MessageRole::System, &format!("Error: {message}"));
                }
                None => {
                    warn!(error = %err, "image request failed");
                    self.view
                        .append_message(MessageRole::System, IMAGE_FAILURE_MESSAGE);
                }
            },
        }
    }

    /// Asks the backend for a fresh seed.
    ///
    /// Failures are logged and never shown.
    pub async fn request_new_seed(&mut self) {
        CHAT_SEEDS_REQUESTED.click();
        match self.backend.new_seed().await {
            Ok(seed) => {
                self.state.set_seed(seed);
                self.view.set_seed_display(Some(seed));
                self.view.append_message(
                    MessageRole::System,
                    &format!(
                        "New seed generated: {seed}. Next images will have a different style."
                    ),
                );
            }
            Err(err) => {
                warn!(error = %err, "new seed request failed");
            }
        }
    }

    /// Clears the conversation after the user confirms.
    ///
    /// Declining is a no-op.  A failed clear request is logged and leaves the view and the
    /// seed untouched.
    pub async fn clear_history(&mut self) {
        if !self.view.confirm(CLEAR_CONFIRMATION) {
            return;
        }
        match self.backend.clear().await {
            Ok(()) => {
                CHAT_HISTORY_CLEARED.click();
                self.view.clear_messages();
                self.state.reset_seed();
                self.message_count = None;
                self.view.set_seed_display(None);
                self.view
                    .append_message(MessageRole::System, HISTORY_CLEARED_MESSAGE);
            }
            Err(err) => {
                warn!(error = %err, "clear request failed");
            }
        }
    }
}

/// Shows the loading indicator for exactly as long as `request` is pending.
///
/// The indicator is hidden on completion and also if the future is dropped mid-flight.
async fn with_loading<V: View, T>(view: &mut V, request: impl Future<Output = T>) -> T {
    let _loading = Loading::show(view);
    request.await
}

struct Loading<'a, V: View> {
    view: &'a mut V,
}

impl<'a, V: View> Loading<'a, V> {
    fn show(view: &'a mut V) -> Self {
        view.set_loading(true);
        Self { view }
    }
}

impl<V: View> Drop for Loading<'_, V> {
    fn drop(&mut self) {
        self.view.set_loading(false);
    }
}

fn find_character<'a>(characters: &'a [Character], selection: &str) -> Option<&'a Character> {
    if let Ok(index) = selection.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| characters.get(i));
    }
    characters
        .iter()
        .find(|c| c.slug.eq_ignore_ascii_case(selection))
        .or_else(|| {
            characters
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(selection))
        })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::{Error, Result};
    use crate::types::{ChatMessage, ChatTurn, GeneratedImage, MessageContent, Seed};
    use crate::view::seed_display_text;

    type Log = Arc<Mutex<Vec<String>>>;

    fn log(log: &Log, entry: impl Into<String>) {
        log.lock().unwrap().push(entry.into());
    }

    struct ScriptedBackend {
        log: Log,
        characters: Result<Vec<Character>>,
        chat_reply: Result<ChatTurn>,
        image_reply: Result<GeneratedImage>,
        seed_reply: Result<Seed>,
        clear_reply: Result<()>,
        chat_requests: Mutex<Vec<ChatRequest>>,
        image_requests: Mutex<Vec<ImageRequest>>,
    }

    impl ScriptedBackend {
        fn new(log: Log) -> Self {
            Self {
                log,
                characters: Ok(vec![
                    Character::new("ada", "Ada"),
                    Character::new("grace", "Grace"),
                ]),
                chat_reply: Ok(ChatTurn {
                    response: "Hello!".to_string(),
                    message_count: Some(2),
                }),
                image_reply: Ok(GeneratedImage {
                    bytes: b"png".to_vec(),
                    prompt: "a red fox. Context: hi".to_string(),
                    seed: Seed(4242),
                }),
                seed_reply: Ok(Seed(777)),
                clear_reply: Ok(()),
                chat_requests: Mutex::new(Vec::new()),
                image_requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> usize {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.starts_with("request:"))
                .count()
        }
    }

    #[async_trait::async_trait]
    impl Backend for ScriptedBackend {
        async fn list_characters(&self) -> Result<Vec<Character>> {
            log(&self.log, "request:characters");
            self.characters.clone()
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatTurn> {
            log(&self.log, "request:chat");
            self.chat_requests.lock().unwrap().push(request);
            self.chat_reply.clone()
        }

        async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedImage> {
            log(&self.log, "request:image");
            self.image_requests.lock().unwrap().push(request);
            self.image_reply.clone()
        }

        async fn new_seed(&self) -> Result<Seed> {
            log(&self.log, "request:seed");
            self.seed_reply.clone()
        }

        async fn clear(&self) -> Result<()> {
            log(&self.log, "request:clear");
            self.clear_reply.clone()
        }
    }

    struct RecordingView {
        log: Log,
        messages: Vec<ChatMessage>,
        seed_display: String,
        loading: bool,
        options: Option<CharacterOptions>,
        alerts: Vec<String>,
        confirm_answer: bool,
        questions: Vec<String>,
        chat_input: String,
        prompt_input: String,
    }

    impl RecordingView {
        fn new(log: Log) -> Self {
            Self {
                log,
                messages: Vec::new(),
                seed_display: seed_display_text(None),
                loading: false,
                options: None,
                alerts: Vec::new(),
                confirm_answer: true,
                questions: Vec::new(),
                chat_input: String::new(),
                prompt_input: String::new(),
            }
        }

        fn system_texts(&self) -> Vec<&str> {
            self.messages
                .iter()
                .filter(|m| m.role == MessageRole::System)
                .filter_map(|m| m.as_text())
                .collect()
        }
    }

    impl View for RecordingView {
        fn append_message(&mut self, role: MessageRole, text: &str) {
            self.messages.push(ChatMessage::text(role, text));
        }

        fn append_image(&mut self, image: &GeneratedImage) {
            self.messages.push(ChatMessage::image(image.clone()));
        }

        fn set_seed_display(&mut self, seed: Option<Seed>) {
            self.seed_display = seed_display_text(seed);
        }

        fn set_loading(&mut self, loading: bool) {
            self.loading = loading;
            log(&self.log, if loading { "loading:on" } else { "loading:off" });
        }

        fn clear_messages(&mut self) {
            self.messages.clear();
        }

        fn set_character_options(&mut self, options: &CharacterOptions) {
            self.options = Some(options.clone());
        }

        fn clear_input(&mut self, field: InputField) {
            match field {
                InputField::Chat => self.chat_input.clear(),
                InputField::ImagePrompt => self.prompt_input.clear(),
            }
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn confirm(&mut self, question: &str) -> bool {
            self.questions.push(question.to_string());
            self.confirm_answer
        }
    }

    fn controller_with(
        configure: impl FnOnce(&mut ScriptedBackend),
    ) -> (ChatController<ScriptedBackend, RecordingView>, Log) {
        let shared: Log = Arc::new(Mutex::new(Vec::new()));
        let mut backend = ScriptedBackend::new(shared.clone());
        configure(&mut backend);
        let view = RecordingView::new(shared.clone());
        (ChatController::new(backend, view), shared)
    }

    fn controller() -> (ChatController<ScriptedBackend, RecordingView>, Log) {
        controller_with(|_| {})
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn initialize_populates_selector() {
        let (mut controller, _) = controller();
        controller.initialize().await;
        let options = controller.view().options.clone().unwrap();
        let labels: Vec<String> = options.options().into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["No character (default)", "Ada", "Grace"]);
        assert_eq!(controller.characters().len(), 2);
        assert_eq!(controller.view().seed_display, "Not set");
    }

    #[tokio::test]
    async fn initialize_failure_is_not_fatal() {
        let (mut controller, _) = controller_with(|b| {
            b.characters = Err(Error::connection("refused", None));
        });
        controller.initialize().await;
        assert_eq!(controller.view().options, Some(CharacterOptions::Error));
        assert!(controller.view().messages.is_empty());

        controller.send_chat_message("still works").await;
        assert_eq!(controller.view().messages.len(), 2);
    }

    #[tokio::test]
    async fn empty_list_shows_placeholder() {
        let (mut controller, _) = controller_with(|b| b.characters = Ok(Vec::new()));
        controller.initialize().await;
        assert_eq!(controller.view().options, Some(CharacterOptions::Empty));
    }

    #[tokio::test]
    async fn whitespace_message_is_ignored() {
        let (mut controller, _) = controller();
        controller.send_chat_message("   \t ").await;
        controller.send_chat_message("").await;
        assert_eq!(controller.backend().requests(), 0);
        assert!(controller.view().messages.is_empty());
    }

    #[tokio::test]
    async fn chat_success_appends_one_assistant_message() {
        let (mut controller, _) = controller();
        controller.view_mut().chat_input = "  hi there ".to_string();
        controller.send_chat_message("  hi there ").await;

        let view = controller.view();
        assert_eq!(
            view.messages,
            vec![
                ChatMessage::text(MessageRole::User, "hi there"),
                ChatMessage::text(MessageRole::Assistant, "Hello!"),
            ]
        );
        assert!(view.chat_input.is_empty());
        assert_eq!(controller.message_count(), Some(2));
        let requests = controller.backend().chat_requests.lock().unwrap().clone();
        assert_eq!(requests, vec![ChatRequest::new("hi there", None)]);
    }

    #[tokio::test]
    async fn chat_carries_selected_character() {
        let (mut controller, _) = controller();
        controller.initialize().await;
        assert!(controller.select_character(Some("grace")));
        controller.send_chat_message("hello").await;
        let requests = controller.backend().chat_requests.lock().unwrap().clone();
        assert_eq!(requests[0].character_slug, "grace");
    }

    #[tokio::test]
    async fn chat_backend_error_is_shown_verbatim() {
        let (mut controller, _) = controller_with(|b| {
            b.chat_reply = Err(Error::backend("Model overloaded", Some(500)));
        });
        controller.send_chat_message("hello").await;
        assert_eq!(controller.view().system_texts(), vec!["Error: Model overloaded"]);
        assert_eq!(controller.view().messages.len(), 2);
    }

    #[tokio::test]
    async fn chat_transport_error_is_generic() {
        let (mut controller, _) = controller_with(|b| {
            b.chat_reply = Err(Error::serialization("bad json", None));
        });
        controller.send_chat_message("hello").await;
        assert_eq!(controller.view().system_texts(), vec![CHAT_FAILURE_MESSAGE]);
    }

    #[tokio::test]
    async fn loading_wraps_requests_on_every_path() {
        let (mut controller, log) = controller();
        controller.send_chat_message("hello").await;
        assert_eq!(events(&log), vec!["loading:on", "request:chat", "loading:off"]);
        assert!(!controller.view().loading);

        let (mut controller, log) = controller_with(|b| {
            b.image_reply = Err(Error::connection("refused", None));
        });
        controller.generate_image("a fox").await;
        assert_eq!(events(&log), vec!["loading:on", "request:image", "loading:off"]);
        assert!(!controller.view().loading);
    }

    #[tokio::test]
    async fn empty_prompt_alerts_without_request() {
        let (mut controller, _) = controller();
        controller.generate_image("  ").await;
        assert_eq!(controller.view().alerts, vec![EMPTY_PROMPT_ALERT]);
        assert_eq!(controller.backend().requests(), 0);
        assert!(!controller.view().loading);
    }

    #[tokio::test]
    async fn image_success_updates_seed() {
        let (mut controller, _) = controller();
        controller.view_mut().prompt_input = "a red fox".to_string();
        controller.generate_image("a red fox").await;

        assert_eq!(controller.state().seed(), Some(Seed(4242)));
        let view = controller.view();
        assert_eq!(view.seed_display, "4242");
        assert_eq!(view.messages.len(), 1);
        match &view.messages[0].content {
            MessageContent::Image(image) => {
                assert_eq!(image.seed, Seed(4242));
                assert!(image.caption().ends_with("| Seed: 4242"));
            }
            MessageContent::Text(text) => panic!("expected image, got {text}"),
        }
        assert!(view.prompt_input.is_empty());
        let requests = controller.backend().image_requests.lock().unwrap().clone();
        assert_eq!(requests, vec![ImageRequest::with_context("a red fox")]);
    }

    #[tokio::test]
    async fn image_error_keeps_prompt_and_seed() {
        let (mut controller, _) = controller_with(|b| {
            b.image_reply = Err(Error::backend("Failed to generate image", Some(500)));
        });
        controller.view_mut().prompt_input = "a red fox".to_string();
        controller.generate_image("a red fox").await;

        let view = controller.view();
        assert_eq!(view.system_texts(), vec!["Error: Failed to generate image"]);
        assert_eq!(view.prompt_input, "a red fox");
        assert_eq!(view.seed_display, "Not set");
    }

    #[tokio::test]
    async fn image_transport_error_is_generic() {
        let (mut controller, _) = controller_with(|b| {
            b.image_reply = Err(Error::encoding("bad payload", None));
        });
        controller.generate_image("a red fox").await;
        assert_eq!(controller.view().system_texts(), vec![IMAGE_FAILURE_MESSAGE]);
    }

    #[tokio::test]
    async fn new_seed_announces_itself() {
        let (mut controller, log) = controller();
        controller.request_new_seed().await;
        assert_eq!(controller.state().seed(), Some(Seed(777)));
        assert_eq!(controller.view().seed_display, "777");
        assert_eq!(
            controller.view().system_texts(),
            vec!["New seed generated: 777. Next images will have a different style."]
        );
        assert_eq!(events(&log), vec!["request:seed"]);
    }

    #[tokio::test]
    async fn new_seed_failure_is_silent() {
        let (mut controller, _) = controller_with(|b| {
            b.seed_reply = Err(Error::connection("refused", None));
        });
        controller.request_new_seed().await;
        assert!(controller.view().messages.is_empty());
        assert!(controller.view().alerts.is_empty());
        assert!(controller.state().seed().is_none());
    }

    #[tokio::test]
    async fn declining_clear_changes_nothing() {
        let (mut controller, _) = controller();
        controller.generate_image("a red fox").await;
        controller.view_mut().confirm_answer = false;

        controller.clear_history().await;
        assert_eq!(controller.view().questions, vec![CLEAR_CONFIRMATION]);
        assert_eq!(controller.view().messages.len(), 1);
        assert_eq!(controller.view().seed_display, "4242");
        assert_eq!(controller.state().seed(), Some(Seed(4242)));
        assert_eq!(controller.backend().requests(), 1);
    }

    #[tokio::test]
    async fn accepting_clear_resets_view_and_seed() {
        let (mut controller, _) = controller();
        controller.send_chat_message("hello").await;
        controller.generate_image("a red fox").await;

        controller.clear_history().await;
        let view = controller.view();
        assert_eq!(
            view.messages,
            vec![ChatMessage::text(MessageRole::System, HISTORY_CLEARED_MESSAGE)]
        );
        assert_eq!(view.seed_display, "Not set");
        assert!(controller.state().seed().is_none());
        assert!(controller.message_count().is_none());
    }

    #[tokio::test]
    async fn failed_clear_leaves_view_alone() {
        let (mut controller, _) = controller_with(|b| {
            b.clear_reply = Err(Error::connection("refused", None));
        });
        controller.send_chat_message("hello").await;
        controller.clear_history().await;
        assert_eq!(controller.view().messages.len(), 2);
    }

    #[tokio::test]
    async fn select_character_by_index_name_and_none() {
        let (mut controller, _) = controller();
        controller.initialize().await;

        assert!(controller.select_character(Some("1")));
        assert_eq!(controller.state().character(), Some("ada"));
        assert!(controller.select_character(Some("Grace")));
        assert_eq!(controller.state().character(), Some("grace"));
        assert_eq!(
            controller.view().system_texts(),
            vec!["Character changed to: Ada", "Character changed to: Grace"]
        );

        assert!(controller.select_character(Some("none")));
        assert!(controller.state().character().is_none());
        assert!(controller.select_character(None));
        assert_eq!(controller.view().messages.len(), 2);
    }

    #[tokio::test]
    async fn unknown_character_keeps_selection() {
        let (mut controller, _) = controller();
        controller.initialize().await;
        controller.select_character(Some("ada"));

        assert!(!controller.select_character(Some("nobody")));
        assert!(!controller.select_character(Some("0")));
        assert!(!controller.select_character(Some("3")));
        assert_eq!(controller.state().character(), Some("ada"));
        assert_eq!(
            controller.view().system_texts().last().copied(),
            Some("Error: Unknown character: 3")
        );
    }

    #[tokio::test]
    async fn dropped_request_still_hides_loading() {
        let (mut controller, _) = controller();
        let view = controller.view_mut();
        {
            let pending = with_loading(view, std::future::pending::<()>());
            let _ = tokio::time::timeout(std::time::Duration::from_millis(5), pending).await;
        }
        assert!(!controller.view().loading);
    }
}
