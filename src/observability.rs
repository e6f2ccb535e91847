use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("seedchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("seedchat.client.request_errors");
pub(crate) static CLIENT_BACKEND_ERRORS: Counter = Counter::new("seedchat.client.backend_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("seedchat.client.request_duration_seconds");

pub(crate) static CHAT_MESSAGES_SENT: Counter = Counter::new("seedchat.chat.messages_sent");
pub(crate) static CHAT_IMAGES_GENERATED: Counter = Counter::new("seedchat.chat.images_generated");
pub(crate) static CHAT_SEEDS_REQUESTED: Counter = Counter::new("seedchat.chat.seeds_requested");
pub(crate) static CHAT_HISTORY_CLEARED: Counter = Counter::new("seedchat.chat.history_cleared");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_BACKEND_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_MESSAGES_SENT);
    collector.register_counter(&CHAT_IMAGES_GENERATED);
    collector.register_counter(&CHAT_SEEDS_REQUESTED);
    collector.register_counter(&CHAT_HISTORY_CLEARED);
}
