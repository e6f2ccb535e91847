//! Per-controller session state.

use crate::types::Seed;

/// Transient state of one chat session.
///
/// Lives as long as the controller that owns it and is never persisted.  The seed is only
/// ever copied from backend responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Slug of the selected character, if any.
    pub current_character: Option<String>,

    /// Seed the backend reported most recently, if any.
    pub current_seed: Option<Seed>,
}

impl SessionState {
    /// Creates an empty session state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a character; `None` or an empty slug clears the selection.
    pub fn set_character(&mut self, slug: Option<String>) {
        self.current_character = slug.filter(|slug| !slug.is_empty());
    }

    /// Returns the selected character slug, if any.
    pub fn character(&self) -> Option<&str> {
        self.current_character.as_deref()
    }

    /// Records a seed reported by the backend.
    pub fn set_seed(&mut self, seed: Seed) {
        self.current_seed = Some(seed);
    }

    /// Returns the current seed, if any.
    pub fn seed(&self) -> Option<Seed> {
        self.current_seed
    }

    /// Forgets the seed.
    pub fn reset_seed(&mut self) {
        self.current_seed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let state = SessionState::new();
        assert!(state.character().is_none());
        assert!(state.seed().is_none());
    }

    #[test]
    fn empty_slug_clears_character() {
        let mut state = SessionState::new();
        state.set_character(Some("ada".to_string()));
        assert_eq!(state.character(), Some("ada"));
        state.set_character(Some(String::new()));
        assert!(state.character().is_none());
    }

    #[test]
    fn seed_round_trip() {
        let mut state = SessionState::new();
        state.set_seed(Seed(12));
        assert_eq!(state.seed(), Some(Seed(12)));
        state.reset_seed();
        assert!(state.seed().is_none());
    }
}
