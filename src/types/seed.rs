use std::fmt;

use serde::{Deserialize, Serialize};

/// An integer controlling reproducible variation in generated images.
///
/// Seeds are only ever taken from backend responses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub u64);

impl Seed {
    /// The raw seed value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed(value)
    }
}

/// Response body of the new-seed endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedReply {
    /// The seed the backend will use for subsequent images.
    pub seed: Seed,
}
