use serde::{Deserialize, Serialize};

/// Response body of the clear endpoint.  Only logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearReply {
    /// Confirmation text from the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
