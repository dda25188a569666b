//! Request context attached to outgoing service calls

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Origin of a command: which request and which user caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Unique identifier for this context (ULID)
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            id: Ulid::new().to_string(),
            user_id: None,
        }
    }

    /// Context for a cloud request carrying its own id (e.g. `X-Request-Id`)
    pub fn with_request_id(request_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            id: request_id.into(),
            user_id,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
