//! Navigation tab state

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An open navigation tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Tab id
    pub id: String,
    /// Key of the handler that owns the tab
    pub handler_id: String,
    /// Owner of the tab
    pub user_id: String,
    /// Handler specific state
    #[serde(default)]
    pub handler_state: Value,
    /// Tab was restored for the current session
    #[serde(default)]
    pub restored: bool,
}

impl Tab {
    /// Create a restored tab with a generated id
    pub fn new(handler_id: impl Into<String>, user_id: impl Into<String>, handler_state: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            handler_id: handler_id.into(),
            user_id: user_id.into(),
            handler_state,
            restored: true,
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Per-user tab ordering and selection history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsState {
    /// Open tab ids in opening order
    pub tabs: Vec<String>,
    /// Most recently selected first
    pub history: Vec<String>,
    /// Selected tab id, empty when nothing is selected
    pub current_id: String,
}
