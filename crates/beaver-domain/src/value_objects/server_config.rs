//! Server configuration as reported by the backend

use serde::{Deserialize, Serialize};

/// Server configuration returned by the `serverConfig` query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Server display name
    pub name: String,
    /// Server version
    pub version: String,
    /// Anonymous users may browse connections
    pub anonymous_access_enabled: bool,
    /// Authentication is required
    pub authentication_enabled: bool,
    /// Server has not been configured yet
    pub configuration_mode: bool,
    /// Users may create their own connections
    pub support_custom_connections: bool,
    /// Language codes offered by the server
    pub supported_languages: Vec<String>,
}

impl ServerConfig {
    /// True when the server runs the first-time setup wizard
    pub fn is_configuration_mode(&self) -> bool {
        self.configuration_mode
    }
}
