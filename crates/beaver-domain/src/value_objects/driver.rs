//! Database driver descriptor

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Database driver returned by the `driverList` query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbDriver {
    /// Driver id
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Icon reference
    pub icon: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Default port
    pub default_port: Option<String>,
    /// Default database
    pub default_database: Option<String>,
    /// Default server host
    pub default_server: Option<String>,
    /// Default user
    pub default_user: Option<String>,
    /// Sample JDBC URL
    #[serde(rename = "sampleURL")]
    pub sample_url: Option<String>,
    /// Embedded database driver
    pub embedded: Option<bool>,
    /// Driver allows anonymous access
    pub anonymous_access: Option<bool>,
    /// Promotion score, higher sorts first
    pub promoted_score: Option<i64>,
    /// Default authentication model id
    pub default_auth_model: Option<String>,
}

impl DbDriver {
    /// Display ordering: promoted score descending, then name
    pub fn compare(&self, other: &Self) -> Ordering {
        let score = self.promoted_score.unwrap_or(0);
        let other_score = other.promoted_score.unwrap_or(0);

        if score == other_score {
            self.name
                .as_deref()
                .unwrap_or_default()
                .cmp(other.name.as_deref().unwrap_or_default())
        } else {
            other_score.cmp(&score)
        }
    }
}
