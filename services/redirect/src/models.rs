//! API models for request and response payloads

use serde::{Deserialize, Serialize};

/// Response for a generated redirect document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRedirectResponse {
    /// Public path the document can be downloaded from
    pub download_url: String,
    pub filename: String,
}
