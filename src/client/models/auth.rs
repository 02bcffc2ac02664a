//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token issued by the identity endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// The token string
    pub token: String,

    /// Token expiration time
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token expires within `buffer` of now.
    pub fn expires_within(&self, buffer: chrono::Duration) -> bool {
        self.expires_at - buffer < Utc::now()
    }
}
