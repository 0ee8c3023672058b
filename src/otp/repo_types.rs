use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One-time code as stored in `otps.json`, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub code: String,
    /// Unix epoch milliseconds.
    pub expires: i64,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl OtpRecord {
    /// Expired once `now_ms` reaches `expires`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires <= now_ms
    }
}
