use std::collections::BTreeMap;
use std::sync::Arc;

use crate::otp::repo_types::OtpRecord;
use crate::store::{Change, Collection, JsonStore, StoreError};

pub const OTPS_DOCUMENT: &str = "otps";

/// Active codes, at most one per email, backed by `otps.json`.
pub struct OtpRepo {
    docs: Collection<BTreeMap<String, OtpRecord>>,
}

impl OtpRepo {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            docs: Collection::new(store, OTPS_DOCUMENT),
        }
    }

    pub async fn reload(&self) -> BTreeMap<String, OtpRecord> {
        self.docs.reload().await
    }

    pub async fn find(&self, email: &str) -> Option<OtpRecord> {
        self.reload().await.remove(email)
    }

    /// Store `record` for `email`, replacing any previous code.
    pub async fn upsert(&self, email: &str, record: OtpRecord) -> Result<(), StoreError> {
        self.docs
            .update(|otps| {
                otps.insert(email.to_string(), record);
                Change::Write(())
            })
            .await
    }

    /// Remove the entry for `email` if `accept` approves it.
    ///
    /// A rejected or missing entry is left as is and nothing is written.
    pub async fn take_if(
        &self,
        email: &str,
        accept: impl FnOnce(&OtpRecord) -> bool,
    ) -> Result<Option<OtpRecord>, StoreError> {
        self.docs
            .update(|otps| {
                if otps.get(email).is_some_and(accept) {
                    Change::Write(otps.remove(email))
                } else {
                    Change::Keep(None)
                }
            })
            .await
    }

    /// Drop every entry expired at `now_ms`. Writes only when something was removed.
    pub async fn purge_expired(&self, now_ms: i64) -> Result<usize, StoreError> {
        self.docs
            .update(|otps| {
                let before = otps.len();
                otps.retain(|_, record| !record.is_expired(now_ms));
                match before - otps.len() {
                    0 => Change::Keep(0),
                    removed => Change::Write(removed),
                }
            })
            .await
    }
}
