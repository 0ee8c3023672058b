use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

/// Outgoing message.
#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> anyhow::Result<()>;
}

/// Send `email`, logging a failure instead of returning it.
pub async fn deliver(mailer: &dyn Mailer, email: &Email) -> bool {
    match mailer.send(email).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, to = %email.to, subject = %email.subject, "email delivery failed");
            false
        }
    }
}

/// Drops each message as a JSON file into an outbox directory for a relay to pick up.
#[derive(Clone)]
pub struct OutboxMailer {
    from: String,
    outbox: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboxEntry<'a> {
    from: &'a str,
    #[serde(flatten)]
    email: &'a Email,
    #[serde(with = "time::serde::rfc3339")]
    queued_at: OffsetDateTime,
}

impl OutboxMailer {
    pub fn new(from: impl Into<String>, outbox: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            outbox: outbox.into(),
        }
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        let queued_at = OffsetDateTime::now_utc();
        let entry = OutboxEntry {
            from: &self.from,
            email,
            queued_at,
        };
        let body = serde_json::to_vec_pretty(&entry).context("serialize outbox entry")?;

        tokio::fs::create_dir_all(&self.outbox)
            .await
            .with_context(|| format!("create outbox {}", self.outbox.display()))?;
        let path = self.outbox.join(format!(
            "{}-{}.json",
            queued_at.unix_timestamp_nanos(),
            Uuid::new_v4().simple()
        ));
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("write outbox entry {}", path.display()))?;

        info!(to = %email.to, subject = %email.subject, "email queued");
        Ok(())
    }
}

/// Keeps sent messages in memory; can be switched to fail every send.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<Email>>,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("smtp unavailable");
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
