use crate::assignments::{catalog::AssignmentCatalog, repo::ScoreRepo};
use crate::auth::repo::UserRepo;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::mailer::{Mailer, OutboxMailer};
use crate::otp::repo::OtpRepo;
use crate::store::JsonStore;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserRepo>,
    pub otps: Arc<OtpRepo>,
    pub scores: Arc<ScoreRepo>,
    pub catalog: Arc<AssignmentCatalog>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .with_context(|| format!("create data dir {}", config.data_dir.display()))?;

        let mailer = Arc::new(OutboxMailer::new(
            config.mail.from.clone(),
            config.mail.outbox_dir.clone(),
        )) as Arc<dyn Mailer>;

        Ok(Self::from_parts(&config, mailer, Arc::new(SystemClock)))
    }

    pub fn from_parts(config: &AppConfig, mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(JsonStore::new(config.data_dir.clone()));
        Self {
            users: Arc::new(UserRepo::new(store.clone())),
            otps: Arc::new(OtpRepo::new(store.clone())),
            scores: Arc::new(ScoreRepo::new(store.clone())),
            catalog: Arc::new(AssignmentCatalog::new(store)),
            mailer,
            clock,
        }
    }

    /// State over `dir` with a hand-driven clock and an in-memory mailer.
    #[cfg(test)]
    pub fn fake(
        dir: &std::path::Path,
    ) -> (
        Self,
        Arc<crate::clock::ManualClock>,
        Arc<crate::mailer::RecordingMailer>,
    ) {
        use crate::clock::ManualClock;
        use crate::config::MailConfig;
        use crate::mailer::RecordingMailer;

        let config = AppConfig {
            data_dir: dir.to_path_buf(),
            mail: MailConfig {
                from: "no-reply@test.local".into(),
                outbox_dir: dir.join("outbox"),
            },
        };

        let clock = Arc::new(ManualClock::new(time::macros::datetime!(2024-03-01 09:00:00 UTC)));
        let mailer = Arc::new(RecordingMailer::default());
        let state = Self::from_parts(&config, mailer.clone(), clock.clone());
        (state, clock, mailer)
    }
}
