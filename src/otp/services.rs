use rand::Rng;
use time::Duration;
use tracing::{error, info, warn};

use crate::clock::unix_millis;
use crate::error::AppError;
use crate::mailer::{deliver, Email};
use crate::otp::repo_types::OtpRecord;
use crate::state::AppState;
use crate::store::StoreError;

/// How long an issued code stays valid.
pub const OTP_TTL: Duration = Duration::milliseconds(300_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Invalid,
}

/// Uniform six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

fn otp_email(to: &str, code: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Your EduVerse Security Code".into(),
        text: format!(
            "Your one-time security code is: {code}. Do not share this code with anyone."
        ),
        html: None,
    }
}

/// Issue a fresh code for `email`, replacing any earlier one, and mail it.
///
/// Failing to persist or to deliver the code both count as failing to send.
pub async fn issue_code(st: &AppState, email: &str) -> Result<String, AppError> {
    let now = st.clock.now();
    let record = OtpRecord {
        code: generate_code(),
        expires: unix_millis(now + OTP_TTL),
        created_at: Some(now),
    };
    let code = record.code.clone();

    if let Err(e) = st.otps.upsert(email, record).await {
        error!(error = %e, email, "security code not stored");
        return Err(send_failed());
    }

    if !deliver(st.mailer.as_ref(), &otp_email(email, &code)).await {
        return Err(send_failed());
    }

    info!(email, "security code issued");
    Ok(code)
}

fn send_failed() -> AppError {
    AppError::Delivery("Failed to send security code.".into())
}

/// Consume the code for `email` if it matches and has not expired.
///
/// A mismatched or expired code leaves the stored entry in place.
pub async fn verify_code(
    st: &AppState,
    email: &str,
    submitted: &str,
) -> Result<VerifyOutcome, StoreError> {
    let now_ms = st.clock.now_millis();
    let taken = st
        .otps
        .take_if(email, |record| {
            record.code == submitted && !record.is_expired(now_ms)
        })
        .await?;

    Ok(match taken {
        Some(_) => {
            info!(email, "security code verified");
            VerifyOutcome::Verified
        }
        None => {
            warn!(email, "security code rejected");
            VerifyOutcome::Invalid
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[tokio::test]
    async fn code_is_single_use() {
        let dir = TempDir::new().unwrap();
        let (st, _, mailer) = AppState::fake(dir.path());

        let code = issue_code(&st, "ada@example.com").await.unwrap();
        assert!(mailer.sent()[0].text.contains(&code));

        assert_eq!(
            verify_code(&st, "ada@example.com", &code).await.unwrap(),
            VerifyOutcome::Verified
        );
        assert_eq!(
            verify_code(&st, "ada@example.com", &code).await.unwrap(),
            VerifyOutcome::Invalid
        );
    }

    #[tokio::test]
    async fn code_expires_after_five_minutes() {
        let dir = TempDir::new().unwrap();
        let (st, clock, _) = AppState::fake(dir.path());

        let code = issue_code(&st, "ada@example.com").await.unwrap();
        clock.advance(Duration::milliseconds(300_001));

        assert_eq!(
            verify_code(&st, "ada@example.com", &code).await.unwrap(),
            VerifyOutcome::Invalid
        );
        // An expired entry is left for the sweep.
        assert!(st.otps.find("ada@example.com").await.is_some());
    }

    #[tokio::test]
    async fn code_is_valid_just_before_expiry() {
        let dir = TempDir::new().unwrap();
        let (st, clock, _) = AppState::fake(dir.path());

        let code = issue_code(&st, "ada@example.com").await.unwrap();
        clock.advance(Duration::milliseconds(299_999));

        assert_eq!(
            verify_code(&st, "ada@example.com", &code).await.unwrap(),
            VerifyOutcome::Verified
        );
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_code() {
        let dir = TempDir::new().unwrap();
        let (st, _, _) = AppState::fake(dir.path());

        let first = issue_code(&st, "ada@example.com").await.unwrap();
        let mut second = issue_code(&st, "ada@example.com").await.unwrap();
        while second == first {
            second = issue_code(&st, "ada@example.com").await.unwrap();
        }

        assert_eq!(
            verify_code(&st, "ada@example.com", &first).await.unwrap(),
            VerifyOutcome::Invalid
        );
        assert_eq!(
            verify_code(&st, "ada@example.com", &second).await.unwrap(),
            VerifyOutcome::Verified
        );
    }

    #[tokio::test]
    async fn wrong_code_leaves_entry_untouched() {
        let dir = TempDir::new().unwrap();
        let (st, _, _) = AppState::fake(dir.path());

        let code = issue_code(&st, "ada@example.com").await.unwrap();
        let wrong = if code == "123456" { "654321" } else { "123456" };

        assert_eq!(
            verify_code(&st, "ada@example.com", wrong).await.unwrap(),
            VerifyOutcome::Invalid
        );
        assert_eq!(
            verify_code(&st, "ada@example.com", &code).await.unwrap(),
            VerifyOutcome::Verified
        );
    }

    #[tokio::test]
    async fn delivery_failure_is_a_send_failure_but_code_stays_stored() {
        let dir = TempDir::new().unwrap();
        let (st, _, mailer) = AppState::fake(dir.path());
        mailer.set_failing(true);

        let err = issue_code(&st, "ada@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
        assert!(st.otps.find("ada@example.com").await.is_some());
    }

    #[tokio::test]
    async fn persistence_failure_is_a_send_failure() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"not a directory").unwrap();
        let (st, _, mailer) = AppState::fake(&blocked);

        let err = issue_code(&st, "ada@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
        assert!(mailer.sent().is_empty());
    }
}
