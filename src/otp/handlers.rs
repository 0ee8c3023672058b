use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::dto::MessageResponse,
    error::{require, AppError},
    otp::{
        dto::{IssueCodeRequest, VerifyCodeRequest},
        services::{issue_code, verify_code, VerifyOutcome},
    },
    state::AppState,
};

pub fn otp_routes() -> Router<AppState> {
    Router::new()
        .route("/get-security-code", post(get_security_code))
        .route("/verify-security-code", post(verify_security_code))
}

#[instrument(skip(state, payload))]
pub async fn get_security_code(
    State(state): State<AppState>,
    Json(payload): Json<IssueCodeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    require(&payload.email, "email")?;
    issue_code(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: "Security code sent to your email.",
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_security_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    require(&payload.email, "email")?;
    require(&payload.code, "code")?;
    match verify_code(&state, &payload.email, &payload.code).await? {
        VerifyOutcome::Verified => Ok(Json(MessageResponse {
            message: "Code verified successfully!",
        })),
        VerifyOutcome::Invalid => Err(AppError::Invalid("Invalid or expired code.".into())),
    }
}
