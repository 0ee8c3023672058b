use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            MessageResponse, PublicUser, SecurityAnswerRequest, SecurityQuestionRequest,
            SignInRequest, SignUpRequest, UserResponse,
        },
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/security-question", post(update_security_question))
        .route("/verify-security-answer", post(verify_security_answer))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = services::sign_up(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User signed up successfully!",
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::sign_in(&state, &payload.email, &payload.password).await?;
    Ok(Json(UserResponse {
        message: "Sign in successful!",
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_security_question(
    State(state): State<AppState>,
    Json(payload): Json<SecurityQuestionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::update_security_question(&state, &payload.email, &payload.question, &payload.answer)
        .await?;
    Ok(Json(MessageResponse {
        message: "Security question updated successfully.",
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_security_answer(
    State(state): State<AppState>,
    Json(payload): Json<SecurityAnswerRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if !services::verify_security_answer(&state, &payload.email, &payload.answer).await {
        warn!(email = %payload.email, "security answer rejected");
        return Err(AppError::Invalid("Incorrect security answer.".into()));
    }
    info!(email = %payload.email, "security answer verified");
    Ok(Json(MessageResponse {
        message: "Security answer verified.",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn signup_body(email: &str) -> SignUpRequest {
        SignUpRequest {
            name: "Ada".into(),
            email: email.into(),
            password: "abc12!".into(),
            security_question: Some("Pet?".into()),
            security_answer: Some("Rex".into()),
        }
    }

    #[tokio::test]
    async fn signup_then_signin() {
        let dir = TempDir::new().unwrap();
        let (state, _, _) = AppState::fake(dir.path());

        let (status, Json(created)) =
            signup(State(state.clone()), Json(signup_body("ada@example.com")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.user.email, "ada@example.com");

        let Json(signed_in) = signin(
            State(state),
            Json(SignInRequest {
                email: "ada@example.com".into(),
                password: "abc12!".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(signed_in.message, "Sign in successful!");
        assert_eq!(signed_in.user.id, created.user.id);
        assert!(signed_in.user.last_login.is_some());
    }

    #[tokio::test]
    async fn signin_with_empty_fields_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let (state, _, _) = AppState::fake(dir.path());

        let err = signin(
            State(state),
            Json(SignInRequest {
                email: "ada@example.com".into(),
                password: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_signup_maps_to_conflict_status() {
        let dir = TempDir::new().unwrap();
        let (state, _, _) = AppState::fake(dir.path());
        signup(State(state.clone()), Json(signup_body("ada@example.com")))
            .await
            .unwrap();

        let err = signup(State(state), Json(signup_body("ada@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn security_answer_endpoint_reports_invalid() {
        let dir = TempDir::new().unwrap();
        let (state, _, _) = AppState::fake(dir.path());
        signup(State(state.clone()), Json(signup_body("ada@example.com")))
            .await
            .unwrap();

        assert!(verify_security_answer(
            State(state.clone()),
            Json(SecurityAnswerRequest {
                email: "ada@example.com".into(),
                answer: "rex".into(),
            }),
        )
        .await
        .is_ok());

        let err = verify_security_answer(
            State(state),
            Json(SecurityAnswerRequest {
                email: "ada@example.com".into(),
                answer: "fido".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
