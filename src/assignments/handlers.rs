use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{
    assignments::{
        dto::{CompletionResponse, SubmitScoreRequest, SubmitScoreResponse},
        repo_types::AssignmentScore,
        services::{check_completion, scores_for, submit_score, Submission},
    },
    error::AppError,
    state::AppState,
};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/submit-assignment", post(submit_assignment))
        .route("/scores/:email", get(list_scores))
        .route(
            "/assignment-status/:email/:course_id/:module_id",
            get(assignment_status),
        )
        .route("/assignments/:course_id/:module_id", get(get_assignment))
}

#[instrument(skip(state, payload))]
pub async fn submit_assignment(
    State(state): State<AppState>,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<Json<SubmitScoreResponse>, AppError> {
    let score = payload
        .score
        .ok_or_else(|| AppError::validation("score is required."))?;
    let total_questions = payload
        .total_questions
        .ok_or_else(|| AppError::validation("totalQuestions is required."))?;

    let recorded = submit_score(
        &state,
        Submission {
            email: payload.email,
            course_id: payload.course_id,
            module_id: payload.module_id,
            score,
            total_questions,
            answers: payload.answers,
            questions: payload.questions,
        },
    )
    .await?;

    Ok(Json(SubmitScoreResponse {
        message: "Assignment submitted successfully!",
        score: recorded.score.score,
        total_questions: recorded.score.total_questions,
        percentage: recorded.score.percentage,
        email_sent: recorded.email_sent,
    }))
}

#[instrument(skip(state))]
pub async fn list_scores(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Json<Vec<AssignmentScore>> {
    Json(scores_for(&state, &email).await)
}

#[instrument(skip(state))]
pub async fn assignment_status(
    State(state): State<AppState>,
    Path((email, course_id, module_id)): Path<(String, String, String)>,
) -> Json<CompletionResponse> {
    Json(check_completion(&state, &email, &course_id, &module_id).await.into())
}

#[instrument(skip(state))]
pub async fn get_assignment(
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state
        .catalog
        .find(&course_id, &module_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            warn!(%course_id, %module_id, "assignment not found");
            AppError::NotFound("Assignment not found.".into())
        })
}
