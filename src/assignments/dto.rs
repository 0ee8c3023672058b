use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::assignments::services::Completion;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub module_id: String,
    pub score: Option<u32>,
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub answers: Value,
    pub questions: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    pub message: &'static str,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub email_sent: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_at: Option<OffsetDateTime>,
}

impl From<Completion> for CompletionResponse {
    fn from(c: Completion) -> Self {
        match c {
            Completion::Completed(s) => Self {
                completed: true,
                score: Some(s.score),
                total_questions: Some(s.total_questions),
                percentage: Some(s.percentage),
                submitted_at: Some(s.submitted_at),
            },
            Completion::NotCompleted => Self {
                completed: false,
                score: None,
                total_questions: None,
                percentage: None,
                submitted_at: None,
            },
        }
    }
}
