use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Latest result per `(email, courseId, moduleId)`, stored in `assignment_scores.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentScore {
    pub email: String,
    pub course_id: String,
    pub module_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    #[serde(default)]
    pub answers: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl AssignmentScore {
    pub fn key(&self) -> String {
        score_key(&self.email, &self.course_id, &self.module_id)
    }
}

/// Document key for one submission slot.
pub fn score_key(email: &str, course_id: &str, module_id: &str) -> String {
    format!("{email}-{course_id}-{module_id}")
}

/// `round(score / total * 100)`; `total` must be non-zero.
pub fn percentage(score: u32, total: u32) -> u32 {
    (f64::from(score) / f64::from(total) * 100.0).round() as u32
}
