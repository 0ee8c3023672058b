use serde_json::Value;
use tracing::info;

use crate::assignments::repo_types::{percentage, AssignmentScore};
use crate::error::{require, AppError};
use crate::mailer::{deliver, Email};
use crate::state::AppState;

/// A graded attempt as reported by the client.
#[derive(Debug, Clone)]
pub struct Submission {
    pub email: String,
    pub course_id: String,
    pub module_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub answers: Value,
    pub questions: Option<Value>,
}

#[derive(Debug)]
pub struct Recorded {
    pub score: AssignmentScore,
    pub email_sent: bool,
}

#[derive(Debug)]
pub enum Completion {
    Completed(AssignmentScore),
    NotCompleted,
}

/// Record `sub` as the latest result for its slot, then mail the result.
///
/// A failed email does not undo the stored result; it only clears `email_sent`.
pub async fn submit_score(st: &AppState, sub: Submission) -> Result<Recorded, AppError> {
    require(&sub.email, "email")?;
    require(&sub.course_id, "courseId")?;
    require(&sub.module_id, "moduleId")?;
    if sub.total_questions == 0 {
        return Err(AppError::validation("totalQuestions must be greater than zero."));
    }
    if sub.score > sub.total_questions {
        return Err(AppError::validation("score cannot exceed totalQuestions."));
    }

    let questions = match sub.questions {
        Some(q) => Some(q),
        None => st.catalog.questions(&sub.course_id, &sub.module_id).await,
    };

    let record = AssignmentScore {
        percentage: percentage(sub.score, sub.total_questions),
        email: sub.email,
        course_id: sub.course_id,
        module_id: sub.module_id,
        score: sub.score,
        total_questions: sub.total_questions,
        answers: sub.answers,
        questions,
        submitted_at: st.clock.now(),
    };
    st.scores.upsert(record.clone()).await?;
    info!(
        email = %record.email,
        course_id = %record.course_id,
        module_id = %record.module_id,
        score = record.score,
        total = record.total_questions,
        "assignment score recorded"
    );

    let email_sent = deliver(st.mailer.as_ref(), &result_email(&record)).await;
    Ok(Recorded {
        score: record,
        email_sent,
    })
}

pub async fn scores_for(st: &AppState, email: &str) -> Vec<AssignmentScore> {
    st.scores.list_by_email(email).await
}

pub async fn check_completion(
    st: &AppState,
    email: &str,
    course_id: &str,
    module_id: &str,
) -> Completion {
    match st.scores.find(email, course_id, module_id).await {
        Some(score) => Completion::Completed(score),
        None => Completion::NotCompleted,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(no answer)".to_string(),
        other => other.to_string(),
    }
}

/// `(question, submitted answer)` pairs, when the question list can be read.
///
/// Answers are matched by position for arrays, and by question `id` or index
/// for objects.
fn answered_questions(questions: Option<&Value>, answers: &Value) -> Vec<(String, String)> {
    let Some(Value::Array(questions)) = questions else {
        return Vec::new();
    };
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let text = match q {
                Value::Object(fields) => fields
                    .get("question")
                    .or_else(|| fields.get("text"))
                    .map(display)
                    .unwrap_or_else(|| format!("Question {}", i + 1)),
                other => display(other),
            };
            let answer = match answers {
                Value::Array(list) => list.get(i),
                Value::Object(map) => q
                    .get("id")
                    .map(display)
                    .and_then(|id| map.get(&id))
                    .or_else(|| map.get(&i.to_string())),
                _ => None,
            };
            (text, answer.map(display).unwrap_or_else(|| "(no answer)".into()))
        })
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn result_email(score: &AssignmentScore) -> Email {
    let lines = answered_questions(score.questions.as_ref(), &score.answers);
    let summary = format!(
        "You scored {} out of {} ({}%).",
        score.score, score.total_questions, score.percentage
    );

    let mut text = format!(
        "Your result for {} / {}:\n{summary}\n",
        score.course_id, score.module_id
    );
    let mut html = format!(
        "<h2>{} / {}</h2><p>{}</p>",
        escape_html(&score.course_id),
        escape_html(&score.module_id),
        escape_html(&summary)
    );
    if !lines.is_empty() {
        text.push_str("\nYour answers:\n");
        html.push_str("<ol>");
        for (question, answer) in &lines {
            text.push_str(&format!("- {question}\n  {answer}\n"));
            html.push_str(&format!(
                "<li><p>{}</p><p><strong>{}</strong></p></li>",
                escape_html(question),
                escape_html(answer)
            ));
        }
        html.push_str("</ol>");
    }

    Email {
        to: score.email.clone(),
        subject: format!(
            "Your {} / {} assignment result",
            score.course_id, score.module_id
        ),
        text,
        html: Some(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::catalog::CATALOG_DOCUMENT;
    use crate::store::JsonStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn submission(score: u32, total: u32) -> Submission {
        Submission {
            email: "ada@example.com".into(),
            course_id: "webdev".into(),
            module_id: "module1".into(),
            score,
            total_questions: total,
            answers: json!(["<a>", "margin"]),
            questions: None,
        }
    }

    #[tokio::test]
    async fn resubmission_keeps_only_latest() {
        let dir = TempDir::new().unwrap();
        let (st, _, _) = AppState::fake(dir.path());

        submit_score(&st, submission(5, 10)).await.unwrap();
        let second = submit_score(&st, submission(8, 10)).await.unwrap();
        assert_eq!(second.score.percentage, 80);

        let scores = scores_for(&st, "ada@example.com").await;
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 8);
        assert_eq!(scores[0].percentage, 80);
    }

    #[tokio::test]
    async fn percentage_is_rounded() {
        let dir = TempDir::new().unwrap();
        let (st, _, _) = AppState::fake(dir.path());

        let mut one_third = submission(1, 3);
        one_third.module_id = "m1".into();
        let mut two_thirds = submission(2, 3);
        two_thirds.module_id = "m2".into();

        assert_eq!(submit_score(&st, one_third).await.unwrap().score.percentage, 33);
        assert_eq!(submit_score(&st, two_thirds).await.unwrap().score.percentage, 67);
    }

    #[tokio::test]
    async fn invalid_totals_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (st, _, _) = AppState::fake(dir.path());

        assert!(matches!(
            submit_score(&st, submission(0, 0)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            submit_score(&st, submission(4, 3)).await,
            Err(AppError::Validation(_))
        ));
        assert!(scores_for(&st, "ada@example.com").await.is_empty());
    }

    #[tokio::test]
    async fn mail_failure_keeps_the_score() {
        let dir = TempDir::new().unwrap();
        let (st, _, mailer) = AppState::fake(dir.path());
        mailer.set_failing(true);

        let recorded = submit_score(&st, submission(7, 10)).await.unwrap();
        assert!(!recorded.email_sent);
        assert!(matches!(
            check_completion(&st, "ada@example.com", "webdev", "module1").await,
            Completion::Completed(s) if s.score == 7
        ));
    }

    #[tokio::test]
    async fn completion_reports_missing_slot() {
        let dir = TempDir::new().unwrap();
        let (st, _, _) = AppState::fake(dir.path());
        assert!(matches!(
            check_completion(&st, "ada@example.com", "webdev", "module1").await,
            Completion::NotCompleted
        ));
    }

    #[tokio::test]
    async fn catalog_questions_fill_the_snapshot_and_email() {
        let dir = TempDir::new().unwrap();
        let (st, _, mailer) = AppState::fake(dir.path());
        JsonStore::new(dir.path())
            .save(
                CATALOG_DOCUMENT,
                &json!({ "webdev": { "module1": { "questions": [
                    { "question": "Tag for links?" },
                    { "question": "Space outside the border?" }
                ] } } }),
            )
            .await
            .unwrap();

        let recorded = submit_score(&st, submission(2, 2)).await.unwrap();
        assert!(recorded.email_sent);
        assert!(recorded.score.questions.is_some());

        let sent = &mailer.sent()[0];
        assert_eq!(sent.to, "ada@example.com");
        assert_eq!(sent.subject, "Your webdev / module1 assignment result");
        assert!(sent.text.contains("You scored 2 out of 2 (100%)."));
        assert!(sent.text.contains("Tag for links?"));
        let html = sent.html.as_deref().unwrap();
        assert!(html.contains("&lt;a&gt;"));
        assert!(!html.contains("<a>"));
    }

    #[test]
    fn answers_match_by_id_or_index() {
        let questions = json!([{ "id": "q1", "question": "One" }, { "question": "Two" }]);
        let answers = json!({ "q1": "first", "1": "second" });
        assert_eq!(
            answered_questions(Some(&questions), &answers),
            vec![
                ("One".to_string(), "first".to_string()),
                ("Two".to_string(), "second".to_string())
            ]
        );
        assert!(answered_questions(None, &answers).is_empty());
    }
}
