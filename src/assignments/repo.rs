use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assignments::repo_types::{score_key, AssignmentScore};
use crate::store::{Change, Collection, JsonStore, StoreError};

pub const SCORES_DOCUMENT: &str = "assignment_scores";

pub struct ScoreRepo {
    docs: Collection<BTreeMap<String, AssignmentScore>>,
}

impl ScoreRepo {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            docs: Collection::new(store, SCORES_DOCUMENT),
        }
    }

    pub async fn reload(&self) -> BTreeMap<String, AssignmentScore> {
        self.docs.reload().await
    }

    pub async fn find(
        &self,
        email: &str,
        course_id: &str,
        module_id: &str,
    ) -> Option<AssignmentScore> {
        self.reload()
            .await
            .remove(&score_key(email, course_id, module_id))
    }

    /// All results recorded for `email`.
    ///
    /// Matches on the record's own email field, since keys are ambiguous when
    /// ids contain dashes.
    pub async fn list_by_email(&self, email: &str) -> Vec<AssignmentScore> {
        self.reload()
            .await
            .into_values()
            .filter(|s| s.email == email)
            .collect()
    }

    /// Write `score` at its key, overwriting any earlier submission.
    pub async fn upsert(&self, score: AssignmentScore) -> Result<(), StoreError> {
        self.docs
            .update(|scores| {
                scores.insert(score.key(), score);
                Change::Write(())
            })
            .await
    }
}
