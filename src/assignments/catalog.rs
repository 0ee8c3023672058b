use std::sync::Arc;

use serde_json::Value;

use crate::store::JsonStore;

pub const CATALOG_DOCUMENT: &str = "assignments";

/// Read-only view of `assignments.json`: `courseId -> moduleId -> assignment`.
///
/// The document is opaque apart from those two levels; entries of any other
/// shape are skipped, and only the question list of an assignment is looked into.
pub struct AssignmentCatalog {
    store: Arc<JsonStore>,
}

impl AssignmentCatalog {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, course_id: &str, module_id: &str) -> Option<Value> {
        let mut catalog: Value = self.store.load(CATALOG_DOCUMENT, Value::Null).await;
        catalog.get_mut(course_id)?.get_mut(module_id).map(Value::take)
    }

    /// Question list of an assignment, if it has one.
    pub async fn questions(&self, course_id: &str, module_id: &str) -> Option<Value> {
        question_list(self.find(course_id, module_id).await?)
    }
}

/// An assignment is either a bare question array or an object with `questions`.
pub fn question_list(assignment: Value) -> Option<Value> {
    match assignment {
        Value::Array(_) => Some(assignment),
        Value::Object(mut fields) => match fields.remove("questions") {
            Some(list @ Value::Array(_)) => Some(list),
            _ => None,
        },
        _ => None,
    }
}
