/*
[INPUT]:  Stored task documents, user input from the view layer
[OUTPUT]: Typed tasks, new-task and partial-update field maps
[POS]:    Data layer - task model
[UPDATE]: When task fields or stored field names change
*/

use firetodo_adapter::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the owner's uid, used to filter queries
pub const OWNER_FIELD: &str = "userId";

/// Todo item owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    /// ISO date, e.g. `2024-01-01`
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_priority")]
    pub priority: i64,
    pub user_id: String,
}

fn default_priority() -> i64 {
    1
}

impl Task {
    pub fn from_document(document: Document) -> firetodo_adapter::Result<Self> {
        document.into_typed()
    }
}

/// Task as entered by the user; the owner is stamped on create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub due_date: String,
    pub completed: bool,
    pub priority: i64,
}

impl NewTask {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>, priority: i64) -> Self {
        Self {
            title: title.into(),
            due_date: due_date.into(),
            completed: false,
            priority,
        }
    }

    /// Stored fields for a task owned by `user_id`
    pub fn into_fields(self, user_id: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::String(self.title));
        fields.insert("dueDate".to_string(), Value::String(self.due_date));
        fields.insert("completed".to_string(), Value::Bool(self.completed));
        fields.insert("priority".to_string(), Value::from(self.priority));
        fields.insert(OWNER_FIELD.to_string(), Value::String(user_id.to_string()));
        fields
    }
}

/// Partial update; only present fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(title) = self.title {
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(due_date) = self.due_date {
            fields.insert("dueDate".to_string(), Value::String(due_date));
        }
        if let Some(completed) = self.completed {
            fields.insert("completed".to_string(), Value::Bool(completed));
        }
        if let Some(priority) = self.priority {
            fields.insert("priority".to_string(), Value::from(priority));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_task_fields_are_camel_case() {
        let fields = NewTask::new("Buy milk", "2024-01-01", 1).into_fields("uid-a");
        assert_eq!(
            Value::Object(fields),
            json!({
                "title": "Buy milk",
                "dueDate": "2024-01-01",
                "completed": false,
                "priority": 1,
                "userId": "uid-a",
            })
        );
    }

    #[test]
    fn test_patch_only_writes_present_fields() {
        let fields = TaskPatch::completed(true).into_fields();
        assert_eq!(Value::Object(fields), json!({"completed": true}));
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::completed(false).is_empty());
    }

    #[test]
    fn test_task_from_document_defaults() {
        let document = Document {
            id: "t1".to_string(),
            fields: json!({"title": "Walk", "userId": "uid-a"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let task = Task::from_document(document).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.due_date, "");
        assert!(!task.completed);
        assert_eq!(task.priority, 1);
    }

    #[test]
    fn test_task_without_owner_is_rejected() {
        let document = Document {
            id: "t2".to_string(),
            fields: json!({"title": "Orphan"}).as_object().cloned().unwrap(),
        };
        assert!(Task::from_document(document).is_err());
    }
}
