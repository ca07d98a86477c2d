use serde::{Deserialize, Serialize};

use crate::models::{NewTodoRequest, Todo, UpdateTodoRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoPayload<'a> {
    #[serde(flatten)]
    pub todo: &'a NewTodoRequest,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoPayload<'a> {
    #[serde(flatten)]
    pub changes: &'a UpdateTodoRequest,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTodo {
    #[serde(flatten)]
    pub todo: Todo,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_on: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payload_carries_timestamps() {
        let req = NewTodoRequest {
            todo: "Walk dog".to_string(),
            completed: false,
            user_id: 4,
        };
        let payload = CreateTodoPayload {
            todo: &req,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["todo"], "Walk dog");
        assert_eq!(value["userId"], 4);
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00Z");
        assert_eq!(value["updatedAt"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn test_update_payload_omits_missing_fields() {
        let changes = UpdateTodoRequest {
            todo: None,
            completed: Some(true),
        };
        let payload = UpdateTodoPayload {
            changes: &changes,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("todo").is_none());
        assert_eq!(value["completed"], true);
    }

    #[test]
    fn test_deleted_todo_decodes_flag() {
        let body = r#"{"id":1,"todo":"A","completed":false,"userId":1,
            "isDeleted":true,"deletedOn":"2026-01-01T00:00:00Z"}"#;
        let deleted: DeletedTodo = serde_json::from_str(body).unwrap();
        assert!(deleted.is_deleted);
        assert_eq!(deleted.todo.id, 1);
    }
}
