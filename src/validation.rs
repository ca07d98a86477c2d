use serde::Serialize;

use crate::models::{NewTodoRequest, UpdateTodoRequest};

const TODO_MIN_CHARS: usize = 3;
const TODO_MAX_CHARS: usize = 500;
const USER_ID_MIN: i64 = 1;
const USER_ID_MAX: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

fn check_text(text: &str, errors: &mut Vec<FieldError>) {
    let len = text.trim().chars().count();
    if len == 0 {
        errors.push(FieldError::new("todo", "Todo text is required"));
    } else if len < TODO_MIN_CHARS {
        errors.push(FieldError::new("todo", "Todo must be at least 3 characters"));
    } else if len > TODO_MAX_CHARS {
        errors.push(FieldError::new("todo", "Todo must be less than 500 characters"));
    }
}

pub fn validate_new_todo(req: &NewTodoRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    check_text(&req.todo, &mut errors);
    if req.user_id < USER_ID_MIN {
        errors.push(FieldError::new("userId", "User ID must be at least 1"));
    } else if req.user_id > USER_ID_MAX {
        errors.push(FieldError::new("userId", "User ID must be less than 10000"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_update(req: &UpdateTodoRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if let Some(text) = &req.todo {
        check_text(text, &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_todo(text: &str, user_id: i64) -> NewTodoRequest {
        NewTodoRequest {
            todo: text.to_string(),
            completed: false,
            user_id,
        }
    }

    #[test]
    fn test_accepts_valid_todo() {
        assert!(validate_new_todo(&new_todo("Buy milk", 1)).is_ok());
    }

    #[test]
    fn test_rejects_short_text_and_bad_owner() {
        let errors = validate_new_todo(&new_todo("ab", 0)).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "todo");
        assert_eq!(errors[1].field, "userId");
    }

    #[test]
    fn test_blank_text_is_required_error() {
        let errors = validate_new_todo(&new_todo("   ", 5)).unwrap_err();
        assert_eq!(errors[0].message, "Todo text is required");
    }

    #[test]
    fn test_rejects_overlong_text() {
        let errors = validate_new_todo(&new_todo(&"x".repeat(501), 5)).unwrap_err();
        assert_eq!(errors[0].field, "todo");
    }

    #[test]
    fn test_update_only_checks_present_fields() {
        assert!(validate_update(&UpdateTodoRequest::default()).is_ok());
        let req = UpdateTodoRequest {
            todo: Some("no".to_string()),
            completed: None,
        };
        assert!(validate_update(&req).is_err());
    }
}
