use serde::{Deserialize, Serialize};

/// Owner of a placeholder record. Valid user ids start at 1.
pub const UNKNOWN_OWNER: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub todo: String,
    pub completed: bool,
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Set when the record was changed while nothing was known about it. The
    /// other fields are placeholders until a known copy is found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_changes: Option<UpdateTodoRequest>,
}

impl Todo {
    /// Apply a partial update. Whole fields only; the owner never changes.
    pub fn apply(&mut self, req: &UpdateTodoRequest) {
        if let Some(todo) = &req.todo {
            self.todo = todo.clone();
        }
        if let Some(completed) = req.completed {
            self.completed = completed;
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.pending_changes.is_some()
    }

    /// Replay the pending changes of a provisional record over a known copy.
    pub fn settled_on(&self, mut base: Todo) -> Todo {
        if let Some(changes) = &self.pending_changes {
            base.apply(changes);
        }
        base.id = self.id;
        base.updated_at = self.updated_at.clone().or(base.updated_at);
        base.pending_changes = None;
        base
    }

    pub fn matches(&self, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Owner(user_id) => self.user_id == user_id,
        }
    }
}

/// Body of the remote list endpoints, also the shape of a merged list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodosPage {
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: usize,
}

/// What the remote create endpoint hands back. The id may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTodo {
    #[serde(default)]
    pub id: Option<i64>,
    pub todo: String,
    pub completed: bool,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodoRequest {
    pub todo: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodoRequest {
    /// Fold a later partial into this one; the later value wins per field.
    pub fn combine(&mut self, later: &UpdateTodoRequest) {
        if let Some(todo) = &later.todo {
            self.todo = Some(todo.clone());
        }
        if let Some(completed) = later.completed {
            self.completed = Some(completed);
        }
    }
}

/// Query dimension of a list read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(i64),
}
