#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tododash::config::{DeletePolicy, UnparseableOwnerFilter};
use tododash::db::connect_in_memory;
use tododash::error::RemoteError;
use tododash::models::{
    CreatedTodo, NewTodoRequest, Todo, TodosPage, UpdateTodoRequest, User, UsersPage,
};
use tododash::remote::TodoGateway;
use tododash::state::AppState;

/// The demo service hands every new todo the same id.
pub const CREATED_ID: i64 = 255;

/// Behaves like the public demo service: answers reads from a fixed set and
/// acknowledges writes without storing them.
pub struct FakeGateway {
    todos: Mutex<Vec<Todo>>,
    offline: AtomicBool,
}

impl FakeGateway {
    pub fn new(todos: Vec<Todo>) -> Self {
        Self {
            todos: Mutex::new(todos),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn find(&self, id: i64) -> Result<Todo, RemoteError> {
        self.todos
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(RemoteError::Status {
                status: 404,
                body: format!("{{\"message\":\"Todo with id '{}' not found\"}}", id),
            })
    }

    fn page(todos: Vec<Todo>, limit: usize, skip: usize) -> TodosPage {
        let total = todos.len();
        TodosPage {
            todos: todos.into_iter().skip(skip).take(limit).collect(),
            total,
            skip,
            limit,
        }
    }
}

#[async_trait]
impl TodoGateway for FakeGateway {
    async fn list(&self, limit: usize, skip: usize) -> Result<TodosPage, RemoteError> {
        self.check()?;
        let todos = self.todos.lock().unwrap().clone();
        Ok(Self::page(todos, limit, skip))
    }

    async fn list_by_owner(
        &self,
        user_id: i64,
        limit: usize,
        skip: usize,
    ) -> Result<TodosPage, RemoteError> {
        self.check()?;
        let todos: Vec<Todo> = self
            .todos
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::page(todos, limit, skip))
    }

    async fn get(&self, id: i64) -> Result<Todo, RemoteError> {
        self.check()?;
        self.find(id)
    }

    async fn create(&self, todo: &NewTodoRequest) -> Result<CreatedTodo, RemoteError> {
        self.check()?;
        Ok(CreatedTodo {
            id: Some(CREATED_ID),
            todo: todo.todo.clone(),
            completed: todo.completed,
            user_id: todo.user_id,
        })
    }

    async fn update(&self, id: i64, changes: &UpdateTodoRequest) -> Result<Todo, RemoteError> {
        self.check()?;
        let mut todo = self.find(id)?;
        todo.apply(changes);
        Ok(todo)
    }

    async fn delete(&self, id: i64) -> Result<Todo, RemoteError> {
        self.check()?;
        self.find(id)
    }

    async fn list_users(&self, limit: usize, skip: usize) -> Result<UsersPage, RemoteError> {
        self.check()?;
        Ok(UsersPage {
            users: vec![user(1)],
            total: 1,
            skip,
            limit,
        })
    }

    async fn get_user(&self, id: i64) -> Result<User, RemoteError> {
        self.check()?;
        if id == 1 {
            Ok(user(1))
        } else {
            Err(RemoteError::Status {
                status: 404,
                body: String::new(),
            })
        }
    }
}

fn user(id: i64) -> User {
    User {
        id,
        first_name: "Emily".to_string(),
        last_name: "Johnson".to_string(),
        email: "emily.johnson@x.dummyjson.com".to_string(),
        username: "emilys".to_string(),
    }
}

pub fn todo(id: i64, text: &str, completed: bool, user_id: i64) -> Todo {
    Todo {
        id,
        todo: text.to_string(),
        completed,
        user_id,
        created_at: None,
        updated_at: None,
        pending_changes: None,
    }
}

pub fn new_todo(text: &str, user_id: i64) -> NewTodoRequest {
    NewTodoRequest {
        todo: text.to_string(),
        completed: false,
        user_id,
    }
}

pub async fn setup(remote: Vec<Todo>, policy: DeletePolicy) -> (Arc<FakeGateway>, AppState) {
    let pool = connect_in_memory().await.expect("Failed to create database");
    let gateway = Arc::new(FakeGateway::new(remote));
    let state = AppState::new(
        pool,
        gateway.clone(),
        policy,
        UnparseableOwnerFilter::MatchNothing,
    );
    (gateway, state)
}
