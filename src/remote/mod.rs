pub mod dto;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::models::{
    CreatedTodo, NewTodoRequest, Todo, TodosPage, UpdateTodoRequest, User, UsersPage,
};

/// One request per call against the remote todo service. No retries, no caching.
#[async_trait]
pub trait TodoGateway: Send + Sync {
    async fn list(&self, limit: usize, skip: usize) -> Result<TodosPage, RemoteError>;
    async fn list_by_owner(
        &self,
        user_id: i64,
        limit: usize,
        skip: usize,
    ) -> Result<TodosPage, RemoteError>;
    async fn get(&self, id: i64) -> Result<Todo, RemoteError>;
    async fn create(&self, todo: &NewTodoRequest) -> Result<CreatedTodo, RemoteError>;
    async fn update(&self, id: i64, changes: &UpdateTodoRequest) -> Result<Todo, RemoteError>;
    async fn delete(&self, id: i64) -> Result<Todo, RemoteError>;
    async fn list_users(&self, limit: usize, skip: usize) -> Result<UsersPage, RemoteError>;
    async fn get_user(&self, id: i64) -> Result<User, RemoteError>;
}

pub struct HttpTodoGateway {
    client: Client,
    config: RemoteConfig,
}

impl HttpTodoGateway {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        // Transport defaults only; no timeout override.
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = self.authorized(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            tracing::debug!("Failed to parse remote body: {}", e);
            RemoteError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl TodoGateway for HttpTodoGateway {
    async fn list(&self, limit: usize, skip: usize) -> Result<TodosPage, RemoteError> {
        let url = self.url(&format!("/todos?limit={}&skip={}", limit, skip));
        self.send(self.client.get(url)).await
    }

    async fn list_by_owner(
        &self,
        user_id: i64,
        limit: usize,
        skip: usize,
    ) -> Result<TodosPage, RemoteError> {
        let url = self.url(&format!("/todos/user/{}?limit={}&skip={}", user_id, limit, skip));
        self.send(self.client.get(url)).await
    }

    async fn get(&self, id: i64) -> Result<Todo, RemoteError> {
        let url = self.url(&format!("/todos/{}", id));
        self.send(self.client.get(url)).await
    }

    async fn create(&self, todo: &NewTodoRequest) -> Result<CreatedTodo, RemoteError> {
        let now = Utc::now().to_rfc3339();
        let payload = dto::CreateTodoPayload {
            todo,
            created_at: now.clone(),
            updated_at: now,
        };
        self.send(self.client.post(self.url("/todos/add")).json(&payload)).await
    }

    async fn update(&self, id: i64, changes: &UpdateTodoRequest) -> Result<Todo, RemoteError> {
        let payload = dto::UpdateTodoPayload {
            changes,
            updated_at: Utc::now().to_rfc3339(),
        };
        let url = self.url(&format!("/todos/{}", id));
        self.send(self.client.put(url).json(&payload)).await
    }

    async fn delete(&self, id: i64) -> Result<Todo, RemoteError> {
        let url = self.url(&format!("/todos/{}", id));
        let deleted: dto::DeletedTodo = self.send(self.client.delete(url)).await?;
        tracing::debug!(
            "Remote delete of {} acknowledged (is_deleted={}, deleted_on={:?})",
            id,
            deleted.is_deleted,
            deleted.deleted_on
        );
        Ok(deleted.todo)
    }

    async fn list_users(&self, limit: usize, skip: usize) -> Result<UsersPage, RemoteError> {
        let url = self.url(&format!("/users?limit={}&skip={}", limit, skip));
        self.send(self.client.get(url)).await
    }

    async fn get_user(&self, id: i64) -> Result<User, RemoteError> {
        let url = self.url(&format!("/users/{}", id));
        self.send(self.client.get(url)).await
    }
}

/// Gateway for running without a remote service. Every call fails, so every
/// read degrades to the overlay and every write lands locally.
pub struct OfflineGateway;

#[async_trait]
impl TodoGateway for OfflineGateway {
    async fn list(&self, _limit: usize, _skip: usize) -> Result<TodosPage, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn list_by_owner(
        &self,
        _user_id: i64,
        _limit: usize,
        _skip: usize,
    ) -> Result<TodosPage, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn get(&self, _id: i64) -> Result<Todo, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn create(&self, _todo: &NewTodoRequest) -> Result<CreatedTodo, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn update(&self, _id: i64, _changes: &UpdateTodoRequest) -> Result<Todo, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn delete(&self, _id: i64) -> Result<Todo, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn list_users(&self, _limit: usize, _skip: usize) -> Result<UsersPage, RemoteError> {
        Err(RemoteError::Unavailable)
    }

    async fn get_user(&self, _id: i64) -> Result<User, RemoteError> {
        Err(RemoteError::Unavailable)
    }
}
