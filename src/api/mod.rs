use std::convert::Infallible;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::delete;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower::ServiceBuilder;
use tracing::debug;

use crate::error::AppError;
use crate::models::*;
use crate::query::{self, OwnerFilter, StatusFilter, TodoFilter, TodoStats};
use crate::state::AppState;
use crate::validation;

const DASHBOARD_LIMIT: usize = 30;
const USER_PAGE_LIMIT: usize = 10;

#[derive(Deserialize)]
struct DashboardParams {
    #[serde(default = "dashboard_limit")]
    limit: usize,
    #[serde(default)]
    skip: usize,
    #[serde(default)]
    search: String,
    #[serde(default)]
    status: StatusFilter,
    #[serde(default)]
    user_id: String,
    #[serde(default = "first_page")]
    page: usize,
    #[serde(default = "per_page")]
    per_page: usize,
}

#[derive(Deserialize)]
struct PageParams {
    #[serde(default = "user_page_limit")]
    limit: usize,
    #[serde(default)]
    skip: usize,
}

fn dashboard_limit() -> usize {
    DASHBOARD_LIMIT
}

fn user_page_limit() -> usize {
    USER_PAGE_LIMIT
}

fn first_page() -> usize {
    1
}

fn per_page() -> usize {
    query::DEFAULT_PER_PAGE
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub page: query::Page<Todo>,
    pub stats: TodoStats,
    pub merged_total: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo)
                .put(update_todo)
                .patch(update_todo)
                .delete(delete_todo),
        )
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/todos", get(list_user_todos))
        .route("/overlay", delete(clear_overlay))
        .route("/events", get(events))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_request)))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;
    debug!("{} {} -> {} ({:?})", method, path, response.status(), started.elapsed());
    response
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Json<DashboardResponse> {
    let merged = state.engine.merged_list(Scope::All, params.limit, params.skip).await;
    let merged_total = merged.total;

    let mut todos = merged.todos;
    query::sort_newest_first(&mut todos);
    let filter = TodoFilter {
        search: params.search,
        status: params.status,
        owner: OwnerFilter::parse(&params.user_id, state.owner_filter),
    };
    let filtered = filter.apply(todos);

    Json(DashboardResponse {
        stats: TodoStats::of(&filtered),
        page: query::paginate(&filtered, params.page, params.per_page),
        merged_total,
    })
}

async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, AppError> {
    let todo = state.engine.single_todo(id).await.ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

async fn create_todo(
    State(state): State<AppState>,
    Json(req): Json<NewTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    validation::validate_new_todo(&req).map_err(AppError::Validation)?;
    let todo = state.mutations.create(req).await;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<Json<Todo>, AppError> {
    validation::validate_update(&req).map_err(AppError::Validation)?;
    let todo = state.mutations.update(id, req).await;
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Todo> {
    Json(state.mutations.delete(id).await)
}

async fn list_user_todos(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Json<TodosPage> {
    let page = state
        .engine
        .merged_list(Scope::Owner(user_id), params.limit, params.skip)
        .await;
    Json(page)
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<UsersPage>, AppError> {
    let users = state.gateway.list_users(params.limit, params.skip).await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    match state.gateway.get_user(id).await {
        Ok(user) => Ok(Json(user)),
        Err(e) if e.is_not_found() => Err(AppError::NotFound),
        Err(e) => Err(AppError::Remote(e)),
    }
}

async fn clear_overlay(State(state): State<AppState>) -> StatusCode {
    state.mutations.clear().await;
    StatusCode::NO_CONTENT
}

/// `change` events carry no data beyond the name; `notice` events carry the notice.
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // A lagged receiver still means something changed.
    let changes = BroadcastStream::new(state.notifier.subscribe())
        .map(|_| Ok::<Event, Infallible>(Event::default().event("change").data("changed")));
    let notices = BroadcastStream::new(state.notices.subscribe())
        .filter_map(|msg| msg.ok())
        .filter_map(|notice| Event::default().event("notice").json_data(notice).ok())
        .map(Ok::<Event, Infallible>);

    Sse::new(changes.merge(notices)).keep_alive(KeepAlive::default())
}
