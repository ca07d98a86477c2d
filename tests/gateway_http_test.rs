use serde_json::json;
use tododash::config::RemoteConfig;
use tododash::error::RemoteError;
use tododash::models::{NewTodoRequest, UpdateTodoRequest};
use tododash::remote::{HttpTodoGateway, TodoGateway};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn gateway_for(server: &MockServer) -> HttpTodoGateway {
    HttpTodoGateway::new(RemoteConfig {
        base_url: server.uri(),
        api_token: TOKEN.to_string(),
    })
    .expect("Failed to build gateway")
}

#[tokio::test]
async fn test_list_sends_paging_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(query_param("limit", "30"))
        .and(query_param("skip", "0"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todos": [{"id": 1, "todo": "A", "completed": false, "userId": 1}],
            "total": 254,
            "skip": 0,
            "limit": 30
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = gateway_for(&server).list(30, 0).await.unwrap();
    assert_eq!(page.todos.len(), 1);
    assert_eq!(page.total, 254);
    assert_eq!(page.todos[0].user_id, 1);
}

#[tokio::test]
async fn test_list_by_owner_hits_user_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/user/5"))
        .and(query_param("limit", "10"))
        .and(query_param("skip", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todos": [],
            "total": 0,
            "skip": 20,
            "limit": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = gateway_for(&server).list_by_owner(5, 10, 20).await.unwrap();
    assert!(page.todos.is_empty());
}

#[tokio::test]
async fn test_create_stamps_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/todos/add"))
        .and(body_partial_json(json!({"todo": "Walk dog", "completed": false, "userId": 3})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 255, "todo": "Walk dog", "completed": false, "userId": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = gateway_for(&server)
        .create(&NewTodoRequest {
            todo: "Walk dog".to_string(),
            completed: false,
            user_id: 3,
        })
        .await
        .unwrap();
    assert_eq!(created.id, Some(255));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["createdAt"].is_string());
    assert!(body["updatedAt"].is_string());
}

#[tokio::test]
async fn test_update_sends_partial_with_updated_at() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/todos/1"))
        .and(body_partial_json(json!({"completed": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "todo": "A", "completed": true, "userId": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = gateway_for(&server)
        .update(
            1,
            &UpdateTodoRequest {
                todo: None,
                completed: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(updated.completed);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["updatedAt"].is_string());
    assert!(body.get("todo").is_none());
    assert!(body.get("createdAt").is_none());
}

#[tokio::test]
async fn test_delete_decodes_deleted_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "todo": "A", "completed": false, "userId": 1,
            "isDeleted": true, "deletedOn": "2026-10-17T00:00:00.000Z"
        })))
        .mount(&server)
        .await;

    let deleted = gateway_for(&server).delete(1).await.unwrap();
    assert_eq!(deleted.id, 1);
}

#[tokio::test]
async fn test_missing_todo_is_status_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/9999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Todo with id '9999' not found"
        })))
        .mount(&server)
        .await;

    let err = gateway_for(&server).get(9999).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        RemoteError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).get(1).await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let gateway = HttpTodoGateway::new(RemoteConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_token: TOKEN.to_string(),
    })
    .unwrap();

    let err = gateway.list(10, 0).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}

#[tokio::test]
async fn test_users_are_proxied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "firstName": "Emily", "lastName": "Johnson",
            "email": "emily.johnson@x.dummyjson.com", "username": "emilys", "age": 28
        })))
        .mount(&server)
        .await;

    let user = gateway_for(&server).get_user(1).await.unwrap();
    assert_eq!(user.username, "emilys");
}
