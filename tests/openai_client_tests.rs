//! Tests for the OpenAI-compatible completion client against a local fake provider.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Json;
use serde_json::{json, Value};

use gptchat::{
    CompletionClient, CompletionModel, CompletionParams, CompletionRequest, Credential,
    OpenAiCompletionClient, RequestError,
};

#[derive(Clone, Default)]
struct Recorded(Arc<Mutex<Vec<(String, Value)>>>);

impl Recorded {
    fn bodies(&self) -> Vec<(String, Value)> {
        self.0.lock().unwrap().clone()
    }
}

/// Replies "re: <last message>" with ids chatcmpl-1, chatcmpl-2, ...
async fn echo(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let last = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    let n = {
        let mut bodies = recorded.0.lock().unwrap();
        bodies.push((auth, body));
        bodies.len()
    };

    Json(json!({
        "id": format!("chatcmpl-{n}"),
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": format!("re: {last}") },
            "finish_reason": "stop"
        }]
    }))
}

async fn spawn_provider(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn echo_provider() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = axum::Router::new()
        .route("/v1/chat/completions", post(echo))
        .with_state(recorded.clone());
    (spawn_provider(app).await, recorded)
}

fn client(base_url: &str) -> OpenAiCompletionClient {
    OpenAiCompletionClient::new("gpt-3.5-turbo", base_url, Duration::from_secs(5)).unwrap()
}

fn credential() -> Credential {
    Credential::new("sk-test").unwrap()
}

#[tokio::test]
async fn test_parent_id_replays_the_chain() {
    let (base_url, recorded) = echo_provider().await;
    let client = client(&base_url);

    let first = client
        .complete(&credential(), &CompletionRequest::new("hello"))
        .await
        .unwrap();
    assert_eq!(first.text(), "re: hello");
    assert_eq!(first.id(), Some("chatcmpl-1"));

    let second = client
        .complete(
            &credential(),
            &CompletionRequest::new("and then?").with_parent_message_id("chatcmpl-1"),
        )
        .await
        .unwrap();
    assert_eq!(second.id(), Some("chatcmpl-2"));

    let bodies = recorded.bodies();
    assert_eq!(bodies[0].0, "Bearer sk-test");
    assert_eq!(bodies[0].1["model"], "gpt-3.5-turbo");

    let messages = bodies[1].1["messages"].as_array().unwrap();
    let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, ["system", "user", "assistant", "user"]);
    assert_eq!(messages[1]["content"], "hello");
    assert_eq!(messages[2]["content"], "re: hello");
    assert_eq!(messages[3]["content"], "and then?");
    assert_eq!(client.remembered().await, 4);
}

#[tokio::test]
async fn test_request_model_overrides_default() {
    let (base_url, recorded) = echo_provider().await;
    let client = client(&base_url);

    let request = CompletionRequest::new("hi")
        .with_completion_params(CompletionParams::with_model(CompletionModel::Gpt4));
    client.complete(&credential(), &request).await.unwrap();

    assert_eq!(recorded.bodies()[0].1["model"], "gpt-4");
}

#[tokio::test]
async fn test_error_status_keeps_provider_payload() {
    let app = axum::Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "Incorrect API key provided" } })),
            )
        }),
    );
    let base_url = spawn_provider(app).await;

    let err = client(&base_url)
        .complete(&credential(), &CompletionRequest::new("hello"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    let payload = err.payload().unwrap();
    assert_eq!(payload["error"]["message"], "Incorrect API key provided");
}

#[tokio::test]
async fn test_unparseable_body_is_malformed() {
    let app = axum::Router::new().route("/v1/chat/completions", post(|| async { "not json" }));
    let base_url = spawn_provider(app).await;

    let err = client(&base_url)
        .complete(&credential(), &CompletionRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_empty_choices_is_malformed() {
    let app = axum::Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({ "id": "x", "choices": [] })) }),
    );
    let base_url = spawn_provider(app).await;

    let err = client(&base_url)
        .complete(&credential(), &CompletionRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .complete(&credential(), &CompletionRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Network(_)));
    assert!(err.payload().is_none());
}

#[tokio::test]
async fn test_history_limit_bounds_remembered_messages() {
    let (base_url, recorded) = echo_provider().await;
    let client = client(&base_url).with_history_limit(4);

    let mut parent: Option<String> = None;
    for text in ["one", "two", "three"] {
        let mut request = CompletionRequest::new(text);
        if let Some(id) = parent.take() {
            request = request.with_parent_message_id(id);
        }
        let turn = client.complete(&credential(), &request).await.unwrap();
        parent = turn.id().map(str::to_string);
    }
    assert_eq!(client.remembered().await, 4);

    client
        .complete(
            &credential(),
            &CompletionRequest::new("four").with_parent_message_id(parent.unwrap()),
        )
        .await
        .unwrap();

    // system + two remembered exchanges + the new message
    let bodies = recorded.bodies();
    let messages = bodies[3].1["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[1]["content"], "two");
}
