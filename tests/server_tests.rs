// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use aide_gateway::chat::ChatOrchestrator;
use aide_gateway::config::ToolSettings;
use aide_gateway::llm::mock_provider::MockUpstream;
use aide_gateway::llm::ToolCallRequest;
use aide_gateway::server::{self, AppState};
use aide_gateway::storage::{DocumentStore, MemoryStore};
use aide_gateway::tools::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    base: String,
    client: reqwest::Client,
    store: Arc<MemoryStore>,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start(upstream: MockUpstream) -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = ToolRegistry::with_builtins(&ToolSettings::default());
        registry.load_from_store(store.as_ref()).await.unwrap();
        let registry = Arc::new(registry);

        let orchestrator = ChatOrchestrator::new(Arc::new(upstream), Arc::clone(&registry));
        let state = Arc::new(AppState::new(
            Arc::new(orchestrator),
            registry,
            store.clone() as Arc<dyn DocumentStore>,
        ));
        let router = server::create_router(state, &[]);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server::serve(listener, router, async move {
            let _ = rx.await;
        }));

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            store,
            _shutdown: tx,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn chat_body() -> Value {
    json!({
        "messages": [{"role": "user", "content": "What is 2 plus 2?"}],
        "configuration": {"model": "openai/gpt-4o"}
    })
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(MockUpstream::new()).await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_chat_streams_sse_until_done() {
    let upstream = MockUpstream::new()
        .with_tool_calls(vec![ToolCallRequest::new(
            "call_1",
            "calculate",
            r#"{"operation":"add","operand1":2,"operand2":2}"#,
        )])
        .with_stream_text(&["The answer ", "is 4."]);
    let server = TestServer::start(upstream.clone()).await;

    let response = server
        .client
        .post(server.url("/chat"))
        .json(&chat_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let body = response.text().await.unwrap();
    assert!(body.ends_with("data: [DONE]\n\n"), "body was: {}", body);

    let text: String = body
        .split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .filter(|data| *data != "[DONE]")
        .filter_map(|data| serde_json::from_str::<Value>(data).ok())
        .filter_map(|chunk| chunk["choices"][0]["delta"]["content"].as_str().map(String::from))
        .collect();
    assert_eq!(text, "The answer is 4.");
    assert_eq!(upstream.stream_call_count(), 1);
}

#[tokio::test]
async fn test_chat_rejects_empty_body() {
    let server = TestServer::start(MockUpstream::new()).await;

    let response = server
        .client
        .post(server.url("/chat"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request");

    let response = server
        .client
        .post(server.url("/chat"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_chat_upstream_auth_failure_is_json_error() {
    let upstream = MockUpstream::new().with_failure(401, "No auth credentials found");
    let server = TestServer::start(upstream.clone()).await;

    let response = server
        .client
        .post(server.url("/chat"))
        .json(&chat_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], 401);
    assert_eq!(upstream.stream_call_count(), 0);
}

#[tokio::test]
async fn test_tools_list_and_save() {
    let server = TestServer::start(MockUpstream::new()).await;

    let body: Value = server
        .client
        .get(server.url("/tools"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["function"]["name"], "get_current_weather");

    let mut updated = body["tools"].clone();
    updated[0]["enabled"] = json!(false);
    let response = server
        .client
        .post(server.url("/tools"))
        .json(&json!({"tools": updated}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"status": "success"})
    );

    let stored = server.store.load("tools", "declarations").await.unwrap().unwrap();
    assert_eq!(stored[0]["enabled"], false);
}

#[tokio::test]
async fn test_tools_save_rejects_invalid_sets() {
    let server = TestServer::start(MockUpstream::new()).await;

    let response = server
        .client
        .post(server.url("/tools"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let duplicate = json!({
        "name": "calculate",
        "description": "dup",
        "type": "function",
        "function": {"name": "calculate", "description": "dup", "parameters": {"type": "object", "properties": {}}}
    });
    let response = server
        .client
        .post(server.url("/tools"))
        .json(&json!({"tools": [duplicate.clone(), duplicate]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_process_tool_use() {
    let server = TestServer::start(MockUpstream::new()).await;

    let message: Value = server
        .client
        .post(server.url("/tools/process_tool_use"))
        .json(&json!({
            "tool_name": "calculate",
            "tool_args": {"operation": "divide", "operand1": 9, "operand2": 3},
            "tool_call_id": "call_direct"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(message["role"], "tool");
    assert_eq!(message["tool_call_id"], "call_direct");
    assert_eq!(message["content"], r#"{"result":3.0}"#);

    let response = server
        .client
        .post(server.url("/tools/process_tool_use"))
        .json(&json!({"tool_name": "frobnicate", "tool_args": "{}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let message: Value = response.json().await.unwrap();
    assert_eq!(message["content"], r#"{"error":"tool not found"}"#);
}

#[tokio::test]
async fn test_model_profiles_crud() {
    let server = TestServer::start(MockUpstream::new()).await;
    let profile = json!({
        "id": "fast",
        "name": "Fast",
        "base_model": "openai/gpt-4o-mini",
        "parameters": {"model": "openai/gpt-4o-mini", "temperature": 0.2}
    });

    let response = server
        .client
        .put(server.url("/models/fast"))
        .json(&profile)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let saved: Value = response.json().await.unwrap();
    assert!(saved["updated_at"].is_string());

    let fetched: Value = server
        .client
        .get(server.url("/models/fast"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["parameters"]["temperature"], 0.2);

    let listed: Value = server
        .client
        .get(server.url("/models"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["models"].as_array().unwrap().len(), 1);

    let mismatch = server
        .client
        .put(server.url("/models/slow"))
        .json(&profile)
        .send()
        .await
        .unwrap();
    assert_eq!(mismatch.status(), 400);

    let deleted = server
        .client
        .delete(server.url("/models/fast"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let missing = server
        .client
        .get(server.url("/models/fast"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_threads_crud() {
    let server = TestServer::start(MockUpstream::new()).await;
    let thread = json!({
        "title": "Arithmetic",
        "messages": [{"role": "user", "content": "What is 2 plus 2?"}]
    });

    let saved: Value = server
        .client
        .put(server.url("/threads/t1"))
        .json(&thread)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["id"], "t1");
    assert_eq!(saved["title"], "Arithmetic");

    let listed: Value = server
        .client
        .get(server.url("/threads"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["threads"][0]["id"], "t1");

    let not_object = server
        .client
        .put(server.url("/threads/t2"))
        .json(&json!([1, 2]))
        .send()
        .await
        .unwrap();
    assert_eq!(not_object.status(), 400);

    let bad_id = server
        .client
        .put(server.url("/threads/t3"))
        .json(&json!({"id": "other"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_id.status(), 400);

    let deleted = server
        .client
        .delete(server.url("/threads/t1"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let again = server
        .client
        .delete(server.url("/threads/t1"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_process_tool_use_refuses_disabled_tool() {
    let server = TestServer::start(MockUpstream::new()).await;
    let mut tools: Value = server
        .client
        .get(server.url("/tools"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    tools["tools"][1]["enabled"] = json!(false);
    assert_eq!(tools["tools"][1]["function"]["name"], "calculate");
    server
        .client
        .post(server.url("/tools"))
        .json(&tools)
        .send()
        .await
        .unwrap();

    let message: Value = server
        .client
        .post(server.url("/tools/process_tool_use"))
        .json(&json!({
            "tool_name": "calculate",
            "tool_args": {"operation": "add", "operand1": 1, "operand2": 1}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(message["content"], r#"{"error":"tool is disabled"}"#);
}
