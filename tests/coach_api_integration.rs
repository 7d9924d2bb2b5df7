//! Integration tests for the coach REST API.
//!
//! Each test spins up an Axum server on a random port with a scripted
//! model client (no real API calls) and drives the session lifecycle over
//! HTTP with reqwest.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;

use lynn_coach::coach::{CoachRouteState, coach_routes};
use lynn_coach::config::CoachOptions;
use lynn_coach::error::ProviderError;
use lynn_coach::llm::{ChatTurn, ModelClient};

/// Scripted model client: pops one canned result per generate call and
/// records the instructions it saw.
#[derive(Default)]
struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    seen_instructions: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_reply(&self, reply: &str) {
        self.script.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    fn push_failure(&self) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::RequestFailed {
                reason: "scripted failure".to_string(),
            }));
    }

    fn last_instruction(&self) -> Option<String> {
        self.seen_instructions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(
        &self,
        system_instruction: &str,
        _turns: &[ChatTurn],
    ) -> Result<String, ProviderError> {
        self.seen_instructions
            .lock()
            .unwrap()
            .push(system_instruction.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Start a server on a random port and return its base URL.
async fn spawn_server(model: Arc<ScriptedModel>, options: CoachOptions) -> String {
    let state = CoachRouteState::new(model, options);
    let app = coach_routes(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let body: Value = client
        .post(format!("{base}/api/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_session_lifecycle() {
    let model = ScriptedModel::new();
    model.push_reply("Good morning. Let's start with your affirmations.");
    let base = spawn_server(Arc::clone(&model), CoachOptions::default()).await;
    let client = reqwest::Client::new();

    let id = create_session(&client, &base).await;

    // Name submission transitions to coaching and seeds one turn.
    let body: Value = client
        .post(format!("{base}/api/sessions/{id}/name"))
        .json(&serde_json::json!({"name": "Dana"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["phase"], "coaching");
    assert_eq!(body["transcript"].as_array().unwrap().len(), 1);

    // One chat turn: user + assistant appended.
    let body: Value = client
        .post(format!("{base}/api/sessions/{id}/message"))
        .json(&serde_json::json!({"message": "I'm ready."}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["reply"],
        "Good morning. Let's start with your affirmations."
    );
    assert_eq!(body["transcript"].as_array().unwrap().len(), 3);
    assert!(model.last_instruction().unwrap().contains("Dana"));

    // Read model agrees.
    let body: Value = client
        .get(format!("{base}/api/sessions/{id}/transcript"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["transcript"].as_array().unwrap().len(), 3);

    // Discarding the session destroys its state.
    let status = client
        .delete(format!("{base}/api/sessions/{id}"))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::NO_CONTENT);
    let status = client
        .get(format!("{base}/api/sessions/{id}/transcript"))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_before_name_is_a_conflict() {
    let model = ScriptedModel::new();
    let base = spawn_server(model, CoachOptions::default()).await;
    let client = reqwest::Client::new();

    let id = create_session(&client, &base).await;
    let response = client
        .post(format!("{base}/api/sessions/{id}/message"))
        .json(&serde_json::json!({"message": "hello?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn provider_failure_is_surfaced_and_user_turn_retained() {
    let model = ScriptedModel::new();
    model.push_failure();
    let base = spawn_server(Arc::clone(&model), CoachOptions::default()).await;
    let client = reqwest::Client::new();

    let id = create_session(&client, &base).await;
    client
        .post(format!("{base}/api/sessions/{id}/name"))
        .json(&serde_json::json!({"name": "Dana"}))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{base}/api/sessions/{id}/message"))
        .json(&serde_json::json!({"message": "anyone there?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    // The unanswered user turn is still in the transcript.
    let body: Value = client
        .get(format!("{base}/api/sessions/{id}/transcript"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let transcript = body["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1]["role"], "user");
    assert_eq!(transcript[1]["content"], "anyone there?");
}

#[tokio::test]
async fn uploaded_documents_feed_the_instruction() {
    let model = ScriptedModel::new();
    model.push_reply("Noted.");
    let base = spawn_server(Arc::clone(&model), CoachOptions::default()).await;
    let client = reqwest::Client::new();

    let id = create_session(&client, &base).await;
    client
        .post(format!("{base}/api/sessions/{id}/name"))
        .json(&serde_json::json!({"name": "Dana"}))
        .send()
        .await
        .unwrap();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"Open with the market update.".to_vec())
            .file_name("script.txt"),
    );
    let response = client
        .put(format!("{base}/api/sessions/{id}/documents"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    client
        .post(format!("{base}/api/sessions/{id}/message"))
        .json(&serde_json::json!({"message": "go"}))
        .send()
        .await
        .unwrap();
    assert!(
        model
            .last_instruction()
            .unwrap()
            .contains("Open with the market update.")
    );
}

#[tokio::test]
async fn sessions_are_isolated() {
    let model = ScriptedModel::new();
    model.push_reply("for the first session");
    model.push_reply("for the second session");
    let base = spawn_server(model, CoachOptions::default()).await;
    let client = reqwest::Client::new();

    let first = create_session(&client, &base).await;
    let second = create_session(&client, &base).await;

    for (id, name, message) in [
        (&first, "Dana", "first session message"),
        (&second, "Riley", "second session message"),
    ] {
        client
            .post(format!("{base}/api/sessions/{id}/name"))
            .json(&serde_json::json!({"name": name}))
            .send()
            .await
            .unwrap();
        client
            .post(format!("{base}/api/sessions/{id}/message"))
            .json(&serde_json::json!({"message": message}))
            .send()
            .await
            .unwrap();
    }

    let body: Value = client
        .get(format!("{base}/api/sessions/{first}/transcript"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rendered = body.to_string();
    assert!(rendered.contains("Dana"));
    assert!(!rendered.contains("Riley"));
    assert!(!rendered.contains("second session message"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let model = ScriptedModel::new();
    let base = spawn_server(model, CoachOptions::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!(
            "{base}/api/sessions/00000000-0000-0000-0000-000000000000/name"
        ))
        .json(&serde_json::json!({"name": "Dana"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
