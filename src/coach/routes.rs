//! REST endpoints for the coaching sessions.
//!
//! The UI boundary from the core's point of view: a name-submission sink,
//! a message-submission sink, an upload sink, and a transcript read model.
//! Each session is an isolated [`TurnController`] keyed by id; nothing is
//! shared between sessions.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post, put};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::controller::TurnController;
use crate::config::CoachOptions;
use crate::error::{Error, SessionError};
use crate::knowledge::DocumentSource;
use crate::llm::ModelClient;

/// Shared state for the coach routes.
#[derive(Clone)]
pub struct CoachRouteState {
    sessions: Arc<tokio::sync::RwLock<HashMap<Uuid, Arc<TurnController>>>>,
    model: Arc<dyn ModelClient>,
    options: CoachOptions,
}

impl CoachRouteState {
    pub fn new(model: Arc<dyn ModelClient>, options: CoachOptions) -> Self {
        Self {
            sessions: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            model,
            options,
        }
    }

    async fn session(&self, id: Uuid) -> Option<Arc<TurnController>> {
        self.sessions.read().await.get(&id).cloned()
    }
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// POST /api/sessions
///
/// Create a fresh, isolated session. It starts nameless with an empty
/// transcript.
async fn create_session(State(state): State<CoachRouteState>) -> impl IntoResponse {
    let id = Uuid::new_v4();
    let controller = Arc::new(TurnController::new(
        state.options.clone(),
        Arc::clone(&state.model),
    ));
    state.sessions.write().await.insert(id, controller);
    tracing::info!(session_id = %id, "Session created");
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": id,
            "persona": state.options.persona,
            "phase": "awaiting_name",
        })),
    )
}

/// POST /api/sessions/{id}/name — name-submission sink.
async fn submit_name(
    State(state): State<CoachRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NameBody>,
) -> Response {
    let Some(controller) = state.session(id).await else {
        return session_not_found(id);
    };
    match controller.submit_name(&body.name).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/sessions/{id}/message — message-submission sink.
async fn submit_message(
    State(state): State<CoachRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> Response {
    let Some(controller) = state.session(id).await else {
        return session_not_found(id);
    };
    match controller.submit_message(&body.message).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /api/sessions/{id}/documents
///
/// Replace the session's knowledge document set with the uploaded files.
async fn replace_documents(
    State(state): State<CoachRouteState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let Some(controller) = state.session(id).await else {
        return session_not_found(id);
    };

    let mut documents = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .or_else(|| field.name().map(str::to_string))
                    .unwrap_or_else(|| "upload".to_string());
                match field.bytes().await {
                    Ok(bytes) => documents.push(DocumentSource::Bytes {
                        name,
                        data: bytes.to_vec(),
                    }),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({"error": e.to_string()})),
                        )
                            .into_response();
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": e.to_string()})),
                )
                    .into_response();
            }
        }
    }

    match controller.replace_documents(documents).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/sessions/{id}/transcript — transcript read model.
async fn get_transcript(
    State(state): State<CoachRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(controller) = state.session(id).await else {
        return session_not_found(id);
    };
    Json(controller.view().await).into_response()
}

/// DELETE /api/sessions/{id}
///
/// Discard the session and its state. Nothing survives this.
async fn delete_session(
    State(state): State<CoachRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            tracing::info!(session_id = %id, "Session discarded");
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(id),
    }
}

fn session_not_found(id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("No session with id {id}")})),
    )
        .into_response()
}

/// Map controller errors to the status/error sink.
fn error_response(error: Error) -> Response {
    let status = match &error {
        Error::Session(SessionError::EmptyMessage) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Session(_) => StatusCode::CONFLICT,
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        Error::Ingestion(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({"error": error.to_string()})),
    )
        .into_response()
}

/// Build the coach REST routes.
pub fn coach_routes(state: CoachRouteState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}/name", post(submit_name))
        .route("/api/sessions/{id}/message", post(submit_message))
        .route("/api/sessions/{id}/documents", put(replace_documents))
        .route("/api/sessions/{id}/transcript", get(get_transcript))
        .route("/api/sessions/{id}", delete(delete_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
