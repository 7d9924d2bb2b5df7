//! Turn controller — the onboarding/chat state machine.
//!
//! One controller owns one session. Each inbound event (name submission,
//! chat message, document upload) is one controller call that mutates the
//! session and returns an updated read-only view for rendering. A session
//! is either waiting for the user's name or actively coaching; there is no
//! way back.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{CoachOptions, GreetingMode, KnowledgeSource};
use crate::error::{Error, SessionError};
use crate::knowledge::{self, DocumentSource, IngestionReport};
use crate::llm::{ChatTurn, ModelClient};
use crate::prompt;
use crate::session::{SessionState, Turn};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachPhase {
    AwaitingName,
    Coaching,
}

/// Read model of a session, returned after every controller call.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: CoachPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub transcript: Vec<Turn>,
}

/// Outcome of one controller call.
#[derive(Debug, Serialize)]
pub struct TurnOutcome {
    #[serde(flatten)]
    pub view: SessionView,
    /// The assistant reply produced by this call, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Non-fatal ingestion diagnostics from this call.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingestion_warnings: Vec<String>,
}

struct Inner {
    state: SessionState,
    /// Currently-held upload set. A new upload replaces it wholesale.
    uploads: Vec<DocumentSource>,
}

/// The onboarding/chat state machine for one session.
pub struct TurnController {
    options: CoachOptions,
    model: Arc<dyn ModelClient>,
    inner: Mutex<Inner>,
}

impl TurnController {
    pub fn new(options: CoachOptions, model: Arc<dyn ModelClient>) -> Self {
        Self {
            options,
            model,
            inner: Mutex::new(Inner {
                state: SessionState::new(),
                uploads: Vec::new(),
            }),
        }
    }

    /// Name-submission sink.
    ///
    /// A non-empty name transitions the session to coaching exactly once
    /// and synthesizes exactly one transcript entry. Empty input and
    /// repeat submissions are no-ops. The transition is atomic: if the
    /// eager greeting call fails, the session stays un-onboarded.
    pub async fn submit_name(&self, name: &str) -> Result<TurnOutcome, Error> {
        let mut inner = self.inner.lock().await;

        if inner.state.is_onboarded() {
            tracing::debug!("Name already set; ignoring repeat submission");
            return Ok(outcome(&inner.state, None, Vec::new()));
        }

        let name = name.trim();
        if name.is_empty() {
            return Ok(outcome(&inner.state, None, Vec::new()));
        }

        let reply = match self.options.greeting_mode {
            GreetingMode::Deferred => {
                inner.state.push(Turn::user(format!(
                    "Hello {name}. Start the coaching session for today."
                )));
                None
            }
            GreetingMode::Eager => {
                let instruction = prompt::greeting_instruction(&self.options, name);
                let seed = [ChatTurn::user("Start the coaching session for today.")];
                let greeting = self.model.generate(&instruction, &seed).await?;
                inner.state.push(Turn::assistant(greeting.clone()));
                Some(greeting)
            }
        };

        inner.state.user_name = Some(name.to_string());
        tracing::info!(user_name = name, "Session onboarded");
        Ok(outcome(&inner.state, reply, Vec::new()))
    }

    /// Message-submission sink.
    ///
    /// Runs one full coaching cycle: append the user turn, recompute the
    /// knowledge blob from the current sources, render the system
    /// instruction, and call the model with the whole transcript. On
    /// provider failure no assistant turn is appended and the user turn is
    /// retained, so retry is just "send again".
    pub async fn submit_message(&self, text: &str) -> Result<TurnOutcome, Error> {
        // The lock is held across the model call: turns for one session
        // never interleave.
        let mut inner = self.inner.lock().await;

        let Some(user_name) = inner.state.user_name.clone() else {
            return Err(SessionError::NameRequired.into());
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage.into());
        }

        inner.state.push(Turn::user(text));

        // Knowledge is re-read every turn so the blob always reflects the
        // latest folder contents / upload set.
        let report = self.current_knowledge(&inner.uploads).await;
        let instruction = prompt::render_system_instruction(
            &self.options,
            &user_name,
            &report.blob,
            Utc::now(),
        );

        let turns = ChatTurn::from_transcript(&inner.state.transcript);
        match self.model.generate(&instruction, &turns).await {
            Ok(reply) => {
                inner.state.push(Turn::assistant(reply.clone()));
                Ok(outcome(&inner.state, Some(reply), report.warnings()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed; user turn retained");
                Err(e.into())
            }
        }
    }

    /// Upload sink: replace (not merge) the current document set.
    ///
    /// Only meaningful for upload-sourced sessions. The documents are
    /// ingested once right away so parse problems surface immediately;
    /// the blob itself is still recomputed on every turn.
    pub async fn replace_documents(
        &self,
        documents: Vec<DocumentSource>,
    ) -> Result<TurnOutcome, Error> {
        if self.options.knowledge_source != KnowledgeSource::Uploads {
            return Err(SessionError::UploadsDisabled.into());
        }

        let mut inner = self.inner.lock().await;
        let report = knowledge::load_knowledge(&documents).await;
        tracing::info!(
            documents = documents.len(),
            failures = report.failures.len(),
            "Upload set replaced"
        );
        inner.uploads = documents;
        Ok(outcome(&inner.state, None, report.warnings()))
    }

    /// Transcript read model.
    pub async fn view(&self) -> SessionView {
        let inner = self.inner.lock().await;
        session_view(&inner.state)
    }

    async fn current_knowledge(&self, uploads: &[DocumentSource]) -> IngestionReport {
        match &self.options.knowledge_source {
            KnowledgeSource::Uploads => knowledge::load_knowledge(uploads).await,
            KnowledgeSource::LocalFolder(dir) => {
                let sources = knowledge::scan_folder(dir).await;
                knowledge::load_knowledge(&sources).await
            }
        }
    }
}

fn session_view(state: &SessionState) -> SessionView {
    SessionView {
        phase: if state.is_onboarded() {
            CoachPhase::Coaching
        } else {
            CoachPhase::AwaitingName
        },
        user_name: state.user_name.clone(),
        transcript: state.transcript.clone(),
    }
}

fn outcome(state: &SessionState, reply: Option<String>, warnings: Vec<String>) -> TurnOutcome {
    TurnOutcome {
        view: session_view(state),
        reply,
        ingestion_warnings: warnings,
    }
}
