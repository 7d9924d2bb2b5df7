//! Model client boundary.
//!
//! The controller only depends on the [`ModelClient`] trait: one system
//! instruction plus the ordered, role-tagged transcript in, generated text
//! out. The concrete implementation is the Gemini REST client.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProviderError;
use crate::session::{Role, Turn};

/// Author tag in the provider's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Model,
}

impl From<Role> for WireRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Model,
        }
    }
}

/// One transcript entry in the shape the provider expects.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: WireRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::User,
            content: content.into(),
        }
    }

    /// Convert a session transcript into the provider's role tagging.
    pub fn from_transcript(transcript: &[Turn]) -> Vec<Self> {
        transcript
            .iter()
            .map(|turn| Self {
                role: turn.role.into(),
                content: turn.content.clone(),
            })
            .collect()
    }
}

/// A hosted text-generation API.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply for the given instruction and conversation history.
    ///
    /// Fails with a [`ProviderError`] when the call errors, times out, or
    /// the API returns no usable content. Retry policy is the caller's
    /// concern; implementations make exactly one attempt.
    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[ChatTurn],
    ) -> Result<String, ProviderError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
