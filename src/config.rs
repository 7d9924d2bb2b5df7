//! Configuration types.
//!
//! Everything is read from the process environment once at startup. A
//! missing API key is fatal before any session is served.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Where the coach pulls its knowledge documents from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeSource {
    /// Documents are supplied by the UI; each new upload set replaces the
    /// previous one.
    Uploads,
    /// A local directory scanned (non-recursively) on every turn, so the
    /// blob always reflects the latest files. A missing directory is not
    /// an error.
    LocalFolder(PathBuf),
}

/// How the first coaching turn is produced after the user gives their name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingMode {
    /// Seed the transcript with a synthetic user-role "start the session"
    /// message; the greeting comes out of the normal turn loop.
    Deferred,
    /// Make one eager model call at name time and seed the transcript with
    /// the returned assistant greeting.
    Eager,
}

/// Per-deployment options for the turn controller. One controller serves
/// every persona/ingestion variant; these options select the behavior.
#[derive(Debug, Clone)]
pub struct CoachOptions {
    /// Display name of the coach persona.
    pub persona: String,
    pub knowledge_source: KnowledgeSource,
    pub greeting_mode: GreetingMode,
    /// Character budget for the knowledge blob before it is embedded in the
    /// system instruction. Oversized blobs are truncated so a large upload
    /// cannot push the request past the provider's size limit.
    pub max_knowledge_chars: usize,
}

impl Default for CoachOptions {
    fn default() -> Self {
        Self {
            persona: "Lynn".to_string(),
            knowledge_source: KnowledgeSource::Uploads,
            greeting_mode: GreetingMode::Deferred,
            max_knowledge_chars: 120_000,
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Gemini API key. Required.
    pub api_key: SecretString,
    /// Model identifier, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// Port for the REST boundary.
    pub port: u16,
    pub options: CoachOptions,
}

impl CoachConfig {
    /// Load configuration from the environment.
    ///
    /// `GOOGLE_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()))?;

        let model =
            std::env::var("LYNN_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let port = parse_env("LYNN_PORT", 8080u16)?;
        let max_knowledge_chars = parse_env("LYNN_MAX_KNOWLEDGE_CHARS", 120_000usize)?;

        let knowledge_source = match std::env::var("LYNN_KNOWLEDGE_DIR") {
            Ok(dir) if !dir.trim().is_empty() => KnowledgeSource::LocalFolder(PathBuf::from(dir)),
            _ => KnowledgeSource::Uploads,
        };

        let greeting_mode = match std::env::var("LYNN_GREETING_MODE") {
            Ok(mode) => parse_greeting_mode(&mode)?,
            Err(_) => GreetingMode::Deferred,
        };

        let persona = std::env::var("LYNN_PERSONA").unwrap_or_else(|_| "Lynn".to_string());

        Ok(Self {
            api_key: SecretString::from(api_key),
            model,
            port,
            options: CoachOptions {
                persona,
                knowledge_source,
                greeting_mode,
                max_knowledge_chars,
            },
        })
    }
}

fn parse_greeting_mode(value: &str) -> Result<GreetingMode, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "deferred" => Ok(GreetingMode::Deferred),
        "eager" => Ok(GreetingMode::Eager),
        other => Err(ConfigError::InvalidValue {
            key: "LYNN_GREETING_MODE".to_string(),
            message: format!("expected \"deferred\" or \"eager\", got \"{other}\""),
        }),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_mode_parsing() {
        assert_eq!(parse_greeting_mode("deferred").unwrap(), GreetingMode::Deferred);
        assert_eq!(parse_greeting_mode("Eager").unwrap(), GreetingMode::Eager);
        assert_eq!(parse_greeting_mode(" eager ").unwrap(), GreetingMode::Eager);
        assert!(parse_greeting_mode("both").is_err());
    }

    #[test]
    fn default_options() {
        let options = CoachOptions::default();
        assert_eq!(options.persona, "Lynn");
        assert_eq!(options.knowledge_source, KnowledgeSource::Uploads);
        assert_eq!(options.greeting_mode, GreetingMode::Deferred);
    }
}
