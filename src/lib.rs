//! Lynn — productivity-coach session core.

pub mod coach;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod prompt;
pub mod session;
