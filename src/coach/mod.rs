//! Coaching session core — the name-onboarding/chat state machine and its
//! REST boundary.

pub mod controller;
pub mod routes;

pub use controller::{CoachPhase, SessionView, TurnController, TurnOutcome};
pub use routes::{CoachRouteState, coach_routes};
