//! Live scoring: dart rules and the turn/leg/match state machines.

pub mod manager;
pub mod models;
pub mod rules;

pub use manager::{DartOutcome, ScoringManager};
pub use models::{Dart, Leg, Multiplier, Turn, TurnStatus};
