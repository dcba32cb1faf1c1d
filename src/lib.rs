//! # Darts Tournament
//!
//! A knockout darts tournament engine with live, dart-by-dart scoring.
//!
//! Two subsystems carry the real rules:
//!
//! - the **bracket engine** ([`bracket`]): seeds entrants into a balanced
//!   single-elimination tree (4 to 64 players), wires every match to the
//!   match its winner feeds, and moves winners downstream as matches
//!   complete;
//! - the **scoring engine** ([`scoring`]): enforces the dart -> turn ->
//!   leg -> match progression, including bust and checkout detection,
//!   and triggers bracket advancement when a match is decided.
//!
//! Persistence sits behind the [`db::Store`] port (PostgreSQL via sqlx in
//! production, [`db::MemoryStore`] in tests), and committed state
//! transitions are reported through the [`events::ChangeNotifier`] port.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use darts_tournament::bracket::BracketBuilder;
//! use darts_tournament::db::{Database, DatabaseConfig, PgStore};
//! use darts_tournament::events::LogNotifier;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let store = Arc::new(PgStore::new(Arc::new(db.pool().clone())));
//!     let builder = BracketBuilder::new(store, Arc::new(LogNotifier));
//!     // let tree = builder.build(tournament_id).await?;
//!     Ok(())
//! }
//! ```

use uuid::Uuid;

/// Knockout bracket engine: seeding, construction, advancement.
pub mod bracket;
/// Storage port and implementations.
pub mod db;
/// Crate-wide error types.
pub mod errors;
/// Change notification port.
pub mod events;
/// Live scoring: rules and state machines.
pub mod scoring;
/// Tournament, entrant and registration models.
pub mod tournament;

pub use bracket::{AdvancementEngine, BracketBuilder, BracketTree, Match, MatchStatus, PlayerSlot};
pub use errors::{Error, Result};
pub use events::{ChangeNotifier, EntityChange};
pub use scoring::{Dart, DartOutcome, Leg, Multiplier, ScoringManager, Turn, TurnStatus};
pub use tournament::{Entrant, Registration, Tournament, TournamentStatus};

pub type TournamentId = Uuid;
pub type EntrantId = Uuid;
pub type RegistrationId = Uuid;
pub type MatchId = Uuid;
pub type LegId = Uuid;
pub type TurnId = Uuid;
pub type DartId = Uuid;
/// Opaque id of an acting user supplied by the identity provider.
pub type UserId = Uuid;
