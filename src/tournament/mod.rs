//! Tournament, entrant and registration models.

pub mod models;

pub use models::{Entrant, Registration, Tournament, TournamentStatus};
