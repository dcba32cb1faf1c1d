//! Data models for tournaments and their entrants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EntrantId, RegistrationId, TournamentId};

/// Tournament lifecycle state
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TournamentStatus {
    /// Roster still being assembled, bracket not built
    Setup,
    /// Bracket built, matches being played
    InProgress,
    /// Final decided
    Completed,
}

/// A single-elimination tournament.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    /// Legs per match (best-of), e.g. 5 means first to 3
    pub default_best_of_legs: u32,
    /// Starting score for every leg, usually 501
    pub default_starting_score: u32,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    pub fn new(name: String, default_best_of_legs: u32, default_starting_score: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            status: TournamentStatus::Setup,
            default_best_of_legs,
            default_starting_score,
            created_at: Utc::now(),
        }
    }
}

/// A player on the roster. Immutable once created; tournaments reference
/// entrants through [`Registration`]s rather than owning them.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Entrant {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// An entrant's participation in one tournament.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub tournament_id: TournamentId,
    pub entrant_id: EntrantId,
    /// Seed rank, unique within a tournament when present. Lower is
    /// stronger.
    pub seed: Option<u32>,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(tournament_id: TournamentId, entrant_id: EntrantId, seed: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            entrant_id,
            seed,
            registered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tournament_starts_in_setup() {
        let tournament = Tournament::new("Friday Knockout".to_string(), 5, 501);
        assert_eq!(tournament.status, TournamentStatus::Setup);
        assert_eq!(tournament.default_best_of_legs, 5);
        assert_eq!(tournament.default_starting_score, 501);
    }

    #[test]
    fn test_registration_references_entrant() {
        let tournament = Tournament::new("Test".to_string(), 3, 501);
        let entrant = Entrant::new("Anna".to_string());
        let registration = Registration::new(tournament.id, entrant.id, Some(1));
        assert_eq!(registration.tournament_id, tournament.id);
        assert_eq!(registration.entrant_id, entrant.id);
        assert_eq!(registration.seed, Some(1));
    }
}
