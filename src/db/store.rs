//! Storage port for the bracket and scoring engines.
//!
//! Components take the [`Store`] trait rather than a concrete database
//! handle, so the state machines can be tested against the in-memory
//! implementation. Every update method touches only the fields it names;
//! whole-record replacement is deliberately absent so that two sibling
//! matches completing at the same time cannot overwrite each other's
//! slot write on the shared downstream match.

use async_trait::async_trait;

use crate::bracket::models::{Match, MatchStatus, PlayerSlot};
use crate::errors::Result;
use crate::scoring::models::{Dart, Leg, Turn};
use crate::tournament::{Registration, Tournament, TournamentStatus};
use crate::{DartId, LegId, MatchId, RegistrationId, TournamentId, TurnId, UserId};

/// Durable-store port.
#[async_trait]
pub trait Store: Send + Sync {
    // Tournaments

    async fn insert_tournament(&self, tournament: &Tournament) -> Result<()>;

    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>>;

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<()>;

    // Registrations

    async fn insert_registration(&self, registration: &Registration) -> Result<()>;

    /// All registrations of a tournament, ordered by registration time.
    async fn registrations_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Registration>>;

    // Matches

    /// Insert a batch of matches so that readers see either none or all
    /// of them; the bracket builder relies on this for the feed wiring.
    async fn insert_matches(&self, matches: &[Match]) -> Result<()>;

    async fn get_match(&self, id: MatchId) -> Result<Option<Match>>;

    /// All matches of a tournament, ordered round descending then
    /// position ascending (first round of play first).
    async fn matches_for_tournament(&self, tournament_id: TournamentId) -> Result<Vec<Match>>;

    /// Fill one player slot. Field-level partial update.
    async fn set_match_player(
        &self,
        id: MatchId,
        slot: PlayerSlot,
        player: RegistrationId,
    ) -> Result<()>;

    /// Set the scorer (status becomes Assigned) or clear it (back to
    /// Pending).
    async fn assign_scorer(&self, id: MatchId, scorer: Option<UserId>) -> Result<()>;

    /// Update the lifecycle status, stamping started/completed times as
    /// appropriate.
    async fn set_match_status(&self, id: MatchId, status: MatchStatus) -> Result<()>;

    async fn set_legs_won(&self, id: MatchId, player1_legs: u32, player2_legs: u32) -> Result<()>;

    /// Record the winner, final tallies and completion time in one write.
    async fn complete_match(
        &self,
        id: MatchId,
        winner: RegistrationId,
        player1_legs: u32,
        player2_legs: u32,
    ) -> Result<()>;

    // Legs

    async fn insert_leg(&self, leg: &Leg) -> Result<()>;

    async fn get_leg(&self, id: LegId) -> Result<Option<Leg>>;

    /// All legs of a match, ordered by leg number.
    async fn legs_for_match(&self, match_id: MatchId) -> Result<Vec<Leg>>;

    /// The match's leg without a winner, if any.
    async fn active_leg_for_match(&self, match_id: MatchId) -> Result<Option<Leg>>;

    async fn complete_leg(
        &self,
        id: LegId,
        winner: RegistrationId,
        player1_final: u32,
        player2_final: u32,
        total_darts: u32,
        checkout_dart: u8,
    ) -> Result<()>;

    // Turns

    async fn insert_turn(&self, turn: &Turn) -> Result<()>;

    async fn get_turn(&self, id: TurnId) -> Result<Option<Turn>>;

    /// All turns of a leg, ordered by turn number.
    async fn turns_for_leg(&self, leg_id: LegId) -> Result<Vec<Turn>>;

    async fn close_turn(
        &self,
        id: TurnId,
        turn_total: u32,
        score_after: u32,
        is_checkout_attempt: bool,
        is_successful_checkout: bool,
    ) -> Result<()>;

    // Darts

    async fn insert_dart(&self, dart: &Dart) -> Result<()>;

    /// All darts of a turn, ordered by dart number.
    async fn darts_for_turn(&self, turn_id: TurnId) -> Result<Vec<Dart>>;

    async fn delete_dart(&self, id: DartId) -> Result<()>;
}
