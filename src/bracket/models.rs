//! Bracket data models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MatchId, RegistrationId, TournamentId, UserId};

/// Match lifecycle state
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchStatus {
    /// Created, no scorer yet
    Pending,
    /// Scorer assigned, not started
    Assigned,
    /// Live scoring underway
    InProgress,
    /// Winner decided
    Completed,
}

/// The two player slots of a match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PlayerSlot {
    Player1,
    Player2,
}

/// A node in the bracket tree.
///
/// Rounds count down toward the final: round 1 is the final, the highest
/// round is round one of play. The feed wiring (`player1_source`,
/// `player2_source`, `feeds_into`) is fixed at build time and never
/// mutated afterwards; winner advancement resolves slots against it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1 = final, increasing toward earlier rounds
    pub round: u32,
    /// 1-indexed, left to right within the round
    pub position: u32,
    pub player1: Option<RegistrationId>,
    pub player2: Option<RegistrationId>,
    /// Upstream match whose winner fills the player1 slot
    pub player1_source: Option<MatchId>,
    /// Upstream match whose winner fills the player2 slot
    pub player2_source: Option<MatchId>,
    /// Downstream match this match's winner advances to; None for the final
    pub feeds_into: Option<MatchId>,
    pub winner: Option<RegistrationId>,
    pub player1_legs_won: u32,
    pub player2_legs_won: u32,
    pub best_of_legs: u32,
    pub starting_score: u32,
    pub status: MatchStatus,
    pub assigned_scorer: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(
        tournament_id: TournamentId,
        round: u32,
        position: u32,
        best_of_legs: u32,
        starting_score: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            position,
            player1: None,
            player2: None,
            player1_source: None,
            player2_source: None,
            feeds_into: None,
            winner: None,
            player1_legs_won: 0,
            player2_legs_won: 0,
            best_of_legs,
            starting_score,
            status: MatchStatus::Pending,
            assigned_scorer: None,
            created_at: Utc::now(),
            assigned_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Legs required to win under best-of-N
    pub fn legs_to_win(&self) -> u32 {
        self.best_of_legs.div_ceil(2)
    }

    pub fn is_final(&self) -> bool {
        self.round == 1
    }

    /// Which of this match's slots is fed by the given upstream match.
    ///
    /// Resolution keys off the immutable wiring only, so repeated
    /// advancement of the same upstream winner is idempotent.
    pub fn slot_fed_by(&self, upstream: MatchId) -> Option<PlayerSlot> {
        if self.player1_source == Some(upstream) {
            Some(PlayerSlot::Player1)
        } else if self.player2_source == Some(upstream) {
            Some(PlayerSlot::Player2)
        } else {
            None
        }
    }

    pub fn player_in(&self, slot: PlayerSlot) -> Option<RegistrationId> {
        match slot {
            PlayerSlot::Player1 => self.player1,
            PlayerSlot::Player2 => self.player2,
        }
    }

    /// Both player slots resolved to concrete registrations
    pub fn has_both_players(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }
}

/// A complete bracket: every match of a tournament grouped by round.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BracketTree {
    rounds: BTreeMap<u32, Vec<Match>>,
    total_rounds: u32,
}

impl BracketTree {
    /// Group matches by round, each round ordered by position.
    pub fn from_matches(matches: Vec<Match>) -> Self {
        let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        for m in matches {
            rounds.entry(m.round).or_default().push(m);
        }
        for round in rounds.values_mut() {
            round.sort_by_key(|m| m.position);
        }
        let total_rounds = rounds.keys().next_back().copied().unwrap_or(0);
        Self {
            rounds,
            total_rounds,
        }
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Matches of one round, ordered by position.
    pub fn round(&self, round: u32) -> &[Match] {
        self.rounds.get(&round).map_or(&[], Vec::as_slice)
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.round(1).first()
    }

    pub fn match_count(&self) -> usize {
        self.rounds.values().map(Vec::len).sum()
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.values().flatten()
    }

    /// Display name for a round, e.g. "Final" or "Quarter-Finals".
    pub fn round_name(&self, round: u32) -> String {
        match round {
            1 => "Final".to_string(),
            2 => "Semi-Finals".to_string(),
            3 => "Quarter-Finals".to_string(),
            4 => "Round of 16".to_string(),
            5 => "Round of 32".to_string(),
            6 => "Round of 64".to_string(),
            _ => format!("Round {}", self.total_rounds - round + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_at(tournament_id: TournamentId, round: u32, position: u32) -> Match {
        Match::new(tournament_id, round, position, 5, 501)
    }

    #[test]
    fn test_legs_to_win_rounds_up() {
        let tournament_id = Uuid::new_v4();
        let mut m = match_at(tournament_id, 1, 1);
        m.best_of_legs = 5;
        assert_eq!(m.legs_to_win(), 3);
        m.best_of_legs = 1;
        assert_eq!(m.legs_to_win(), 1);
        m.best_of_legs = 7;
        assert_eq!(m.legs_to_win(), 4);
    }

    #[test]
    fn test_slot_fed_by_uses_wiring_only() {
        let tournament_id = Uuid::new_v4();
        let upstream1 = match_at(tournament_id, 2, 1);
        let upstream2 = match_at(tournament_id, 2, 2);
        let mut downstream = match_at(tournament_id, 1, 1);
        downstream.player1_source = Some(upstream1.id);
        downstream.player2_source = Some(upstream2.id);

        assert_eq!(
            downstream.slot_fed_by(upstream1.id),
            Some(PlayerSlot::Player1)
        );
        assert_eq!(
            downstream.slot_fed_by(upstream2.id),
            Some(PlayerSlot::Player2)
        );
        assert_eq!(downstream.slot_fed_by(Uuid::new_v4()), None);
    }

    #[test]
    fn test_bracket_tree_grouping() {
        let tournament_id = Uuid::new_v4();
        let matches = vec![
            match_at(tournament_id, 1, 1),
            match_at(tournament_id, 2, 2),
            match_at(tournament_id, 2, 1),
        ];
        let tree = BracketTree::from_matches(matches);
        assert_eq!(tree.total_rounds(), 2);
        assert_eq!(tree.match_count(), 3);
        assert_eq!(tree.round(2)[0].position, 1);
        assert_eq!(tree.round(2)[1].position, 2);
        assert!(tree.final_match().is_some());
    }

    #[test]
    fn test_round_names() {
        let tournament_id = Uuid::new_v4();
        let mut matches = Vec::new();
        for round in 1..=3 {
            matches.push(match_at(tournament_id, round, 1));
        }
        let tree = BracketTree::from_matches(matches);
        assert_eq!(tree.round_name(1), "Final");
        assert_eq!(tree.round_name(2), "Semi-Finals");
        assert_eq!(tree.round_name(3), "Quarter-Finals");
    }
}
