//! Data models for live scoring: legs, turns and darts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Error;
use crate::{DartId, LegId, MatchId, RegistrationId, TurnId};

/// Dart multiplier ring.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Multiplier {
    Single,
    Double,
    Treble,
}

impl Multiplier {
    /// Numeric factor: 1, 2 or 3.
    pub fn value(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Treble => 3,
        }
    }
}

impl TryFrom<u8> for Multiplier {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Single),
            2 => Ok(Self::Double),
            3 => Ok(Self::Treble),
            _ => Err(Error::InvalidDart {
                multiplier: value,
                target: 0,
            }),
        }
    }
}

/// One game within a match, played down from the starting score.
///
/// Active while `winner` is unset; immutable once completed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Leg {
    pub id: LegId,
    pub match_id: MatchId,
    /// 1-based, increasing
    pub leg_number: u32,
    pub player1: RegistrationId,
    pub player2: RegistrationId,
    pub player1_starting_score: u32,
    pub player2_starting_score: u32,
    pub player1_final_score: Option<u32>,
    pub player2_final_score: Option<u32>,
    pub winner: Option<RegistrationId>,
    pub total_darts_thrown: u32,
    /// Which dart of the final turn (1-3) hit the checkout
    pub checkout_dart: Option<u8>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Leg {
    pub fn new(
        match_id: MatchId,
        leg_number: u32,
        player1: RegistrationId,
        player2: RegistrationId,
        starting_score: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            leg_number,
            player1,
            player2,
            player1_starting_score: starting_score,
            player2_starting_score: starting_score,
            player1_final_score: None,
            player2_final_score: None,
            winner: None,
            total_darts_thrown: 0,
            checkout_dart: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.winner.is_none()
    }

    pub fn starting_score_for(&self, player: RegistrationId) -> Option<u32> {
        if player == self.player1 {
            Some(self.player1_starting_score)
        } else if player == self.player2 {
            Some(self.player2_starting_score)
        } else {
            None
        }
    }

    /// The other player of the leg, if `player` is one of the two.
    pub fn opponent_of(&self, player: RegistrationId) -> Option<RegistrationId> {
        if player == self.player1 {
            Some(self.player2)
        } else if player == self.player2 {
            Some(self.player1)
        } else {
            None
        }
    }
}

/// Turn lifecycle state
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TurnStatus {
    /// Accepting darts (fewer than three recorded, no bust or checkout)
    Open,
    /// Totals fixed; no further darts or undo
    Closed,
}

/// One player's visit to the board: up to three darts.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Turn {
    pub id: TurnId,
    pub leg_id: LegId,
    pub player: RegistrationId,
    pub turn_number: u32,
    pub score_before: u32,
    pub score_after: u32,
    pub turn_total: u32,
    pub status: TurnStatus,
    pub is_checkout_attempt: bool,
    pub is_successful_checkout: bool,
}

impl Turn {
    pub fn new(leg_id: LegId, player: RegistrationId, turn_number: u32, score_before: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            leg_id,
            player,
            turn_number,
            score_before,
            score_after: score_before,
            turn_total: 0,
            status: TurnStatus::Open,
            is_checkout_attempt: false,
            is_successful_checkout: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TurnStatus::Open
    }
}

/// A single throw within a turn.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Dart {
    pub id: DartId,
    pub turn_id: TurnId,
    /// Position within the turn, 1-3
    pub dart_number: u8,
    pub multiplier: Multiplier,
    /// 0 for a miss, 1-20, or 25 for bull
    pub target: u8,
    /// Scored value, already accounting for bull and miss rules
    pub value: u32,
    pub is_bust: bool,
}

impl Dart {
    pub fn new(
        turn_id: TurnId,
        dart_number: u8,
        multiplier: Multiplier,
        target: u8,
        value: u32,
        is_bust: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            turn_id,
            dart_number,
            multiplier,
            target,
            value,
            is_bust,
        }
    }
}
