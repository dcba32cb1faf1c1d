//! Crate-wide error types.

use thiserror::Error;

use crate::bracket::models::MatchStatus;
use crate::{LegId, MatchId, TournamentId, TurnId};

/// Errors surfaced by the bracket and scoring engines.
///
/// Validation, not-found and state errors are all detected before any
/// mutation. [`Error::Propagation`] is the one exception: it is raised
/// after a match completion has already committed, and the advancement
/// call that produced it is safe to retry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid entrant count: {0} (must be 4, 8, 16, 32 or 64)")]
    InvalidEntrantCount(usize),

    #[error("duplicate seed rank: {0}")]
    DuplicateSeed(u32),

    #[error("invalid dart: multiplier {multiplier} on target {target}")]
    InvalidDart { multiplier: u8, target: u8 },

    #[error("dart out of sequence: expected dart {expected}, got {got}")]
    DartOutOfSequence { expected: u8, got: u8 },

    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("leg not found: {0}")]
    LegNotFound(LegId),

    #[error("turn not found: {0}")]
    TurnNotFound(TurnId),

    #[error("turn {0} is closed")]
    TurnClosed(TurnId),

    #[error("no dart to undo in turn {0}")]
    NoDartToUndo(TurnId),

    #[error("turn {0} is still open")]
    TurnStillOpen(TurnId),

    #[error("player is not part of leg {0}")]
    PlayerNotInLeg(LegId),

    #[error("leg {0} is already complete")]
    LegAlreadyComplete(LegId),

    #[error("match {0} is already complete")]
    MatchAlreadyComplete(MatchId),

    #[error("match {0} does not have both players yet")]
    MatchSlotsUnfilled(MatchId),

    #[error("match {0} still has an active leg")]
    LegStillActive(MatchId),

    #[error("match not in correct state: expected {expected:?}, got {actual:?}")]
    InvalidMatchState {
        expected: MatchStatus,
        actual: MatchStatus,
    },

    #[error("winner of match {match_id} could not be advanced: {reason}")]
    Propagation { match_id: MatchId, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
