//! Live scoring state machines.
//!
//! [`ScoringManager`] drives the dart -> turn -> leg -> match progression
//! for one match at a time. A turn accepts up to three darts and closes
//! early on a bust or checkout; a checkout completes the leg, bumps the
//! winner's legs-won tally and, at the best-of threshold, completes the
//! match and hands the winner to the advancement engine.

use std::sync::Arc;

use log::{debug, info};

use crate::bracket::advance::AdvancementEngine;
use crate::bracket::models::{Match, MatchStatus};
use crate::db::Store;
use crate::errors::{Error, Result};
use crate::events::{ChangeNotifier, EntityChange};
use crate::scoring::models::{Dart, Leg, Multiplier, Turn};
use crate::scoring::rules;
use crate::tournament::TournamentStatus;
use crate::{LegId, MatchId, RegistrationId, TurnId, UserId};

/// Result of recording one dart.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DartOutcome {
    pub dart: Dart,
    /// The throw busted; the turn closed with no score retained
    pub busted: bool,
    /// The turn closed (third dart, bust or checkout)
    pub turn_closed: bool,
    /// The dart checked out and this player won the leg
    pub leg_won: Option<RegistrationId>,
    /// The leg win reached the best-of threshold and decided the match
    pub match_won: Option<RegistrationId>,
}

/// Sequences darts, turns and legs for matches, and completes matches.
pub struct ScoringManager {
    store: Arc<dyn Store>,
    notifier: Arc<dyn ChangeNotifier>,
    advancement: AdvancementEngine,
}

impl ScoringManager {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        let advancement = AdvancementEngine::new(Arc::clone(&store), Arc::clone(&notifier));
        Self {
            store,
            notifier,
            advancement,
        }
    }

    /// Assign a scorer to a pending match.
    pub async fn assign_scorer(&self, match_id: MatchId, scorer: UserId) -> Result<Match> {
        let m = self.get_match(match_id).await?;
        expect_status(&m, MatchStatus::Pending)?;
        self.store.assign_scorer(match_id, Some(scorer)).await?;
        self.notifier.entity_changed(EntityChange::Match(match_id));
        self.get_match(match_id).await
    }

    /// Release an assigned match back to pending.
    pub async fn unassign_scorer(&self, match_id: MatchId) -> Result<Match> {
        let m = self.get_match(match_id).await?;
        expect_status(&m, MatchStatus::Assigned)?;
        self.store.assign_scorer(match_id, None).await?;
        self.notifier.entity_changed(EntityChange::Match(match_id));
        self.get_match(match_id).await
    }

    /// Move an assigned match into live scoring. Both player slots must be
    /// resolved first.
    pub async fn start_match(&self, match_id: MatchId) -> Result<Match> {
        let m = self.get_match(match_id).await?;
        expect_status(&m, MatchStatus::Assigned)?;
        if !m.has_both_players() {
            return Err(Error::MatchSlotsUnfilled(match_id));
        }
        self.store
            .set_match_status(match_id, MatchStatus::InProgress)
            .await?;
        self.notifier.entity_changed(EntityChange::Match(match_id));
        info!("match {match_id} started");
        self.get_match(match_id).await
    }

    /// Open the next leg of an in-progress match.
    pub async fn start_leg(&self, match_id: MatchId) -> Result<Leg> {
        let m = self.get_match(match_id).await?;
        expect_status(&m, MatchStatus::InProgress)?;
        let (Some(player1), Some(player2)) = (m.player1, m.player2) else {
            return Err(Error::MatchSlotsUnfilled(match_id));
        };
        if self.store.active_leg_for_match(match_id).await?.is_some() {
            return Err(Error::LegStillActive(match_id));
        }

        let leg_number = self.store.legs_for_match(match_id).await?.len() as u32 + 1;
        let leg = Leg::new(match_id, leg_number, player1, player2, m.starting_score);
        self.store.insert_leg(&leg).await?;
        self.notifier.entity_changed(EntityChange::Leg(leg.id));
        debug!("leg {leg_number} of match {match_id} started");
        Ok(leg)
    }

    /// Open a turn for a player in an active leg.
    ///
    /// The score carried in is the player's score after their previous
    /// turn, or the leg's starting score on their first visit.
    /// Alternating the players is the caller's responsibility.
    pub async fn start_turn(&self, leg_id: LegId, player: RegistrationId) -> Result<Turn> {
        let leg = self
            .store
            .get_leg(leg_id)
            .await?
            .ok_or(Error::LegNotFound(leg_id))?;
        if !leg.is_active() {
            return Err(Error::LegAlreadyComplete(leg_id));
        }
        if leg.starting_score_for(player).is_none() {
            return Err(Error::PlayerNotInLeg(leg_id));
        }

        let turns = self.store.turns_for_leg(leg_id).await?;
        if let Some(open) = turns.iter().find(|t| t.is_open()) {
            return Err(Error::TurnStillOpen(open.id));
        }

        let score_before = current_score_of(&leg, player, &turns);
        let turn = Turn::new(leg_id, player, turns.len() as u32 + 1, score_before);
        self.store.insert_turn(&turn).await?;
        self.notifier.entity_changed(EntityChange::Turn(turn.id));
        Ok(turn)
    }

    /// Record one dart against an open turn.
    ///
    /// `dart_number` must be the next free position (1-3). The throw is
    /// validated and evaluated against the score remaining at throw time;
    /// a bust or checkout closes the turn early, and a checkout completes
    /// the leg and possibly the match.
    pub async fn record_dart(
        &self,
        turn_id: TurnId,
        dart_number: u8,
        multiplier: u8,
        target: u8,
    ) -> Result<DartOutcome> {
        let turn = self
            .store
            .get_turn(turn_id)
            .await?
            .ok_or(Error::TurnNotFound(turn_id))?;
        if !turn.is_open() {
            return Err(Error::TurnClosed(turn_id));
        }

        let multiplier =
            Multiplier::try_from(multiplier).map_err(|_| Error::InvalidDart { multiplier, target })?;

        let darts = self.store.darts_for_turn(turn_id).await?;
        let expected = darts.len() as u8 + 1;
        if dart_number != expected {
            return Err(Error::DartOutOfSequence {
                expected,
                got: dart_number,
            });
        }

        // Score remaining at throw time. Busts close the turn, so every
        // dart already recorded here scored.
        let thrown: u32 = darts.iter().map(|d| d.value).sum();
        let current_score = turn.score_before - thrown;

        let outcome = rules::evaluate(current_score, multiplier, target)?;
        let dart = Dart::new(
            turn_id,
            dart_number,
            multiplier,
            target,
            outcome.value,
            outcome.bust,
        );
        self.store.insert_dart(&dart).await?;
        self.notifier.entity_changed(EntityChange::Dart(dart.id));
        debug!(
            "turn {turn_id}: dart {dart_number} {} from {current_score}",
            rules::format_dart(multiplier, target)
        );

        if outcome.bust {
            // No score retained for the visit.
            self.store
                .close_turn(
                    turn_id,
                    0,
                    turn.score_before,
                    rules::is_checkable(current_score),
                    false,
                )
                .await?;
            self.notifier.entity_changed(EntityChange::Turn(turn_id));
            return Ok(DartOutcome {
                dart,
                busted: true,
                turn_closed: true,
                leg_won: None,
                match_won: None,
            });
        }

        if outcome.checkout {
            self.store
                .close_turn(turn_id, turn.score_before, 0, true, true)
                .await?;
            self.notifier.entity_changed(EntityChange::Turn(turn_id));
            let match_won = self.complete_leg(&turn, dart_number).await?;
            return Ok(DartOutcome {
                dart,
                busted: false,
                turn_closed: true,
                leg_won: Some(turn.player),
                match_won,
            });
        }

        if dart_number == 3 {
            let turn_total = thrown + outcome.value;
            let attempted = darts_saw_checkable_score(turn.score_before, &darts);
            self.store
                .close_turn(
                    turn_id,
                    turn_total,
                    turn.score_before - turn_total,
                    attempted,
                    false,
                )
                .await?;
            self.notifier.entity_changed(EntityChange::Turn(turn_id));
            return Ok(DartOutcome {
                dart,
                busted: false,
                turn_closed: true,
                leg_won: None,
                match_won: None,
            });
        }

        Ok(DartOutcome {
            dart,
            busted: false,
            turn_closed: false,
            leg_won: None,
            match_won: None,
        })
    }

    /// Remove the most recent dart of an open turn.
    ///
    /// Only the latest dart of the currently open turn may be undone;
    /// closed turns are immutable.
    pub async fn undo_last_dart(&self, turn_id: TurnId) -> Result<Dart> {
        let turn = self
            .store
            .get_turn(turn_id)
            .await?
            .ok_or(Error::TurnNotFound(turn_id))?;
        if !turn.is_open() {
            return Err(Error::TurnClosed(turn_id));
        }

        let darts = self.store.darts_for_turn(turn_id).await?;
        let Some(last) = darts.last() else {
            return Err(Error::NoDartToUndo(turn_id));
        };

        self.store.delete_dart(last.id).await?;
        self.notifier.entity_changed(EntityChange::Dart(last.id));
        debug!("turn {turn_id}: undid dart {}", last.dart_number);
        Ok(last.clone())
    }

    /// Complete the leg the checkout turn belongs to, tally the match and,
    /// when the best-of threshold is reached, complete the match and
    /// advance the winner.
    async fn complete_leg(&self, turn: &Turn, checkout_dart: u8) -> Result<Option<RegistrationId>> {
        let leg = self
            .store
            .get_leg(turn.leg_id)
            .await?
            .ok_or(Error::LegNotFound(turn.leg_id))?;
        if !leg.is_active() {
            return Err(Error::LegAlreadyComplete(leg.id));
        }

        let winner = turn.player;
        let opponent = leg
            .opponent_of(winner)
            .ok_or(Error::PlayerNotInLeg(leg.id))?;

        let turns = self.store.turns_for_leg(leg.id).await?;
        let opponent_score = current_score_of(&leg, opponent, &turns);

        let mut total_darts = 0u32;
        for t in &turns {
            total_darts += self.store.darts_for_turn(t.id).await?.len() as u32;
        }

        let (p1_final, p2_final) = if winner == leg.player1 {
            (0, opponent_score)
        } else {
            (opponent_score, 0)
        };
        self.store
            .complete_leg(leg.id, winner, p1_final, p2_final, total_darts, checkout_dart)
            .await?;
        self.notifier.entity_changed(EntityChange::Leg(leg.id));
        info!("leg {} of match {} won in {total_darts} darts", leg.leg_number, leg.match_id);

        self.tally_match(leg.match_id, winner).await
    }

    async fn tally_match(
        &self,
        match_id: MatchId,
        leg_winner: RegistrationId,
    ) -> Result<Option<RegistrationId>> {
        let m = self.get_match(match_id).await?;
        if m.status == MatchStatus::Completed {
            return Err(Error::MatchAlreadyComplete(match_id));
        }

        let mut p1_legs = m.player1_legs_won;
        let mut p2_legs = m.player2_legs_won;
        if Some(leg_winner) == m.player1 {
            p1_legs += 1;
        } else {
            p2_legs += 1;
        }

        if p1_legs.max(p2_legs) < m.legs_to_win() {
            self.store.set_legs_won(match_id, p1_legs, p2_legs).await?;
            self.notifier.entity_changed(EntityChange::Match(match_id));
            return Ok(None);
        }

        // The completion commits before advancement; an advancement
        // failure surfaces as Error::Propagation with the match left
        // completed, and the same advance call can be retried.
        self.store
            .complete_match(match_id, leg_winner, p1_legs, p2_legs)
            .await?;
        self.notifier.entity_changed(EntityChange::Match(match_id));
        info!("match {match_id} won {p1_legs}-{p2_legs}");

        if self.advancement.advance(&m, leg_winner).await?.is_none() {
            // The final: no downstream match, the tournament is decided.
            self.store
                .set_tournament_status(m.tournament_id, TournamentStatus::Completed)
                .await?;
        }
        Ok(Some(leg_winner))
    }

    async fn get_match(&self, match_id: MatchId) -> Result<Match> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or(Error::MatchNotFound(match_id))
    }
}

fn expect_status(m: &Match, expected: MatchStatus) -> Result<()> {
    if m.status == expected {
        Ok(())
    } else {
        Err(Error::InvalidMatchState {
            expected,
            actual: m.status,
        })
    }
}

/// A player's score after their latest closed turn, or the leg's starting
/// score before their first visit.
fn current_score_of(leg: &Leg, player: RegistrationId, turns: &[Turn]) -> u32 {
    turns
        .iter()
        .filter(|t| t.player == player && !t.is_open())
        .max_by_key(|t| t.turn_number)
        .map_or_else(
            || leg.starting_score_for(player).unwrap_or_default(),
            |t| t.score_after,
        )
}

/// Whether any dart of the visit was thrown from a checkable score.
fn darts_saw_checkable_score(score_before: u32, prior_darts: &[Dart]) -> bool {
    let mut score = score_before;
    if rules::is_checkable(score) {
        return true;
    }
    for dart in prior_darts {
        score -= dart.value;
        if rules::is_checkable(score) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::events::NullNotifier;
    use crate::scoring::models::TurnStatus;
    use uuid::Uuid;

    struct Fixture {
        store: Arc<MemoryStore>,
        manager: ScoringManager,
        match_id: MatchId,
        player1: RegistrationId,
        player2: RegistrationId,
    }

    /// One in-progress match with both players, ready for scoring.
    async fn fixture(best_of_legs: u32, starting_score: u32) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let manager = ScoringManager::new(Arc::clone(&store) as Arc<dyn Store>, Arc::new(NullNotifier));

        let player1 = Uuid::new_v4();
        let player2 = Uuid::new_v4();
        let mut m = Match::new(Uuid::new_v4(), 1, 1, best_of_legs, starting_score);
        m.player1 = Some(player1);
        m.player2 = Some(player2);
        m.status = MatchStatus::InProgress;
        let match_id = m.id;
        store.insert_matches(&[m]).await.unwrap();

        Fixture {
            store,
            manager,
            match_id,
            player1,
            player2,
        }
    }

    #[tokio::test]
    async fn test_leg_and_turn_sequencing() {
        let fx = fixture(3, 501).await;
        let leg = fx.manager.start_leg(fx.match_id).await.unwrap();
        assert_eq!(leg.leg_number, 1);

        // A second active leg is rejected.
        assert!(matches!(
            fx.manager.start_leg(fx.match_id).await,
            Err(Error::LegStillActive(_))
        ));

        let turn = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();
        assert_eq!(turn.turn_number, 1);
        assert_eq!(turn.score_before, 501);

        // No second turn while one is open.
        assert!(matches!(
            fx.manager.start_turn(leg.id, fx.player2).await,
            Err(Error::TurnStillOpen(_))
        ));
    }

    #[tokio::test]
    async fn test_three_darts_close_the_turn_and_carry_the_score() {
        let fx = fixture(3, 501).await;
        let leg = fx.manager.start_leg(fx.match_id).await.unwrap();
        let turn = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();

        for dart_number in 1..=2 {
            let outcome = fx
                .manager
                .record_dart(turn.id, dart_number, 3, 20)
                .await
                .unwrap();
            assert!(!outcome.turn_closed);
        }
        let outcome = fx.manager.record_dart(turn.id, 3, 3, 20).await.unwrap();
        assert!(outcome.turn_closed);
        assert!(!outcome.busted);

        let closed = fx.store.get_turn(turn.id).await.unwrap().unwrap();
        assert_eq!(closed.status, TurnStatus::Closed);
        assert_eq!(closed.turn_total, 180);
        assert_eq!(closed.score_after, 321);

        // The next turn for the same player carries 321 in.
        let turn2 = fx.manager.start_turn(leg.id, fx.player2).await.unwrap();
        fx.manager.record_dart(turn2.id, 1, 1, 0).await.unwrap();
        fx.manager.record_dart(turn2.id, 2, 1, 0).await.unwrap();
        fx.manager.record_dart(turn2.id, 3, 1, 0).await.unwrap();
        let turn3 = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();
        assert_eq!(turn3.score_before, 321);
    }

    #[tokio::test]
    async fn test_bust_reverts_the_visit() {
        let fx = fixture(3, 32).await;
        let leg = fx.manager.start_leg(fx.match_id).await.unwrap();

        let turn = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();
        assert_eq!(turn.score_before, 32);

        // T20 from 32 goes negative.
        let outcome = fx.manager.record_dart(turn.id, 1, 3, 20).await.unwrap();
        assert!(outcome.busted);
        assert!(outcome.turn_closed);
        assert!(outcome.leg_won.is_none());

        let closed = fx.store.get_turn(turn.id).await.unwrap().unwrap();
        assert_eq!(closed.score_after, 32);
        assert_eq!(closed.turn_total, 0);
        // Busted from a checkable score: attempt without success.
        assert!(closed.is_checkout_attempt);
        assert!(!closed.is_successful_checkout);

        // Recording against the closed turn is a state error.
        assert!(matches!(
            fx.manager.record_dart(turn.id, 2, 1, 5).await,
            Err(Error::TurnClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_undo_only_touches_the_last_open_dart() {
        let fx = fixture(3, 501).await;
        let leg = fx.manager.start_leg(fx.match_id).await.unwrap();
        let turn = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();

        assert!(matches!(
            fx.manager.undo_last_dart(turn.id).await,
            Err(Error::NoDartToUndo(_))
        ));

        fx.manager.record_dart(turn.id, 1, 3, 20).await.unwrap();
        fx.manager.record_dart(turn.id, 2, 3, 20).await.unwrap();

        let removed = fx.manager.undo_last_dart(turn.id).await.unwrap();
        assert_eq!(removed.dart_number, 2);

        let darts = fx.store.darts_for_turn(turn.id).await.unwrap();
        assert_eq!(darts.len(), 1);
        assert_eq!(darts[0].dart_number, 1);
        assert!(fx.store.get_turn(turn.id).await.unwrap().unwrap().is_open());

        // The slot is reusable after the undo.
        let outcome = fx.manager.record_dart(turn.id, 2, 1, 5).await.unwrap();
        assert!(!outcome.turn_closed);
    }

    #[tokio::test]
    async fn test_checkout_completes_leg_and_match() {
        let fx = fixture(1, 170).await;
        let leg = fx.manager.start_leg(fx.match_id).await.unwrap();

        // T20 T20 D25: the 170 finish.
        let turn = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();
        fx.manager.record_dart(turn.id, 1, 3, 20).await.unwrap();
        fx.manager.record_dart(turn.id, 2, 3, 20).await.unwrap();
        let outcome = fx.manager.record_dart(turn.id, 3, 2, 25).await.unwrap();

        assert_eq!(outcome.leg_won, Some(fx.player1));
        assert_eq!(outcome.match_won, Some(fx.player1));

        let completed_leg = fx.store.get_leg(leg.id).await.unwrap().unwrap();
        assert_eq!(completed_leg.winner, Some(fx.player1));
        assert_eq!(completed_leg.player1_final_score, Some(0));
        assert_eq!(completed_leg.player2_final_score, Some(170));
        assert_eq!(completed_leg.total_darts_thrown, 3);
        assert_eq!(completed_leg.checkout_dart, Some(3));

        let m = fx.store.get_match(fx.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.winner, Some(fx.player1));
        assert_eq!(m.player1_legs_won, 1);
    }

    #[tokio::test]
    async fn test_best_of_three_needs_two_legs() {
        let fx = fixture(3, 40).await;

        // Player1 takes leg one with a D20.
        let leg1 = fx.manager.start_leg(fx.match_id).await.unwrap();
        let turn = fx.manager.start_turn(leg1.id, fx.player1).await.unwrap();
        let outcome = fx.manager.record_dart(turn.id, 1, 2, 20).await.unwrap();
        assert_eq!(outcome.leg_won, Some(fx.player1));
        assert!(outcome.match_won.is_none());

        let m = fx.store.get_match(fx.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
        assert_eq!(m.player1_legs_won, 1);
        assert_eq!(m.player2_legs_won, 0);

        // Player1 takes leg two, and with it the match.
        let leg2 = fx.manager.start_leg(fx.match_id).await.unwrap();
        assert_eq!(leg2.leg_number, 2);
        let turn = fx.manager.start_turn(leg2.id, fx.player1).await.unwrap();
        let outcome = fx.manager.record_dart(turn.id, 1, 2, 20).await.unwrap();
        assert_eq!(outcome.match_won, Some(fx.player1));

        let m = fx.store.get_match(fx.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.player1_legs_won, 2);
    }

    #[tokio::test]
    async fn test_match_lifecycle_guards() {
        let store = Arc::new(MemoryStore::new());
        let manager = ScoringManager::new(Arc::clone(&store) as Arc<dyn Store>, Arc::new(NullNotifier));
        let scorer = Uuid::new_v4();

        let mut m = Match::new(Uuid::new_v4(), 1, 1, 3, 501);
        m.player1 = Some(Uuid::new_v4());
        let match_id = m.id;
        store.insert_matches(&[m]).await.unwrap();

        // Starting an unassigned match is rejected.
        assert!(matches!(
            manager.start_match(match_id).await,
            Err(Error::InvalidMatchState {
                expected: MatchStatus::Assigned,
                actual: MatchStatus::Pending,
            })
        ));

        let assigned = manager.assign_scorer(match_id, scorer).await.unwrap();
        assert_eq!(assigned.status, MatchStatus::Assigned);
        assert_eq!(assigned.assigned_scorer, Some(scorer));

        // Assigning twice is rejected; unassigning goes back to pending.
        assert!(manager.assign_scorer(match_id, scorer).await.is_err());
        let pending = manager.unassign_scorer(match_id).await.unwrap();
        assert_eq!(pending.status, MatchStatus::Pending);
        assert_eq!(pending.assigned_scorer, None);

        // One slot still empty: cannot start.
        manager.assign_scorer(match_id, scorer).await.unwrap();
        assert!(matches!(
            manager.start_match(match_id).await,
            Err(Error::MatchSlotsUnfilled(_))
        ));
    }

    #[tokio::test]
    async fn test_dart_sequence_enforced() {
        let fx = fixture(3, 501).await;
        let leg = fx.manager.start_leg(fx.match_id).await.unwrap();
        let turn = fx.manager.start_turn(leg.id, fx.player1).await.unwrap();

        assert!(matches!(
            fx.manager.record_dart(turn.id, 2, 1, 20).await,
            Err(Error::DartOutOfSequence { expected: 1, got: 2 })
        ));
        fx.manager.record_dart(turn.id, 1, 1, 20).await.unwrap();
        assert!(matches!(
            fx.manager.record_dart(turn.id, 1, 1, 20).await,
            Err(Error::DartOutOfSequence { expected: 2, got: 1 })
        ));
    }

}
