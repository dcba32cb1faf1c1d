//! In-memory implementation of the storage port.
//!
//! Backs the state-machine tests; every method takes the single lock
//! briefly and never holds it across an await.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::bracket::models::{Match, MatchStatus, PlayerSlot};
use crate::db::store::Store;
use crate::errors::Result;
use crate::scoring::models::{Dart, Leg, Turn, TurnStatus};
use crate::tournament::{Registration, Tournament, TournamentStatus};
use crate::{DartId, LegId, MatchId, RegistrationId, TournamentId, TurnId, UserId};

#[derive(Default)]
struct Inner {
    tournaments: HashMap<TournamentId, Tournament>,
    registrations: HashMap<RegistrationId, Registration>,
    matches: HashMap<MatchId, Match>,
    legs: HashMap<LegId, Leg>,
    turns: HashMap<TurnId, Turn>,
    darts: HashMap<DartId, Dart>,
}

/// In-memory store for tests and local experimentation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        f(&mut inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<()> {
        self.with(|inner| {
            inner.tournaments.insert(tournament.id, tournament.clone());
        });
        Ok(())
    }

    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>> {
        Ok(self.with(|inner| inner.tournaments.get(&id).cloned()))
    }

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<()> {
        self.with(|inner| {
            if let Some(tournament) = inner.tournaments.get_mut(&id) {
                tournament.status = status;
            }
        });
        Ok(())
    }

    async fn insert_registration(&self, registration: &Registration) -> Result<()> {
        self.with(|inner| {
            inner
                .registrations
                .insert(registration.id, registration.clone());
        });
        Ok(())
    }

    async fn registrations_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Registration>> {
        Ok(self.with(|inner| {
            let mut registrations: Vec<_> = inner
                .registrations
                .values()
                .filter(|r| r.tournament_id == tournament_id)
                .cloned()
                .collect();
            registrations.sort_by_key(|r| r.registered_at);
            registrations
        }))
    }

    async fn insert_matches(&self, matches: &[Match]) -> Result<()> {
        self.with(|inner| {
            for m in matches {
                inner.matches.insert(m.id, m.clone());
            }
        });
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> Result<Option<Match>> {
        Ok(self.with(|inner| inner.matches.get(&id).cloned()))
    }

    async fn matches_for_tournament(&self, tournament_id: TournamentId) -> Result<Vec<Match>> {
        Ok(self.with(|inner| {
            let mut matches: Vec<_> = inner
                .matches
                .values()
                .filter(|m| m.tournament_id == tournament_id)
                .cloned()
                .collect();
            matches.sort_by_key(|m| (std::cmp::Reverse(m.round), m.position));
            matches
        }))
    }

    async fn set_match_player(
        &self,
        id: MatchId,
        slot: PlayerSlot,
        player: RegistrationId,
    ) -> Result<()> {
        self.with(|inner| {
            if let Some(m) = inner.matches.get_mut(&id) {
                match slot {
                    PlayerSlot::Player1 => m.player1 = Some(player),
                    PlayerSlot::Player2 => m.player2 = Some(player),
                }
            }
        });
        Ok(())
    }

    async fn assign_scorer(&self, id: MatchId, scorer: Option<UserId>) -> Result<()> {
        self.with(|inner| {
            if let Some(m) = inner.matches.get_mut(&id) {
                m.assigned_scorer = scorer;
                match scorer {
                    Some(_) => {
                        m.status = MatchStatus::Assigned;
                        m.assigned_at = Some(Utc::now());
                    }
                    None => {
                        m.status = MatchStatus::Pending;
                        m.assigned_at = None;
                    }
                }
            }
        });
        Ok(())
    }

    async fn set_match_status(&self, id: MatchId, status: MatchStatus) -> Result<()> {
        self.with(|inner| {
            if let Some(m) = inner.matches.get_mut(&id) {
                m.status = status;
                match status {
                    MatchStatus::InProgress => m.started_at = Some(Utc::now()),
                    MatchStatus::Completed => m.completed_at = Some(Utc::now()),
                    _ => {}
                }
            }
        });
        Ok(())
    }

    async fn set_legs_won(&self, id: MatchId, player1_legs: u32, player2_legs: u32) -> Result<()> {
        self.with(|inner| {
            if let Some(m) = inner.matches.get_mut(&id) {
                m.player1_legs_won = player1_legs;
                m.player2_legs_won = player2_legs;
            }
        });
        Ok(())
    }

    async fn complete_match(
        &self,
        id: MatchId,
        winner: RegistrationId,
        player1_legs: u32,
        player2_legs: u32,
    ) -> Result<()> {
        self.with(|inner| {
            if let Some(m) = inner.matches.get_mut(&id) {
                m.winner = Some(winner);
                m.player1_legs_won = player1_legs;
                m.player2_legs_won = player2_legs;
                m.status = MatchStatus::Completed;
                m.completed_at = Some(Utc::now());
            }
        });
        Ok(())
    }

    async fn insert_leg(&self, leg: &Leg) -> Result<()> {
        self.with(|inner| {
            inner.legs.insert(leg.id, leg.clone());
        });
        Ok(())
    }

    async fn get_leg(&self, id: LegId) -> Result<Option<Leg>> {
        Ok(self.with(|inner| inner.legs.get(&id).cloned()))
    }

    async fn legs_for_match(&self, match_id: MatchId) -> Result<Vec<Leg>> {
        Ok(self.with(|inner| {
            let mut legs: Vec<_> = inner
                .legs
                .values()
                .filter(|l| l.match_id == match_id)
                .cloned()
                .collect();
            legs.sort_by_key(|l| l.leg_number);
            legs
        }))
    }

    async fn active_leg_for_match(&self, match_id: MatchId) -> Result<Option<Leg>> {
        Ok(self.with(|inner| {
            inner
                .legs
                .values()
                .find(|l| l.match_id == match_id && l.winner.is_none())
                .cloned()
        }))
    }

    async fn complete_leg(
        &self,
        id: LegId,
        winner: RegistrationId,
        player1_final: u32,
        player2_final: u32,
        total_darts: u32,
        checkout_dart: u8,
    ) -> Result<()> {
        self.with(|inner| {
            if let Some(leg) = inner.legs.get_mut(&id) {
                leg.winner = Some(winner);
                leg.player1_final_score = Some(player1_final);
                leg.player2_final_score = Some(player2_final);
                leg.total_darts_thrown = total_darts;
                leg.checkout_dart = Some(checkout_dart);
                leg.completed_at = Some(Utc::now());
            }
        });
        Ok(())
    }

    async fn insert_turn(&self, turn: &Turn) -> Result<()> {
        self.with(|inner| {
            inner.turns.insert(turn.id, turn.clone());
        });
        Ok(())
    }

    async fn get_turn(&self, id: TurnId) -> Result<Option<Turn>> {
        Ok(self.with(|inner| inner.turns.get(&id).cloned()))
    }

    async fn turns_for_leg(&self, leg_id: LegId) -> Result<Vec<Turn>> {
        Ok(self.with(|inner| {
            let mut turns: Vec<_> = inner
                .turns
                .values()
                .filter(|t| t.leg_id == leg_id)
                .cloned()
                .collect();
            turns.sort_by_key(|t| t.turn_number);
            turns
        }))
    }

    async fn close_turn(
        &self,
        id: TurnId,
        turn_total: u32,
        score_after: u32,
        is_checkout_attempt: bool,
        is_successful_checkout: bool,
    ) -> Result<()> {
        self.with(|inner| {
            if let Some(turn) = inner.turns.get_mut(&id) {
                turn.turn_total = turn_total;
                turn.score_after = score_after;
                turn.is_checkout_attempt = is_checkout_attempt;
                turn.is_successful_checkout = is_successful_checkout;
                turn.status = TurnStatus::Closed;
            }
        });
        Ok(())
    }

    async fn insert_dart(&self, dart: &Dart) -> Result<()> {
        self.with(|inner| {
            inner.darts.insert(dart.id, dart.clone());
        });
        Ok(())
    }

    async fn darts_for_turn(&self, turn_id: TurnId) -> Result<Vec<Dart>> {
        Ok(self.with(|inner| {
            let mut darts: Vec<_> = inner
                .darts
                .values()
                .filter(|d| d.turn_id == turn_id)
                .cloned()
                .collect();
            darts.sort_by_key(|d| d.dart_number);
            darts
        }))
    }

    async fn delete_dart(&self, id: DartId) -> Result<()> {
        self.with(|inner| {
            inner.darts.remove(&id);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_matches_ordered_round_desc_position_asc() {
        let store = MemoryStore::new();
        let tournament_id = Uuid::new_v4();
        let matches = vec![
            Match::new(tournament_id, 1, 1, 5, 501),
            Match::new(tournament_id, 2, 2, 5, 501),
            Match::new(tournament_id, 2, 1, 5, 501),
        ];
        store.insert_matches(&matches).await.unwrap();

        let ordered = store.matches_for_tournament(tournament_id).await.unwrap();
        let keys: Vec<_> = ordered.iter().map(|m| (m.round, m.position)).collect();
        assert_eq!(keys, vec![(2, 1), (2, 2), (1, 1)]);
    }

    #[tokio::test]
    async fn test_active_leg_lookup() {
        let store = MemoryStore::new();
        let match_id = Uuid::new_v4();
        let leg = Leg::new(match_id, 1, Uuid::new_v4(), Uuid::new_v4(), 501);
        store.insert_leg(&leg).await.unwrap();

        assert!(store.active_leg_for_match(match_id).await.unwrap().is_some());

        store
            .complete_leg(leg.id, leg.player1, 0, 220, 15, 2)
            .await
            .unwrap();
        assert!(store.active_leg_for_match(match_id).await.unwrap().is_none());

        let completed = store.get_leg(leg.id).await.unwrap().unwrap();
        assert_eq!(completed.winner, Some(leg.player1));
        assert_eq!(completed.checkout_dart, Some(2));
        assert_eq!(completed.total_darts_thrown, 15);
    }
}
