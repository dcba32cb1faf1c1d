//! PostgreSQL implementation of the storage port.
//!
//! Every update statement names exactly the columns it changes, so two
//! writers touching different fields of the same row (the two semi-finals
//! filling the final's slots, for instance) cannot lose each other's
//! write.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::bracket::models::{Match, MatchStatus, PlayerSlot};
use crate::db::store::Store;
use crate::errors::Result;
use crate::scoring::models::{Dart, Leg, Multiplier, Turn, TurnStatus};
use crate::tournament::{Registration, Tournament, TournamentStatus};
use crate::{DartId, LegId, MatchId, RegistrationId, TournamentId, TurnId, UserId};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn tournament_status_str(status: TournamentStatus) -> &'static str {
    match status {
        TournamentStatus::Setup => "setup",
        TournamentStatus::InProgress => "in_progress",
        TournamentStatus::Completed => "completed",
    }
}

fn tournament_status_from(s: &str) -> TournamentStatus {
    match s {
        "in_progress" => TournamentStatus::InProgress,
        "completed" => TournamentStatus::Completed,
        _ => TournamentStatus::Setup,
    }
}

fn match_status_str(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Pending => "pending",
        MatchStatus::Assigned => "assigned",
        MatchStatus::InProgress => "in_progress",
        MatchStatus::Completed => "completed",
    }
}

fn match_status_from(s: &str) -> MatchStatus {
    match s {
        "assigned" => MatchStatus::Assigned,
        "in_progress" => MatchStatus::InProgress,
        "completed" => MatchStatus::Completed,
        _ => MatchStatus::Pending,
    }
}

fn match_from_row(row: &PgRow) -> Match {
    let status: String = row.get("status");
    Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        round: row.get::<i32, _>("round") as u32,
        position: row.get::<i32, _>("position_in_round") as u32,
        player1: row.get("player1_id"),
        player2: row.get("player2_id"),
        player1_source: row.get("player1_from_match_id"),
        player2_source: row.get("player2_from_match_id"),
        feeds_into: row.get("feeds_into_match_id"),
        winner: row.get("winner_id"),
        player1_legs_won: row.get::<i32, _>("player1_legs_won") as u32,
        player2_legs_won: row.get::<i32, _>("player2_legs_won") as u32,
        best_of_legs: row.get::<i32, _>("best_of_legs") as u32,
        starting_score: row.get::<i32, _>("starting_score") as u32,
        status: match_status_from(&status),
        assigned_scorer: row.get("assigned_to_user_id"),
        created_at: row.get("created_at"),
        assigned_at: row.get("assigned_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    }
}

fn leg_from_row(row: &PgRow) -> Leg {
    Leg {
        id: row.get("id"),
        match_id: row.get("match_id"),
        leg_number: row.get::<i32, _>("leg_number") as u32,
        player1: row.get("player1_id"),
        player2: row.get("player2_id"),
        player1_starting_score: row.get::<i32, _>("player1_starting_score") as u32,
        player2_starting_score: row.get::<i32, _>("player2_starting_score") as u32,
        player1_final_score: row
            .get::<Option<i32>, _>("player1_final_score")
            .map(|s| s as u32),
        player2_final_score: row
            .get::<Option<i32>, _>("player2_final_score")
            .map(|s| s as u32),
        winner: row.get("winner_id"),
        total_darts_thrown: row.get::<i32, _>("total_darts_thrown") as u32,
        checkout_dart: row.get::<Option<i16>, _>("checkout_dart").map(|d| d as u8),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
    }
}

fn turn_from_row(row: &PgRow) -> Turn {
    let closed: bool = row.get("is_closed");
    Turn {
        id: row.get("id"),
        leg_id: row.get("leg_id"),
        player: row.get("player_id"),
        turn_number: row.get::<i32, _>("turn_number") as u32,
        score_before: row.get::<i32, _>("score_before") as u32,
        score_after: row.get::<i32, _>("score_after") as u32,
        turn_total: row.get::<i32, _>("turn_total") as u32,
        status: if closed {
            TurnStatus::Closed
        } else {
            TurnStatus::Open
        },
        is_checkout_attempt: row.get("is_checkout_attempt"),
        is_successful_checkout: row.get("is_successful_checkout"),
    }
}

fn dart_from_row(row: &PgRow) -> Dart {
    let multiplier = match row.get::<i16, _>("multiplier") {
        2 => Multiplier::Double,
        3 => Multiplier::Treble,
        _ => Multiplier::Single,
    };
    Dart {
        id: row.get("id"),
        turn_id: row.get("turn_id"),
        dart_number: row.get::<i16, _>("dart_number") as u8,
        multiplier,
        target: row.get::<i16, _>("target") as u8,
        value: row.get::<i32, _>("value") as u32,
        is_bust: row.get("is_bust"),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tournaments (id, name, status, default_best_of_legs, default_starting_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(tournament_status_str(tournament.status))
        .bind(tournament.default_best_of_legs as i32)
        .bind(tournament.default_starting_score as i32)
        .bind(tournament.created_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, status, default_best_of_legs, default_starting_score, created_at
            FROM tournaments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|row| {
            let status: String = row.get("status");
            Tournament {
                id: row.get("id"),
                name: row.get("name"),
                status: tournament_status_from(&status),
                default_best_of_legs: row.get::<i32, _>("default_best_of_legs") as u32,
                default_starting_score: row.get::<i32, _>("default_starting_score") as u32,
                created_at: row.get("created_at"),
            }
        }))
    }

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
            .bind(tournament_status_str(status))
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn insert_registration(&self, registration: &Registration) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tournament_players (id, tournament_id, entrant_id, seed_number, registered_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(registration.id)
        .bind(registration.tournament_id)
        .bind(registration.entrant_id)
        .bind(registration.seed.map(|s| s as i32))
        .bind(registration.registered_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn registrations_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Registration>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tournament_id, entrant_id, seed_number, registered_at
            FROM tournament_players
            WHERE tournament_id = $1
            ORDER BY registered_at
            "#,
        )
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Registration {
                id: row.get("id"),
                tournament_id: row.get("tournament_id"),
                entrant_id: row.get("entrant_id"),
                seed: row.get::<Option<i32>, _>("seed_number").map(|s| s as u32),
                registered_at: row.get("registered_at"),
            })
            .collect())
    }

    async fn insert_matches(&self, matches: &[Match]) -> Result<()> {
        // One transaction so the bracket (and its wiring) becomes visible
        // all at once.
        let mut tx = self.pool.begin().await?;
        for m in matches {
            sqlx::query(
                r#"
                INSERT INTO matches (
                    id, tournament_id, round, position_in_round,
                    player1_id, player2_id,
                    player1_from_match_id, player2_from_match_id, feeds_into_match_id,
                    winner_id, player1_legs_won, player2_legs_won,
                    best_of_legs, starting_score, status,
                    assigned_to_user_id, created_at, assigned_at, started_at, completed_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                        $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
                "#,
            )
            .bind(m.id)
            .bind(m.tournament_id)
            .bind(m.round as i32)
            .bind(m.position as i32)
            .bind(m.player1)
            .bind(m.player2)
            .bind(m.player1_source)
            .bind(m.player2_source)
            .bind(m.feeds_into)
            .bind(m.winner)
            .bind(m.player1_legs_won as i32)
            .bind(m.player2_legs_won as i32)
            .bind(m.best_of_legs as i32)
            .bind(m.starting_score as i32)
            .bind(match_status_str(m.status))
            .bind(m.assigned_scorer)
            .bind(m.created_at)
            .bind(m.assigned_at)
            .bind(m.started_at)
            .bind(m.completed_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> Result<Option<Match>> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(|row| match_from_row(&row)))
    }

    async fn matches_for_tournament(&self, tournament_id: TournamentId) -> Result<Vec<Match>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM matches
            WHERE tournament_id = $1
            ORDER BY round DESC, position_in_round ASC
            "#,
        )
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows.iter().map(match_from_row).collect())
    }

    async fn set_match_player(
        &self,
        id: MatchId,
        slot: PlayerSlot,
        player: RegistrationId,
    ) -> Result<()> {
        let query = match slot {
            PlayerSlot::Player1 => "UPDATE matches SET player1_id = $1 WHERE id = $2",
            PlayerSlot::Player2 => "UPDATE matches SET player2_id = $1 WHERE id = $2",
        };
        sqlx::query(query)
            .bind(player)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn assign_scorer(&self, id: MatchId, scorer: Option<UserId>) -> Result<()> {
        let status = if scorer.is_some() {
            MatchStatus::Assigned
        } else {
            MatchStatus::Pending
        };
        sqlx::query(
            r#"
            UPDATE matches
            SET assigned_to_user_id = $1,
                status = $2,
                assigned_at = CASE WHEN $1 IS NULL THEN NULL ELSE NOW() END
            WHERE id = $3
            "#,
        )
        .bind(scorer)
        .bind(match_status_str(status))
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn set_match_status(&self, id: MatchId, status: MatchStatus) -> Result<()> {
        let query = match status {
            MatchStatus::InProgress => {
                "UPDATE matches SET status = $1, started_at = NOW() WHERE id = $2"
            }
            MatchStatus::Completed => {
                "UPDATE matches SET status = $1, completed_at = NOW() WHERE id = $2"
            }
            _ => "UPDATE matches SET status = $1 WHERE id = $2",
        };
        sqlx::query(query)
            .bind(match_status_str(status))
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn set_legs_won(&self, id: MatchId, player1_legs: u32, player2_legs: u32) -> Result<()> {
        sqlx::query("UPDATE matches SET player1_legs_won = $1, player2_legs_won = $2 WHERE id = $3")
            .bind(player1_legs as i32)
            .bind(player2_legs as i32)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn complete_match(
        &self,
        id: MatchId,
        winner: RegistrationId,
        player1_legs: u32,
        player2_legs: u32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE matches
            SET winner_id = $1, player1_legs_won = $2, player2_legs_won = $3,
                status = 'completed', completed_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(winner)
        .bind(player1_legs as i32)
        .bind(player2_legs as i32)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn insert_leg(&self, leg: &Leg) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO legs (
                id, match_id, leg_number, player1_id, player2_id,
                player1_starting_score, player2_starting_score,
                total_darts_thrown, started_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(leg.id)
        .bind(leg.match_id)
        .bind(leg.leg_number as i32)
        .bind(leg.player1)
        .bind(leg.player2)
        .bind(leg.player1_starting_score as i32)
        .bind(leg.player2_starting_score as i32)
        .bind(leg.total_darts_thrown as i32)
        .bind(leg.started_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn get_leg(&self, id: LegId) -> Result<Option<Leg>> {
        let row = sqlx::query("SELECT * FROM legs WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(|row| leg_from_row(&row)))
    }

    async fn legs_for_match(&self, match_id: MatchId) -> Result<Vec<Leg>> {
        let rows = sqlx::query("SELECT * FROM legs WHERE match_id = $1 ORDER BY leg_number")
            .bind(match_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows.iter().map(leg_from_row).collect())
    }

    async fn active_leg_for_match(&self, match_id: MatchId) -> Result<Option<Leg>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM legs
            WHERE match_id = $1 AND winner_id IS NULL
            ORDER BY leg_number DESC
            LIMIT 1
            "#,
        )
        .bind(match_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(row.map(|row| leg_from_row(&row)))
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
        sqlx::query(
            r#"
            UPDATE legs
            SET winner_id = $1, player1_final_score = $2, player2_final_score = $3,
                total_darts_thrown = $4, checkout_dart = $5, completed_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(winner)
        .bind(player1_final as i32)
        .bind(player2_final as i32)
        .bind(total_darts as i32)
        .bind(checkout_dart as i16)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn insert_turn(&self, turn: &Turn) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO turns (
                id, leg_id, player_id, turn_number, score_before, score_after,
                turn_total, is_closed, is_checkout_attempt, is_successful_checkout
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(turn.id)
        .bind(turn.leg_id)
        .bind(turn.player)
        .bind(turn.turn_number as i32)
        .bind(turn.score_before as i32)
        .bind(turn.score_after as i32)
        .bind(turn.turn_total as i32)
        .bind(turn.status == TurnStatus::Closed)
        .bind(turn.is_checkout_attempt)
        .bind(turn.is_successful_checkout)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn get_turn(&self, id: TurnId) -> Result<Option<Turn>> {
        let row = sqlx::query("SELECT * FROM turns WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(|row| turn_from_row(&row)))
    }

    async fn turns_for_leg(&self, leg_id: LegId) -> Result<Vec<Turn>> {
        let rows = sqlx::query("SELECT * FROM turns WHERE leg_id = $1 ORDER BY turn_number")
            .bind(leg_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows.iter().map(turn_from_row).collect())
    }

    async fn close_turn(
        &self,
        id: TurnId,
        turn_total: u32,
        score_after: u32,
        is_checkout_attempt: bool,
        is_successful_checkout: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE turns
            SET turn_total = $1, score_after = $2, is_closed = TRUE,
                is_checkout_attempt = $3, is_successful_checkout = $4
            WHERE id = $5
            "#,
        )
        .bind(turn_total as i32)
        .bind(score_after as i32)
        .bind(is_checkout_attempt)
        .bind(is_successful_checkout)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn insert_dart(&self, dart: &Dart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO darts (id, turn_id, dart_number, multiplier, target, value, is_bust)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(dart.id)
        .bind(dart.turn_id)
        .bind(dart.dart_number as i16)
        .bind(dart.multiplier.value() as i16)
        .bind(dart.target as i16)
        .bind(dart.value as i32)
        .bind(dart.is_bust)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn darts_for_turn(&self, turn_id: TurnId) -> Result<Vec<Dart>> {
        let rows = sqlx::query("SELECT * FROM darts WHERE turn_id = $1 ORDER BY dart_number")
            .bind(turn_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows.iter().map(dart_from_row).collect())
    }

    async fn delete_dart(&self, id: DartId) -> Result<()> {
        sqlx::query("DELETE FROM darts WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
