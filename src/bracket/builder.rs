//! Bracket construction.
//!
//! Builds the complete match tree for a tournament in one pass: round-one
//! pairings from the seed placement order, empty placeholder matches for
//! every later round, and the feed wiring between them. The whole tree is
//! wired in memory before anything is written, so the stored bracket is
//! never observable half-wired.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;

use crate::bracket::models::{BracketTree, Match};
use crate::bracket::seeding::bracket_order;
use crate::db::Store;
use crate::errors::{Error, Result};
use crate::events::{ChangeNotifier, EntityChange};
use crate::tournament::{Registration, TournamentStatus};
use crate::TournamentId;

/// Entrant counts the bracket supports.
pub const SUPPORTED_ENTRANT_COUNTS: [usize; 5] = [4, 8, 16, 32, 64];

/// Builds knockout brackets.
///
/// Expected to run exactly once per tournament activation; rebuilding an
/// existing bracket is the caller's responsibility to prevent.
pub struct BracketBuilder {
    store: Arc<dyn Store>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl BracketBuilder {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Build the full bracket for a tournament.
    ///
    /// Validates the entrant count and seed ranks before any write;
    /// a validation failure leaves the store untouched.
    pub async fn build(&self, tournament_id: TournamentId) -> Result<BracketTree> {
        let tournament = self
            .store
            .get_tournament(tournament_id)
            .await?
            .ok_or(Error::TournamentNotFound(tournament_id))?;

        let registrations = self
            .store
            .registrations_for_tournament(tournament_id)
            .await?;

        let seeded = order_by_seed(registrations)?;

        let n = seeded.len();
        if !SUPPORTED_ENTRANT_COUNTS.contains(&n) {
            return Err(Error::InvalidEntrantCount(n));
        }

        let num_rounds = n.ilog2();
        let placement = bracket_order(n);

        // Round-one matches, paired off the placement order.
        let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        let first_round = placement
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| {
                let mut m = Match::new(
                    tournament_id,
                    num_rounds,
                    i as u32 + 1,
                    tournament.default_best_of_legs,
                    tournament.default_starting_score,
                );
                m.player1 = Some(seeded[pair[0]].id);
                m.player2 = Some(seeded[pair[1]].id);
                m
            })
            .collect();
        rounds.insert(num_rounds, first_round);

        // Placeholder matches for every later round down to the final.
        for round in (1..num_rounds).rev() {
            let matches_in_round = 2usize.pow(round - 1);
            let matches = (1..=matches_in_round)
                .map(|pos| {
                    Match::new(
                        tournament_id,
                        round,
                        pos as u32,
                        tournament.default_best_of_legs,
                        tournament.default_starting_score,
                    )
                })
                .collect();
            rounds.insert(round, matches);
        }

        wire_feeds(&mut rounds, num_rounds);

        let matches: Vec<Match> = rounds.into_values().flatten().collect();
        self.store.insert_matches(&matches).await?;
        self.store
            .set_tournament_status(tournament_id, TournamentStatus::InProgress)
            .await?;

        for m in &matches {
            self.notifier.entity_changed(EntityChange::Match(m.id));
        }

        info!(
            "built bracket for tournament {tournament_id}: {} entrants, {} matches",
            n,
            matches.len()
        );

        Ok(BracketTree::from_matches(matches))
    }
}

/// Order registrations for placement: explicit seeds ascending first, then
/// unseeded entrants in registration order. Duplicate explicit ranks are
/// rejected.
fn order_by_seed(mut registrations: Vec<Registration>) -> Result<Vec<Registration>> {
    let mut seen = std::collections::HashSet::new();
    for registration in &registrations {
        if let Some(rank) = registration.seed {
            if !seen.insert(rank) {
                return Err(Error::DuplicateSeed(rank));
            }
        }
    }
    // Stable sort keeps registration order among unseeded entrants.
    registrations.sort_by_key(|r| (r.seed.is_none(), r.seed, r.registered_at));
    Ok(registrations)
}

/// Wire the feed relationships: match `i` (1-indexed) in round `r` feeds
/// match `ceil(i / 2)` in round `r - 1`; odd `i` fills the player1 slot,
/// even `i` the player2 slot.
fn wire_feeds(rounds: &mut BTreeMap<u32, Vec<Match>>, num_rounds: u32) {
    for round in (2..=num_rounds).rev() {
        let child_ids: Vec<_> = rounds[&round].iter().map(|m| m.id).collect();
        let parent_ids: Vec<_> = rounds[&(round - 1)].iter().map(|m| m.id).collect();

        for (i, &child_id) in child_ids.iter().enumerate() {
            let parent_index = i / 2;
            let parent_id = parent_ids[parent_index];

            let child = &mut rounds.get_mut(&round).unwrap()[i];
            child.feeds_into = Some(parent_id);

            let parent = &mut rounds.get_mut(&(round - 1)).unwrap()[parent_index];
            if i % 2 == 0 {
                parent.player1_source = Some(child_id);
            } else {
                parent.player2_source = Some(child_id);
            }
        }
    }
}
