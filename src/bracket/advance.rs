//! Winner advancement.
//!
//! When a match completes, its winner moves into one slot of the
//! downstream match. The slot is resolved against the feed wiring fixed
//! at build time, never against mutable match state, so calling
//! [`AdvancementEngine::advance`] again for the same completed match
//! rewrites the same slot with the same value.

use std::sync::Arc;

use log::{info, warn};

use crate::bracket::models::{Match, PlayerSlot};
use crate::db::Store;
use crate::errors::{Error, Result};
use crate::events::{ChangeNotifier, EntityChange};
use crate::{MatchId, RegistrationId};

/// Moves match winners into their downstream slots.
pub struct AdvancementEngine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl AdvancementEngine {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Advance the winner of a completed match.
    ///
    /// Returns the downstream match and slot that were filled, or `None`
    /// when the completed match was the final. Failures here are
    /// [`Error::Propagation`]: the completed match stays completed and
    /// the same call can be retried.
    pub async fn advance(
        &self,
        completed: &Match,
        winner: RegistrationId,
    ) -> Result<Option<(MatchId, PlayerSlot)>> {
        let Some(downstream_id) = completed.feeds_into else {
            info!(
                "match {} was the final; tournament {} complete",
                completed.id, completed.tournament_id
            );
            return Ok(None);
        };

        let downstream = self
            .store
            .get_match(downstream_id)
            .await
            .map_err(|e| propagation(completed.id, format!("loading downstream match: {e}")))?
            .ok_or_else(|| {
                propagation(
                    completed.id,
                    format!("downstream match {downstream_id} does not exist"),
                )
            })?;

        let Some(slot) = downstream.slot_fed_by(completed.id) else {
            return Err(propagation(
                completed.id,
                format!("downstream match {downstream_id} has no source slot for this match"),
            ));
        };

        self.store
            .set_match_player(downstream_id, slot, winner)
            .await
            .map_err(|e| propagation(completed.id, format!("writing downstream slot: {e}")))?;

        self.notifier
            .entity_changed(EntityChange::Match(downstream_id));

        info!(
            "advanced winner of match {} into {:?} of match {downstream_id}",
            completed.id, slot
        );
        Ok(Some((downstream_id, slot)))
    }
}

fn propagation(match_id: MatchId, reason: String) -> Error {
    warn!("advancement failed for match {match_id}: {reason}");
    Error::Propagation { match_id, reason }
}
