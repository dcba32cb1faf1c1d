//! Change notification port.
//!
//! The core emits an [`EntityChange`] after every committed state
//! transition. Delivery and ordering to subscribers is the notifier's
//! responsibility; the core only reports that an entity changed.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{DartId, LegId, MatchId, TurnId};

/// A committed change to one of the scoring entities.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EntityChange {
    Match(MatchId),
    Leg(LegId),
    Turn(TurnId),
    Dart(DartId),
}

impl fmt::Display for EntityChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match(id) => write!(f, "match {id} changed"),
            Self::Leg(id) => write!(f, "leg {id} changed"),
            Self::Turn(id) => write!(f, "turn {id} changed"),
            Self::Dart(id) => write!(f, "dart {id} changed"),
        }
    }
}

/// Outbound port for change notifications.
pub trait ChangeNotifier: Send + Sync {
    fn entity_changed(&self, change: EntityChange);
}

/// Notifier that logs each change at debug level.
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn entity_changed(&self, change: EntityChange) {
        debug!("{change}");
    }
}

/// Notifier that drops all changes. Useful in tests.
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn entity_changed(&self, _change: EntityChange) {}
}
