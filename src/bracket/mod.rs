//! Knockout bracket engine: seed placement, tree construction and winner
//! advancement.

pub mod advance;
pub mod builder;
pub mod models;
pub mod seeding;

pub use advance::AdvancementEngine;
pub use builder::{BracketBuilder, SUPPORTED_ENTRANT_COUNTS};
pub use models::{BracketTree, Match, MatchStatus, PlayerSlot};
pub use seeding::bracket_order;
