//! Time-boxed Monte-Carlo Tree Search over the `tribute_sim` game view.
//!
//! The search tree lives in an arena indexed by [`tree::NodeId`] and is
//! shared across turns through a transposition table, so identical positions
//! reached by different move orders pool their statistics. The per-move
//! driver is [`bot::MctsBot`].

pub mod bot;
pub mod filter;
pub mod heuristics;
pub mod predictor;
pub mod settings;
pub mod tree;

use thiserror::Error;

/// Internal search failures. These are either unreachable-state assertions
/// (surfaced by tests) or conditions the bot recovers from by playing a
/// fallback move; they never escape [`bot::MctsBot::play`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("expand called on a fully expanded node")]
    FullyExpanded,
    #[error("no legal moves supplied for the current position")]
    NoLegalMoves,
    #[error("chosen move has no identical counterpart in the supplied legal moves")]
    OfficialMoveNotFound,
    #[error("node {0} is not present in the arena")]
    NodeMissing(u32),
}

#[cfg(test)]
pub(crate) mod testing;
