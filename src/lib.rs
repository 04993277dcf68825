//! Game-facing value types for a deck-building card game agent.
//!
//! This crate owns the serialized, seed-resolved view of a game position
//! (`GameStateSnapshot`), the move representation, semantic equality between
//! positions that ignores physical card instance numbering, and the
//! structural hashing used by the search crate's transposition table.
//!
//! The rules engine itself is external: it is reached exclusively through the
//! [`game::GameTransition`] port, which applies a move to a snapshot and
//! returns the successor position together with its legal moves.

pub mod cards;
pub mod game;
pub mod rng;
pub mod state_hash;
pub mod types;

/// Re-exports the `rand` crate
pub use rand;

/// Re-exports the `smallvec` crate
pub use smallvec;

/// Re-exports the `thiserror` crate
pub use thiserror;

pub mod prelude {
    pub use crate::cards::CardCategories;
    pub use crate::game::{GameTransition, Transition};
    pub use crate::rng::RngState;
    pub use crate::state_hash::{HashValue, StateHash};
    pub use crate::types::*;
}
