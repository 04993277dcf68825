use crate::types::{GameStateSnapshot, Move};

/// A successor position and its legal moves, as returned by the rules engine.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: GameStateSnapshot,
    pub legal_moves: Vec<Move>,
}

/// Port to the external rules engine.
///
/// `apply` must be deterministic for a given `seed`; passing `None` lets the
/// engine draw its own randomness and is reserved for exploratory paths where
/// reproducibility does not matter (plain rollouts).
pub trait GameTransition {
    fn apply(&self, state: &GameStateSnapshot, mv: &Move, seed: Option<u64>) -> Transition;
}
