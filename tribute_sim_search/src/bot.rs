//! Per-move driver: time budgeting, the visit loop, move recommendation and
//! fallback handling around the search tree.

use std::fmt::Write as _;
use std::io::Write as _;

use instant::Instant;
use log::{error, info, warn};
use rustc_hash::FxHashSet;
use tribute_sim::cards::find_instant_move;
use tribute_sim::prelude::*;

use crate::predictor::ValuePredictor;
use crate::settings::Settings;
use crate::tree::{SearchCtx, SearchTree};
use crate::SearchError;

/// A complete agent instance: owns its tree, randomness and card
/// classifications, so multiple instances can run side by side.
pub struct MctsBot<P: GameTransition> {
    pub(crate) instance_name: String,
    pub(crate) settings: Settings,
    pub(crate) port: P,
    pub(crate) tree: SearchTree,
    pub(crate) rng: RngState,
    pub(crate) categories: CardCategories,
    pub(crate) predictor: Option<Box<dyn ValuePredictor>>,
}

impl<P: GameTransition> MctsBot<P> {
    pub fn new(instance_name: impl Into<String>, port: P, settings: Settings) -> Self {
        Self::with_rng(instance_name, port, settings, RngState::from_entropy())
    }

    /// Fixed-seed construction; with a deterministic port the whole search
    /// becomes reproducible.
    pub fn seeded(
        instance_name: impl Into<String>,
        port: P,
        settings: Settings,
        seed: u64,
    ) -> Self {
        Self::with_rng(instance_name, port, settings, RngState::seeded(seed))
    }

    fn with_rng(
        instance_name: impl Into<String>,
        port: P,
        settings: Settings,
        rng: RngState,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            settings,
            port,
            tree: SearchTree::new(),
            rng,
            categories: CardCategories::default(),
            predictor: None,
        }
    }

    pub fn set_predictor(&mut self, predictor: Box<dyn ValuePredictor>) {
        self.predictor = Some(predictor);
    }

    /// Classifies the card pool in play and drops any tree carried over from
    /// a previous game.
    pub fn pregame_prepare<'a>(&mut self, card_pool: impl IntoIterator<Item = &'a Card>) {
        self.categories = CardCategories::categorize(card_pool);
        self.tree.clear();
    }

    pub fn game_end(&self, end_state: &EndGameState, final_state: Option<&GameStateSnapshot>) {
        info!(
            "{}: game over, winner {:?} ({})",
            self.instance_name, end_state.winner, end_state.reason
        );
        if let Some(state) = final_state {
            info!("{}: patrons were {:?}", self.instance_name, state.patrons);
        }
    }

    /// Uniform pick from the draft options. Patron drafting happens before
    /// any tree exists, so there is nothing to search over yet.
    pub fn select_patron(&mut self, available: &[PatronId]) -> Option<PatronId> {
        if available.is_empty() {
            return None;
        }
        Some(available[self.rng.index_below(available.len())])
    }

    /// Computes a move within the remaining time budget. Never errors out:
    /// search failures are logged and degrade to the first legal move.
    /// Returns `None` only when `legal_moves` is empty.
    pub fn play(
        &mut self,
        state: &GameStateSnapshot,
        legal_moves: &[Move],
        remaining_ms: f64,
    ) -> Option<Move> {
        if legal_moves.is_empty() {
            warn!("{}: asked to move with no legal moves", self.instance_name);
            return None;
        }
        match self.try_play(state, legal_moves, remaining_ms) {
            Ok(mv) => Some(mv),
            Err(err) => {
                self.log_error(&err, state);
                Some(legal_moves[0].clone())
            }
        }
    }

    fn try_play(
        &mut self,
        state: &GameStateSnapshot,
        legal_moves: &[Move],
        remaining_ms: f64,
    ) -> Result<Move, SearchError> {
        if self.settings.apply_instant_moves {
            if let Some(instant_mv) = find_instant_move(legal_moves, &self.categories) {
                return Ok(instant_mv.clone());
            }
        }
        if legal_moves.len() == 1 {
            return Ok(legal_moves[0].clone());
        }

        let Self {
            tree,
            settings,
            port,
            rng,
            categories,
            predictor,
            ..
        } = self;
        let mut ctx = SearchCtx {
            port: &*port,
            settings,
            categories,
            predictor: predictor.as_deref(),
            rng,
        };

        let root = tree.find_or_build(&mut ctx, state.clone(), legal_moves.to_vec());

        let timer = Instant::now();
        let estimated =
            estimate_remaining_moves(ctx.port, ctx.categories, state, legal_moves).max(1);
        let slice_ms = remaining_ms / estimated as f64
            - ctx.settings.iteration_completion_ms_buffer;

        while (timer.elapsed().as_secs_f64() * 1000.0) < slice_ms {
            let mut visited: FxHashSet<_> = FxHashSet::default();
            tree.visit(&mut ctx, root, &mut visited)?;
        }

        if tree.node(root)?.children.is_empty() {
            // Too little budget to expand anything; avoid passing the turn
            // if any other move exists.
            let fallback = legal_moves
                .iter()
                .find(|m| !m.is_end_turn())
                .unwrap_or(&legal_moves[0]);
            return Ok(fallback.clone());
        }

        let (best_move, _) = tree
            .best_child(root)?
            .ok_or(SearchError::NoLegalMoves)?;

        // The root may be a reused node whose cards carry different instance
        // numbers than the official state, so the recommendation has to be
        // mapped back onto the supplied move list.
        legal_moves
            .iter()
            .find(|m| m.is_identical(&best_move))
            .cloned()
            .ok_or(SearchError::OfficialMoveNotFound)
    }

    fn log_error(&self, err: &SearchError, state: &GameStateSnapshot) {
        error!(
            "{}: move computation failed, playing fallback move: {err}",
            self.instance_name
        );
        let mut message = String::new();
        let _ = writeln!(message, "move computation failed: {err}");
        let _ = writeln!(message, "settings were:\n{}", self.settings);
        let _ = writeln!(message, "state was:\n{state:#?}");
        if let Err(io_err) = self.save_error_log(&message) {
            error!("{}: could not write error log: {io_err}", self.instance_name);
        }
    }

    fn save_error_log(&self, message: &str) -> std::io::Result<()> {
        let path = format!("{}_error.log", self.instance_name);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "\n{message}")
    }
}

/// Walks forward through the turn to estimate how many real decisions are
/// left, so the remaining time can be split between them. Instant moves and
/// forced single moves are played through without counting; only genuine
/// choice points cost a decision.
fn estimate_remaining_moves(
    port: &dyn GameTransition,
    categories: &CardCategories,
    state: &GameStateSnapshot,
    legal_moves: &[Move],
) -> u32 {
    let mut moves = legal_moves.to_vec();
    if moves.len() == 1 && moves[0].is_end_turn() {
        return 0;
    }
    moves.retain(|m| !m.is_end_turn());

    let mut result = 1u32;
    let mut state = state.clone();
    while !moves.is_empty() {
        let mv = if let Some(instant_mv) = find_instant_move(&moves, categories) {
            instant_mv.clone()
        } else if moves.len() == 1 {
            moves[0].clone()
        } else {
            result += 1;
            moves[0].clone()
        };
        let outcome = port.apply(&state, &mv, None);
        state = outcome.state;
        moves = outcome.legal_moves;
        moves.retain(|m| !m.is_end_turn());
        if state.is_terminal() {
            break;
        }
    }
    result
}
