//! Search tree arena and visit logic.
//!
//! Nodes live in a flat arena indexed by [`NodeId`] and are shared through a
//! transposition table keyed by structural state hash, so the "tree" is
//! really a DAG: identical positions reached through different move orders
//! resolve to one node and pool their visit statistics. A node therefore has
//! no fixed parent, and selection passes the parent's visit count in from the
//! caller.

mod rollout;

use log::error;
use rustc_hash::{FxHashMap, FxHashSet};
use tribute_sim::cards::find_instant_move;
use tribute_sim::prelude::*;
use tribute_sim::smallvec::SmallVec;

use crate::filter::{filter_moves, RankingCaches};
use crate::heuristics::{check_winner, heuristic_score, GameFeatures};
use crate::predictor::ValuePredictor;
use crate::settings::{ScoringMethod, Settings};
use crate::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything a visit needs besides the tree itself. Borrowed per call so the
/// tree and the bot's mutable randomness can coexist.
pub(crate) struct SearchCtx<'a> {
    pub port: &'a dyn GameTransition,
    pub settings: &'a Settings,
    pub categories: &'a CardCategories,
    pub predictor: Option<&'a dyn ValuePredictor>,
    pub rng: &'a mut RngState,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Decision,
    /// Holds the pre-move state and the stochastic move; every visit
    /// resamples the move with a fresh seed, so outcome frequencies in the
    /// statistics approach the true outcome distribution.
    Chance { applied_move: Move },
    /// Values its (pre-end-turn) state as if the turn ended, without
    /// simulating the end-turn card draws into the next turn.
    TurnEnd,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub state: GameStateSnapshot,
    /// Filtered moves; expansion is complete once `children` covers them.
    pub moves: Vec<Move>,
    pub children: Vec<(Move, NodeId)>,
    pub visit_count: u32,
    pub total_score: f64,
    pub state_hash: HashValue,
}

impl Node {
    #[inline]
    pub fn acting_player(&self) -> PlayerId {
        self.state.current.player
    }

    #[inline]
    pub fn mean_score(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_score / self.visit_count as f64
        }
    }

    /// Selection priority from the perspective of a parent with
    /// `parent_visits` visits. Unvisited nodes sort first.
    fn confidence(&self, parent_visits: u32, settings: &Settings) -> f64 {
        if self.visit_count == 0 {
            return f64::INFINITY;
        }
        let visits = self.visit_count as f64;
        match settings.selection_method {
            crate::settings::SelectionMethod::Uct => {
                let exploitation = self.total_score / visits;
                let exploration = settings.uct_exploration_constant
                    * ((parent_visits.max(1) as f64).ln() / visits).sqrt();
                exploitation + exploration
            }
            crate::settings::SelectionMethod::Custom => self.total_score - visits,
        }
    }
}

#[derive(Default)]
pub struct SearchTree {
    nodes: Vec<Node>,
    /// Hash buckets over decision nodes. Collisions are resolved by full
    /// semantic comparison, so a bucket rarely holds more than one node.
    table: FxHashMap<HashValue, SmallVec<[NodeId; 2]>>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.table.clear();
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, SearchError> {
        self.nodes.get(id.index()).ok_or(SearchError::NodeMissing(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SearchError> {
        self.nodes.get_mut(id.index()).ok_or(SearchError::NodeMissing(id.0))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn push_turn_end(&mut self, state: &GameStateSnapshot) -> NodeId {
        self.push(Node {
            kind: NodeKind::TurnEnd,
            state: state.clone(),
            moves: Vec::new(),
            children: Vec::new(),
            visit_count: 0,
            total_score: 0.0,
            state_hash: state.state_hash(),
        })
    }

    fn push_chance(&mut self, state: &GameStateSnapshot, applied_move: Move) -> NodeId {
        self.push(Node {
            kind: NodeKind::Chance { applied_move },
            state: state.clone(),
            moves: Vec::new(),
            children: Vec::new(),
            visit_count: 0,
            total_score: 0.0,
            state_hash: state.state_hash(),
        })
    }

    /// Returns the existing node for a semantically identical position, or
    /// builds and registers a fresh one. Instant moves are resolved and the
    /// move list filtered before hashing, so positions that only differ in
    /// pending forced moves still unify.
    pub(crate) fn find_or_build(
        &mut self,
        ctx: &mut SearchCtx<'_>,
        state: GameStateSnapshot,
        legal_moves: Vec<Move>,
    ) -> NodeId {
        let (state, moves) = resolve_position(ctx, state, legal_moves);
        let hash = state.state_hash();

        if ctx.settings.reuse_tree {
            if let Some(bucket) = self.table.get(&hash) {
                let matches: SmallVec<[NodeId; 2]> = bucket
                    .iter()
                    .copied()
                    .filter(|&id| self.nodes[id.index()].state.is_identical(&state))
                    .collect();
                if matches.len() > 1 {
                    error!(
                        "transposition bucket {hash:#018x} holds {} identical states, using the first",
                        matches.len()
                    );
                }
                if let Some(&id) = matches.first() {
                    return id;
                }
            }
        }

        let id = self.push(Node {
            kind: NodeKind::Decision,
            state,
            moves,
            children: Vec::new(),
            visit_count: 0,
            total_score: 0.0,
            state_hash: hash,
        });
        if ctx.settings.reuse_tree {
            self.table.entry(hash).or_default().push(id);
        }
        id
    }

    /// One MCTS iteration from `id` downward. Returns the score from the
    /// perspective of the node's acting player; the caller flips it when its
    /// own acting player differs.
    ///
    /// `visited` guards against cycles: transposition reuse means a path can
    /// revisit a node (positions can repeat within a turn), in which case the
    /// node is scored in place instead of descending further.
    pub(crate) fn visit(
        &mut self,
        ctx: &mut SearchCtx<'_>,
        id: NodeId,
        visited: &mut FxHashSet<NodeId>,
    ) -> Result<f64, SearchError> {
        if !visited.insert(id) {
            let score = self.score_node(ctx, id)?;
            self.record(id, score)?;
            return Ok(score);
        }

        let (kind, state, player, visit_count, expanded, move_count) = {
            let node = self.node(id)?;
            (
                node.kind.clone(),
                node.state.clone(),
                node.acting_player(),
                node.visit_count,
                node.children.len(),
                node.moves.len(),
            )
        };

        let score = match kind {
            NodeKind::Chance { applied_move } => {
                let seed = ctx.rng.next_seed();
                let outcome = ctx.port.apply(&state, &applied_move, Some(seed));
                let child = self.find_or_build(ctx, outcome.state, outcome.legal_moves);
                let sampled = self.visit(ctx, child, visited)?;
                if self.node(child)?.acting_player() != player {
                    -sampled
                } else {
                    sampled
                }
            }
            NodeKind::TurnEnd => end_of_turn_score(ctx, &state),
            NodeKind::Decision => {
                if state.is_terminal() {
                    terminal_score(&state)
                } else if visit_count == 0 {
                    // Lazy first visit: score in place, expand later. Saves
                    // the full child construction on nodes the selection
                    // policy never returns to.
                    self.score_node(ctx, id)?
                } else if expanded < move_count {
                    let child = self.expand(ctx, id)?;
                    self.visit(ctx, child, visited)?
                } else {
                    let child = self.select(ctx.settings, id)?;
                    let below = self.visit(ctx, child, visited)?;
                    if self.node(child)?.acting_player() != player {
                        -below
                    } else {
                        below
                    }
                }
            }
        };

        self.record(id, score)?;
        Ok(score)
    }

    fn record(&mut self, id: NodeId, score: f64) -> Result<(), SearchError> {
        let node = self.node_mut(id)?;
        node.total_score += score;
        node.visit_count += 1;
        Ok(())
    }

    /// Materializes the next unexpanded move as a child and returns it.
    pub(crate) fn expand(
        &mut self,
        ctx: &mut SearchCtx<'_>,
        id: NodeId,
    ) -> Result<NodeId, SearchError> {
        let (parent_state, moves, existing): (GameStateSnapshot, Vec<Move>, Vec<Move>) = {
            let node = self.node(id)?;
            (
                node.state.clone(),
                node.moves.clone(),
                node.children.iter().map(|(m, _)| m.clone()).collect(),
            )
        };

        for mv in moves {
            if existing.iter().any(|m| m.is_identical(&mv)) {
                continue;
            }

            let child = if !ctx.settings.simulate_multiple_turns && mv.is_end_turn() {
                self.push_turn_end(&parent_state)
            } else if (ctx.settings.include_play_move_chance_nodes
                && ctx.categories.is_stochastic_move(&mv))
                || (ctx.settings.include_end_turn_chance_nodes && mv.is_end_turn())
            {
                self.push_chance(&parent_state, mv.clone())
            } else {
                let seed = ctx.rng.next_seed();
                let outcome = ctx.port.apply(&parent_state, &mv, Some(seed));
                let built = self.find_or_build(ctx, outcome.state, outcome.legal_moves);
                let forced_end = {
                    let b = self.node(built)?;
                    !ctx.settings.simulate_multiple_turns
                        && matches!(b.kind, NodeKind::Decision)
                        && b.moves.len() == 1
                        && b.moves[0].is_end_turn()
                };
                if forced_end {
                    // The move leads straight into a forced end of turn;
                    // value it as a turn end of the position before the draw.
                    self.push_turn_end(&parent_state)
                } else {
                    built
                }
            };

            self.node_mut(id)?.children.push((mv, child));
            return Ok(child);
        }

        Err(SearchError::FullyExpanded)
    }

    fn select(&self, settings: &Settings, id: NodeId) -> Result<NodeId, SearchError> {
        let node = self.node(id)?;
        let parent_visits = node.visit_count;
        let mut best: Option<NodeId> = None;
        let mut best_confidence = f64::NEG_INFINITY;
        for &(_, child_id) in &node.children {
            let confidence = self.node(child_id)?.confidence(parent_visits, settings);
            if confidence > best_confidence {
                best_confidence = confidence;
                best = Some(child_id);
            }
        }
        best.ok_or(SearchError::NoLegalMoves)
    }

    /// Highest-mean child, the move recommendation after the budget runs out.
    pub(crate) fn best_child(&self, id: NodeId) -> Result<Option<(Move, NodeId)>, SearchError> {
        let node = self.node(id)?;
        let mut best: Option<(Move, NodeId)> = None;
        let mut best_mean = f64::NEG_INFINITY;
        for (mv, child_id) in &node.children {
            let mean = self.node(*child_id)?.mean_score();
            if mean > best_mean {
                best_mean = mean;
                best = Some((mv.clone(), *child_id));
            }
        }
        Ok(best)
    }

    fn score_node(&mut self, ctx: &mut SearchCtx<'_>, id: NodeId) -> Result<f64, SearchError> {
        let (state, moves, kind) = {
            let node = self.node(id)?;
            (node.state.clone(), node.moves.clone(), node.kind.clone())
        };
        if state.is_terminal() {
            return Ok(terminal_score(&state));
        }
        if matches!(kind, NodeKind::TurnEnd) {
            return Ok(end_of_turn_score(ctx, &state));
        }
        Ok(match ctx.settings.scoring_method {
            ScoringMethod::Rollout => rollout::rollout(ctx, &state, &moves),
            ScoringMethod::Heuristic => {
                heuristic_score(&state, !ctx.settings.simulate_multiple_turns)
            }
            ScoringMethod::RolloutTurnsThenHeuristic => rollout::rollout_turns_then_heuristic(
                ctx,
                &state,
                &moves,
                ctx.settings.rollout_turns_before_heuristic,
            ),
            ScoringMethod::ModelScoring => model_score(ctx, &state),
        })
    }
}

/// Win/loss/draw from the acting player's perspective.
fn terminal_score(state: &GameStateSnapshot) -> f64 {
    match state.end_state.as_ref().and_then(|e| e.winner) {
        Some(winner) if winner == state.current.player => 1.0,
        Some(_) => -1.0,
        None => 0.0,
    }
}

fn model_score(ctx: &mut SearchCtx<'_>, state: &GameStateSnapshot) -> f64 {
    match check_winner(state, true) {
        Some(winner) if winner == state.current.player => 1.0,
        Some(_) => -1.0,
        None => match ctx.predictor {
            Some(predictor) => {
                2.0 * predictor.win_probability(&GameFeatures::extract(state)) - 1.0
            }
            None => heuristic_score(state, true),
        },
    }
}

fn end_of_turn_score(ctx: &mut SearchCtx<'_>, state: &GameStateSnapshot) -> f64 {
    if state.is_terminal() {
        return terminal_score(state);
    }
    if matches!(ctx.settings.scoring_method, ScoringMethod::ModelScoring) {
        model_score(ctx, state)
    } else {
        heuristic_score(state, true)
    }
}

/// Filters the move list and plays out forced instant moves until the
/// position is an actual decision point.
fn resolve_position(
    ctx: &mut SearchCtx<'_>,
    state: GameStateSnapshot,
    legal_moves: Vec<Move>,
) -> (GameStateSnapshot, Vec<Move>) {
    let mut rankings = RankingCaches::default();
    let mut state = state;
    let mut moves = filter_moves(legal_moves, &state, ctx.settings, &mut rankings, ctx.rng);
    if ctx.settings.apply_instant_moves {
        while let Some(mv) = find_instant_move(&moves, ctx.categories).cloned() {
            let seed = ctx.rng.next_seed();
            let outcome = ctx.port.apply(&state, &mv, Some(seed));
            state = outcome.state;
            rankings.invalidate();
            moves = filter_moves(outcome.legal_moves, &state, ctx.settings, &mut rankings, ctx.rng);
        }
    }
    (state, moves)
}
