//! Playout scoring: uniform random playouts, optionally truncated after a
//! number of completed turns and finished off heuristically.

use tribute_sim::prelude::*;

use super::SearchCtx;
use crate::heuristics::heuristic_score;

/// Random playout to game end. Scores +1/-1 for a win/loss of the player to
/// act at `state`, 0 for a draw. Playouts run on unseeded transitions; their
/// randomness is not part of any reproducible path.
pub(super) fn rollout(ctx: &mut SearchCtx<'_>, state: &GameStateSnapshot, moves: &[Move]) -> f64 {
    let rollout_player = state.current.player;
    let mut state = state.clone();
    let mut moves = moves.to_vec();

    while !state.is_terminal() {
        let Some(mv) = pick_rollout_move(ctx, &moves) else {
            return 0.0;
        };
        let outcome = ctx.port.apply(&state, &mv, None);
        state = outcome.state;
        moves = dedup_moves(outcome.legal_moves);
    }

    match state.end_state.as_ref().and_then(|e| e.winner) {
        Some(winner) if winner == rollout_player => 1.0,
        Some(_) => -1.0,
        None => 0.0,
    }
}

/// Random playout for `turns` completed turns, then a heuristic evaluation
/// of wherever the playout landed, flipped back to the starting player's
/// perspective if the turn count left the opponent to act.
pub(super) fn rollout_turns_then_heuristic(
    ctx: &mut SearchCtx<'_>,
    state: &GameStateSnapshot,
    moves: &[Move],
    turns: u32,
) -> f64 {
    let start_player = state.current.player;
    let mut player = start_player;
    let mut completed = 0u32;
    let mut state = state.clone();
    let mut moves = moves.to_vec();

    while completed < turns && !state.is_terminal() {
        let Some(mv) = pick_rollout_move(ctx, &moves) else {
            break;
        };
        let outcome = ctx.port.apply(&state, &mv, None);
        if outcome.state.current.player != player {
            completed += 1;
            player = outcome.state.current.player;
        }
        state = outcome.state;
        moves = dedup_moves(outcome.legal_moves);
    }

    let score = heuristic_score(&state, true);
    if state.current.player != start_player {
        -score
    } else {
        score
    }
}

/// Uniform random pick, suppressing END_TURN while alternatives exist when
/// configured to. Deduplication guarantees at most one END_TURN, so the
/// retained list is never emptied.
fn pick_rollout_move(ctx: &mut SearchCtx<'_>, moves: &[Move]) -> Option<Move> {
    if moves.is_empty() {
        return None;
    }
    if ctx.settings.force_delay_turn_end_in_rollout && moves.len() > 1 {
        let non_end: Vec<&Move> = moves.iter().filter(|m| !m.is_end_turn()).collect();
        if !non_end.is_empty() {
            let index = ctx.rng.index_below(non_end.len());
            return Some(non_end[index].clone());
        }
    }
    Some(moves[ctx.rng.index_below(moves.len())].clone())
}
