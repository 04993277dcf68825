use tribute_sim::prelude::*;

use super::GameFeatures;

/// Mean evaluator output over tens of millions of sampled states, used as the
/// neutral point when renormalizing into a zero-sum range.
const AVERAGE_HEURISTIC_SCORE: f64 = 0.485_574_642_9;
/// Same, but sampled over end-of-turn states only.
const AVERAGE_END_OF_TURN_HEURISTIC_SCORE: f64 = 0.350_390_183_180_619_76;

/// Squash rate for mapping the unbounded manual value difference into a
/// win-probability-like (0, 1) range before renormalizing.
const SQUASH_RATE: f64 = 0.1;

const MISCELLANEOUS_MULTIPLIER: f64 = 0.25;
const DECK_MULTIPLIER: f64 = 3.0;
const BASE_PATRON_VALUE: f64 = 1.5;
/// Prestige at which racing to the win threshold dominates deck building.
const LATE_GAME_PRESTIGE: f64 = 40.0;

/// Rule-based win detection, applied before any evaluator so certain wins
/// score exactly. `end_of_turn_exclusive` additionally treats the opponent's
/// prestige lead at 40+ as decided, which only holds when the current player
/// cannot act any further this turn.
pub fn check_winner(state: &GameStateSnapshot, end_of_turn_exclusive: bool) -> Option<PlayerId> {
    let current_prestige = state.current.prestige as i32;
    let opponent_prestige = state.opponent.prestige as i32;

    if current_prestige >= 80 {
        return Some(state.current.player);
    }

    let opponent_taunt = state.opponent.taunt_hp() as i32;
    let power = state.current.power as i32;
    if power - opponent_taunt + current_prestige >= 80 {
        return Some(state.current.player);
    }

    if end_of_turn_exclusive && opponent_prestige >= 40 && opponent_prestige > current_prestige {
        return Some(state.opponent.player);
    }

    if state.patron_favor_count(state.current.player) >= 4 {
        return Some(state.current.player);
    }

    None
}

/// Renormalizes a turn-planning evaluator output in [0, 1] into [-1, 1],
/// anchoring the empirical average at zero. The legacy evaluator scores a
/// single turn in isolation, so its neutral point sits well below 0.5.
pub fn normalize_turn_planning_score(score: f64, end_of_turn_only: bool) -> f64 {
    let average = if end_of_turn_only {
        AVERAGE_END_OF_TURN_HEURISTIC_SCORE
    } else {
        AVERAGE_HEURISTIC_SCORE
    };
    if score < average {
        (score - average) / average
    } else {
        (score - average) / (1.0 - average)
    }
}

/// Hand-weighted value difference between the players. Unbounded, positive
/// when the current player is ahead.
pub fn manual_evaluation(features: &GameFeatures) -> f64 {
    let max_prestige = features.current_prestige.max(features.opponent_prestige);
    let late_game = (max_prestige / LATE_GAME_PRESTIGE).max(0.1);
    let early_game = (1.0 - late_game).max(0.1);

    let current_value = features.current_prestige * late_game
        + deck_value(&features.current_deck, late_game, early_game)
        + agent_value(&features.current_agents, late_game, early_game)
        + BASE_PATRON_VALUE.powi(features.current_patron_favor as i32);
    let opponent_value = features.opponent_prestige * late_game
        + deck_value(&features.opponent_deck, late_game, early_game)
        + agent_value(&features.opponent_agents, late_game, early_game)
        + BASE_PATRON_VALUE.powi(features.opponent_patron_favor as i32);

    current_value - opponent_value
}

fn agent_value(strengths: &super::CardStrengths, late_game: f64, early_game: f64) -> f64 {
    (strengths.prestige + strengths.power) * late_game
        + strengths.gold * early_game
        + strengths.misc * MISCELLANEOUS_MULTIPLIER
}

fn deck_value(strengths: &super::CardStrengths, late_game: f64, early_game: f64) -> f64 {
    // Decks pay off over remaining turns, so their weight fades late.
    agent_value(strengths, late_game, early_game) * DECK_MULTIPLIER * early_game
}

/// Full heuristic pipeline: win shortcuts, manual evaluation, squash into
/// (0, 1), renormalize into [-1, 1] from the current player's perspective.
pub fn heuristic_score(state: &GameStateSnapshot, end_of_turn_only: bool) -> f64 {
    match check_winner(state, end_of_turn_only) {
        Some(winner) if winner == state.current.player => return 1.0,
        Some(_) => return -1.0,
        None => {}
    }
    let features = GameFeatures::extract(state);
    let raw = manual_evaluation(&features);
    let squashed = 1.0 / (1.0 + (-raw * SQUASH_RATE).exp());
    normalize_turn_planning_score(squashed, end_of_turn_only)
}
