//! Legal-move reduction applied before a node stores its move list.
//!
//! The engine reports moves per physical card copy and enumerates every
//! subset at choice points, which blows up the branching factor far past
//! what a time-boxed search can cover. Filtering first collapses
//! semantically identical moves, then applies domain pruning (forced
//! bewilderment/gold picks, play-before-buy sequencing) and finally caps
//! wide choice points to the configured branch limit using card rankings.

use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashSet;
use tribute_sim::prelude::*;
use tribute_sim::smallvec::SmallVec;

use crate::heuristics::rank_cards;
use crate::settings::Settings;

/// Lazily built best-to-worst rankings for the zones branch limiting draws
/// from. Cached per node; must be invalidated whenever instant moves change
/// the underlying state.
#[derive(Debug, Default)]
pub struct RankingCaches {
    hand: Option<Vec<Card>>,
    played: Option<Vec<Card>>,
    tavern: Option<Vec<Card>>,
}

impl RankingCaches {
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    fn hand(&mut self, state: &GameStateSnapshot) -> &[Card] {
        self.hand
            .get_or_insert_with(|| rank_cards(state, &state.current.hand))
    }

    fn played(&mut self, state: &GameStateSnapshot) -> &[Card] {
        self.played
            .get_or_insert_with(|| rank_cards(state, &state.current.played))
    }

    fn tavern(&mut self, state: &GameStateSnapshot) -> &[Card] {
        self.tavern
            .get_or_insert_with(|| rank_cards(state, &state.tavern))
    }
}

/// Full filtering pipeline. The result is deduplicated, pruned and capped;
/// it is never empty when the input was non-empty, except through the
/// engine-guaranteed invariant that choice moves always include a legal pick.
pub fn filter_moves(
    moves: Vec<Move>,
    state: &GameStateSnapshot,
    settings: &Settings,
    caches: &mut RankingCaches,
    rng: &mut RngState,
) -> Vec<Move> {
    let mut moves = dedup_moves(moves);

    match state.board_mode {
        BoardMode::Normal => {
            // Playing out the hand before buying or calling patrons prunes
            // move orderings that only differ in interleaving.
            if moves.iter().any(|m| matches!(m, Move::PlayCard(_))) {
                moves.retain(|m| matches!(m, Move::PlayCard(_)));
            }
        }
        BoardMode::ChoicePending => {
            if let Some(choice) = state.pending_choice {
                match choice.kind {
                    ChoiceKind::DestroyCards | ChoiceKind::CompleteTreasury => {
                        prune_filler_choices(&mut moves, hand_and_played(state));
                    }
                    ChoiceKind::DiscardCards => {
                        prune_filler_choices(&mut moves, state.current.hand.iter());
                    }
                    _ => {}
                }
            }
        }
        BoardMode::StartOfTurnChoicePending => {
            if let Some(choice) = state.pending_choice {
                match choice.kind {
                    ChoiceKind::DiscardCards => {
                        prune_filler_choices(&mut moves, hand_and_played(state));
                    }
                    kind => warn!("unexpected start-of-turn choice kind {kind:?}"),
                }
            }
        }
        BoardMode::PatronChoicePending => {
            prune_filler_choices(&mut moves, hand_and_played(state));
        }
    }

    if let Some(limit) = settings.choice_branch_limit {
        if moves.len() > limit {
            limit_branches(&mut moves, state, limit, caches, rng);
        }
    }

    dedup_moves(moves)
}

fn hand_and_played(state: &GameStateSnapshot) -> impl Iterator<Item = &Card> {
    state.current.played.iter().chain(state.current.hand.iter())
}

/// Bewilderment removal is always right and gold removal almost always is,
/// so when a destroy or discard choice can take them, every move that does
/// not is pruned.
fn prune_filler_choices<'a>(moves: &mut Vec<Move>, pool: impl Iterator<Item = &'a Card>) {
    let max_amount = moves
        .iter()
        .map(|m| m.chosen_cards().len())
        .max()
        .unwrap_or(0);

    let mut bewilderments = 0usize;
    let mut gold = 0usize;
    for card in pool {
        if card.id == CardId::BEWILDERMENT {
            bewilderments += 1;
        } else if card.id == CardId::GOLD {
            gold += 1;
        }
    }

    if bewilderments > 0 {
        if bewilderments >= max_amount {
            moves.retain(|m| m.chosen_cards().iter().all(|c| c.id == CardId::BEWILDERMENT));
        } else {
            moves.retain(|m| m.chosen_cards().iter().any(|c| c.id == CardId::BEWILDERMENT));
        }
    }

    if max_amount.saturating_sub(bewilderments) > 0 && gold > 0 {
        moves.retain(|m| m.chosen_cards().iter().any(|c| c.id == CardId::GOLD));
    }
}

fn limit_branches(
    moves: &mut Vec<Move>,
    state: &GameStateSnapshot,
    limit: usize,
    caches: &mut RankingCaches,
    rng: &mut RngState,
) {
    let Some(choice) = state.pending_choice else {
        // Normal-mode move lists are left uncapped: wide hands are exactly
        // where the search should spend its visits.
        return;
    };

    match (state.board_mode, choice.kind) {
        (BoardMode::ChoicePending, ChoiceKind::AcquireCards) => {
            // Acquire picks at most one card. Keep the strongest affordable
            // tavern cards plus the option to take nothing.
            let max_price = moves
                .iter()
                .filter_map(|m| m.chosen_cards().first())
                .map(|c| c.cost)
                .max()
                .unwrap_or(0);
            let allowed: Vec<CardId> = caches
                .tavern(state)
                .iter()
                .filter(|c| c.cost <= max_price)
                .take(limit.saturating_sub(1))
                .map(|c| c.id)
                .collect();
            moves.retain(|m| match m.chosen_cards().first() {
                None => true,
                Some(card) => allowed.contains(&card.id),
            });
        }
        (BoardMode::ChoicePending, ChoiceKind::DestroyCards) => {
            let max_amount = moves
                .iter()
                .map(|m| m.chosen_cards().len())
                .max()
                .unwrap_or(0);
            // Destroying from hand is excluded: playing the card first is
            // almost always better, so ranking only covers the played pile.
            let ranked = caches.played(state).to_vec();
            if max_amount <= 1 {
                keep_worst_single_choices(moves, &ranked, limit.saturating_sub(1), true);
            } else {
                keep_worst_pair_choices(moves, &ranked, limit);
            }
        }
        (BoardMode::ChoicePending, ChoiceKind::DiscardCards) => {
            let ranked = caches.hand(state).to_vec();
            keep_worst_single_choices(moves, &ranked, limit, false);
        }
        (BoardMode::ChoicePending, ChoiceKind::KnockoutAgents) => {
            // Leaving enemy agents standing is a purely theoretical play;
            // only full knockouts are worth visits.
            let allowed_amount = moves
                .iter()
                .map(|m| m.chosen_cards().len())
                .max()
                .unwrap_or(0);
            let knockout_count = state.opponent.agents.len().min(allowed_amount);
            moves.retain(|m| m.chosen_cards().len() == knockout_count);
        }
        (BoardMode::ChoicePending, ChoiceKind::CompleteTreasury)
        | (BoardMode::PatronChoicePending, _) => {
            // Treasury completion is a single destroy from the played pile.
            let ranked = caches.played(state).to_vec();
            keep_worst_single_choices(moves, &ranked, limit.saturating_sub(1), true);
        }
        (BoardMode::ChoicePending, ChoiceKind::ReplaceCardsInTavern) => {
            // No good ranking heuristic for replacements, sample instead.
            let mut indexes: FxHashSet<usize> = FxHashSet::default();
            while indexes.len() < limit {
                indexes.insert(rng.index_below(moves.len()));
            }
            let mut index = 0usize;
            moves.retain(|_| {
                let keep = indexes.contains(&index);
                index += 1;
                keep
            });
        }
        (BoardMode::ChoicePending, ChoiceKind::RefreshCards | ChoiceKind::TossCards) => {}
        (BoardMode::StartOfTurnChoicePending, ChoiceKind::DiscardCards) => {
            let ranked = caches.hand(state).to_vec();
            keep_worst_single_choices(moves, &ranked, limit, false);
        }
        (mode, kind) => warn!("branch limit exceeded at unranked choice point {mode:?}/{kind:?}"),
    }
}

/// Keeps single-card choices over the `count` worst cards of `ranked`
/// (best-to-worst), optionally together with the empty choice.
fn keep_worst_single_choices(moves: &mut Vec<Move>, ranked: &[Card], count: usize, keep_empty: bool) {
    let worst_start = ranked.len().saturating_sub(count);
    let worst = &ranked[worst_start..];
    moves.retain(|m| match m.chosen_cards().first() {
        None => keep_empty,
        Some(card) => worst.iter().any(|c| c.id == card.id),
    });
}

/// Keeps the pair choices built from the worst-ranked cards, ordered by how
/// expendable the pair is as a whole, plus any empty or single-card choice.
fn keep_worst_pair_choices(moves: &mut Vec<Move>, ranked: &[Card], limit: usize) {
    let worst_first: Vec<CardId> = ranked.iter().rev().map(|c| c.id).collect();
    let mut pairs: Vec<(usize, usize)> = (0..worst_first.len()).tuple_combinations().collect();
    pairs.sort_by_key(|&(a, b)| (a + b, b));

    let allowed: Vec<SmallVec<[CardId; 2]>> = pairs
        .into_iter()
        .take(limit.saturating_sub(1))
        .map(|(a, b)| {
            let mut ids: SmallVec<[CardId; 2]> = SmallVec::new();
            ids.push(worst_first[a]);
            ids.push(worst_first[b]);
            ids.sort_unstable();
            ids
        })
        .collect();

    moves.retain(|m| {
        let chosen = m.chosen_cards();
        if chosen.len() < 2 {
            return true;
        }
        let mut ids: SmallVec<[CardId; 2]> = chosen.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        allowed.contains(&ids)
    });
}
