use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Card, CardId, Effect, PatronId};

/// A legal move as supplied by the rules engine. Card-carrying variants hold
/// the full serialized card so the search can classify and rank them without
/// a database lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    PlayCard(Card),
    ActivateAgent(Card),
    BuyCard(Card),
    Attack(Card),
    CallPatron(PatronId),
    /// Resolve a pending choice by picking zero or more cards.
    MakeCardChoice(SmallVec<[Card; 2]>),
    /// Resolve a pending choice between card effects.
    MakeEffectChoice(Effect),
    EndTurn,
}

impl Move {
    #[inline]
    pub fn is_end_turn(&self) -> bool {
        matches!(self, Move::EndTurn)
    }

    /// Semantic equality: the engine reports moves on distinct physical
    /// copies of the same card as distinct moves, but for search purposes
    /// they are the same decision.
    pub fn is_identical(&self, other: &Move) -> bool {
        match (self, other) {
            (Move::PlayCard(a), Move::PlayCard(b))
            | (Move::ActivateAgent(a), Move::ActivateAgent(b))
            | (Move::BuyCard(a), Move::BuyCard(b))
            | (Move::Attack(a), Move::Attack(b)) => a.is_identical(b),
            (Move::CallPatron(a), Move::CallPatron(b)) => a == b,
            (Move::MakeCardChoice(a), Move::MakeCardChoice(b)) => {
                choice_ids(a) == choice_ids(b)
            }
            (Move::MakeEffectChoice(a), Move::MakeEffectChoice(b)) => a == b,
            (Move::EndTurn, Move::EndTurn) => true,
            _ => false,
        }
    }

    /// The cards chosen by a choice move, empty for everything else.
    pub fn chosen_cards(&self) -> &[Card] {
        match self {
            Move::MakeCardChoice(cards) => cards,
            _ => &[],
        }
    }

    /// The card this move acts on, if any.
    pub fn card(&self) -> Option<&Card> {
        match self {
            Move::PlayCard(c) | Move::ActivateAgent(c) | Move::BuyCard(c) | Move::Attack(c) => {
                Some(c)
            }
            _ => None,
        }
    }
}

/// Chosen card ids as a sorted multiset key.
fn choice_ids(cards: &[Card]) -> SmallVec<[CardId; 2]> {
    let mut ids: SmallVec<[CardId; 2]> = cards.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    ids
}

/// Removes moves that are semantically identical to an earlier move in the
/// list, keeping the first representative of each equivalence class.
pub fn dedup_moves(moves: Vec<Move>) -> Vec<Move> {
    let mut result: Vec<Move> = Vec::with_capacity(moves.len());
    for mv in moves {
        if !result.iter().any(|m| m.is_identical(&mv)) {
            result.push(mv);
        }
    }
    result
}
