use rustc_hash::FxHashSet;

use crate::types::{Card, CardId, Move};

/// Card classifications computed once per bot instance from the card pool in
/// play. Owned state rather than a process-global cache so that concurrent
/// bot instances stay isolated.
///
/// Unknown card ids (a pool that did not mention them) fall back to
/// classifying the card's own effect list, which is always available on the
/// serialized card.
#[derive(Debug, Default, Clone)]
pub struct CardCategories {
    stochastic: FxHashSet<CardId>,
    instant_play: FxHashSet<CardId>,
    known: FxHashSet<CardId>,
}

impl CardCategories {
    pub fn categorize<'a>(pool: impl IntoIterator<Item = &'a Card>) -> Self {
        let mut categories = Self::default();
        for card in pool {
            categories.known.insert(card.id);
            if card.has_stochastic_effect() {
                categories.stochastic.insert(card.id);
            }
            if card.is_instant_play() {
                categories.instant_play.insert(card.id);
            }
        }
        categories
    }

    pub fn is_stochastic_card(&self, card: &Card) -> bool {
        if self.known.contains(&card.id) {
            self.stochastic.contains(&card.id)
        } else {
            card.has_stochastic_effect()
        }
    }

    pub fn is_instant_play_card(&self, card: &Card) -> bool {
        if self.known.contains(&card.id) {
            self.instant_play.contains(&card.id)
        } else {
            card.is_instant_play()
        }
    }

    /// A move whose outcome distribution depends on hidden randomness.
    pub fn is_stochastic_move(&self, mv: &Move) -> bool {
        match mv {
            Move::PlayCard(card) | Move::ActivateAgent(card) => self.is_stochastic_card(card),
            _ => false,
        }
    }

    /// A move with no meaningful decision attached: playing or activating a
    /// pure-resource card. Safe to auto-apply without search.
    pub fn is_instant_move(&self, mv: &Move) -> bool {
        match mv {
            Move::PlayCard(card) => !card.is_agent() && self.is_instant_play_card(card),
            Move::ActivateAgent(card) => self.is_instant_play_card(card),
            _ => false,
        }
    }
}

/// First instant move in `moves`, if any.
pub fn find_instant_move<'a>(
    moves: &'a [Move],
    categories: &CardCategories,
) -> Option<&'a Move> {
    moves.iter().find(|m| categories.is_instant_move(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use smallvec::smallvec;

    fn card(id: u16, kind: CardKind, effects: smallvec::SmallVec<[CardEffect; 2]>) -> Card {
        Card {
            id: CardId(id),
            instance: 0,
            kind,
            deck: PatronId::Treasury,
            cost: 0,
            hp: if matches!(kind, CardKind::Agent) { 2 } else { 0 },
            taunt: false,
            effects,
        }
    }

    #[test]
    fn classifies_resource_draw_and_agent_cards() {
        let gold = card(
            0,
            CardKind::Action,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainCoin, 1))],
        );
        let seer = card(
            10,
            CardKind::Action,
            smallvec![CardEffect::Single(Effect::new(EffectKind::Draw, 2))],
        );
        let knight = card(
            11,
            CardKind::Agent,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainPower, 2))],
        );
        let categories = CardCategories::categorize([&gold, &seer, &knight]);

        assert!(categories.is_instant_move(&Move::PlayCard(gold.clone())));
        assert!(!categories.is_stochastic_move(&Move::PlayCard(gold)));

        assert!(categories.is_stochastic_move(&Move::PlayCard(seer.clone())));
        assert!(!categories.is_instant_move(&Move::PlayCard(seer)));

        // Playing an agent puts a body on the board, never instant.
        assert!(!categories.is_instant_move(&Move::PlayCard(knight)));
    }

    #[test]
    fn unknown_ids_fall_back_to_effect_classification() {
        let categories = CardCategories::default();
        let writ = card(
            2,
            CardKind::Action,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainCoin, 2))],
        );
        assert!(categories.is_instant_move(&Move::PlayCard(writ)));
        assert!(!categories.is_instant_move(&Move::EndTurn));
    }

    #[test]
    fn finds_first_instant_move() {
        let gold = card(
            0,
            CardKind::Action,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainCoin, 1))],
        );
        let categories = CardCategories::categorize([&gold]);
        let moves = vec![Move::EndTurn, Move::PlayCard(gold.clone())];
        let found = find_instant_move(&moves, &categories).unwrap();
        assert!(found.is_identical(&Move::PlayCard(gold)));
    }
}
