use serde::{Deserialize, Serialize};
use tribute_sim::prelude::*;

use super::{agent_strengths, deck_strengths, patron_ratios, CardStrengths};

/// Number of entries [`GameFeatures::to_vector`] produces.
pub const FEATURE_COUNT: usize = 23;

/// Position summary fed to evaluators. Built for end-of-turn states, so hand
/// strength, coins and unspent patron calls are deliberately absent.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFeatures {
    /// The four drafted patrons in sorted order, so a Hlaalu+Rajhin game and
    /// a Rajhin+Hlaalu game produce the same features.
    pub patron_slots: [u8; 4],
    pub current_prestige: f64,
    pub current_deck: CardStrengths,
    /// Fraction of the deck that can participate in combos at all.
    pub current_combo_proportion: f64,
    pub current_agents: CardStrengths,
    pub current_patron_favor: u8,
    pub opponent_prestige: f64,
    pub opponent_deck: CardStrengths,
    pub opponent_agents: CardStrengths,
    pub opponent_patron_favor: u8,
}

impl GameFeatures {
    pub fn extract(state: &GameStateSnapshot) -> Self {
        let mut patron_slots = [0u8; 4];
        for (slot, patron) in state
            .patrons
            .iter()
            .filter(|&p| p != PatronId::Treasury)
            .take(4)
            .enumerate()
        {
            patron_slots[slot] = patron as u8;
        }

        // Features describe an end-of-turn state. Unspent power converts to
        // prestige at turn end unless a taunt agent would absorb it first.
        let mut current_prestige = state.current.prestige as f64;
        if state.opponent.agents.iter().all(|a| !a.card.taunt) {
            current_prestige += state.current.power as f64;
        }

        let current_full = state.current.full_deck(true);
        let current_ratios = patron_ratios(&current_full, state.patrons);
        let current_deck = deck_strengths(&current_full, &current_ratios);
        let combo_capable = current_full
            .iter()
            .filter(|c| c.deck != PatronId::Treasury)
            .count();
        let current_combo_proportion = if current_full.is_empty() {
            0.0
        } else {
            combo_capable as f64 / current_full.len() as f64
        };
        let current_agents = agent_strengths(&state.current.agents, &current_ratios);

        // The opponent's hand is hidden, their deck view excludes it.
        let opponent_full = state.opponent.full_deck(false);
        let opponent_ratios = patron_ratios(&opponent_full, state.patrons);
        let opponent_deck = deck_strengths(&opponent_full, &opponent_ratios);
        let opponent_agents = agent_strengths(&state.opponent.agents, &opponent_ratios);

        Self {
            patron_slots,
            current_prestige,
            current_deck,
            current_combo_proportion,
            current_agents,
            current_patron_favor: state.patron_favor_count(state.current.player) as u8,
            opponent_prestige: state.opponent.prestige as f64,
            opponent_deck,
            opponent_agents,
            opponent_patron_favor: state.patron_favor_count(state.opponent.player) as u8,
        }
    }

    /// Flattens the features into the fixed column order regression models
    /// were trained on. Agent prestige strength is folded into taunt handling
    /// upstream and is not a column of its own.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.patron_slots[0] as f64,
            self.patron_slots[1] as f64,
            self.patron_slots[2] as f64,
            self.patron_slots[3] as f64,
            self.current_prestige,
            self.current_deck.prestige,
            self.current_deck.power,
            self.current_deck.gold,
            self.current_deck.misc,
            self.current_combo_proportion,
            self.current_agents.power,
            self.current_agents.gold,
            self.current_agents.misc,
            self.current_patron_favor as f64,
            self.opponent_prestige,
            self.opponent_deck.prestige,
            self.opponent_deck.power,
            self.opponent_deck.gold,
            self.opponent_deck.misc,
            self.opponent_agents.power,
            self.opponent_agents.gold,
            self.opponent_agents.misc,
            self.opponent_patron_favor as f64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn patron_slots_are_order_independent() {
        let a = GameFeatures::extract(&GameStateSnapshot::new(
            PatronId::Hlaalu | PatronId::Rajhin | PatronId::Pelin | PatronId::Ansei | PatronId::Treasury,
        ));
        let b = GameFeatures::extract(&GameStateSnapshot::new(
            PatronId::Ansei | PatronId::Pelin | PatronId::Hlaalu | PatronId::Rajhin | PatronId::Treasury,
        ));
        assert_eq!(a.patron_slots, b.patron_slots);
    }

    #[test]
    fn unspent_power_counts_as_prestige_without_taunt_in_the_way() {
        let mut state = testing::two_player_state();
        state.current.prestige = 10;
        state.current.power = 4;
        let open = GameFeatures::extract(&state);
        assert_eq!(open.current_prestige, 14.0);

        state.opponent.agents.push(testing::taunt_agent(90, 3));
        let blocked = GameFeatures::extract(&state);
        assert_eq!(blocked.current_prestige, 10.0);
    }

    #[test]
    fn combo_proportion_excludes_treasury_cards() {
        let mut state = testing::two_player_state();
        state.current.hand = vec![
            testing::coin_card(1, PatronId::Treasury),
            testing::coin_card(2, PatronId::Pelin),
            testing::coin_card(3, PatronId::Pelin),
            testing::coin_card(4, PatronId::Pelin),
        ];
        state.current.draw_pile.clear();
        state.current.played.clear();
        state.current.cooldown.clear();
        let features = GameFeatures::extract(&state);
        assert!((features.current_combo_proportion - 0.75).abs() < 1e-9);
    }

    #[test]
    fn vector_has_the_fixed_width() {
        let features = GameFeatures::extract(&testing::two_player_state());
        assert_eq!(features.to_vector().len(), FEATURE_COUNT);
    }
}
