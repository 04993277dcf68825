use std::ops::{Add, AddAssign, Div, Mul};

use enum_map::EnumMap;
use enumset::EnumSet;
use serde::{Deserialize, Serialize};
use tribute_sim::prelude::*;

/// Agents are worth more than the printed effects: they stay on the board.
pub(crate) const BASE_AGENT_STRENGTH_MULTIPLIER: f64 = 1.5;
/// Extra value per hitpoint an agent still has.
pub(crate) const AGENT_HP_VALUE_MULTIPLIER: f64 = 0.1;
/// A choice between two effects is worth part of both, never the sum.
pub(crate) const CHOICE_WEIGHT: f64 = 0.75;
/// Cards drawn at the start of each turn, the basis for combo odds.
const CARDS_DRAWN_PER_TURN: f64 = 5.0;

/// Additive strength components of a card, deck or agent pool.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardStrengths {
    pub prestige: f64,
    pub power: f64,
    pub gold: f64,
    pub misc: f64,
}

impl Add for CardStrengths {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prestige: self.prestige + rhs.prestige,
            power: self.power + rhs.power,
            gold: self.gold + rhs.gold,
            misc: self.misc + rhs.misc,
        }
    }
}

impl AddAssign for CardStrengths {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for CardStrengths {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self {
            prestige: self.prestige * factor,
            power: self.power * factor,
            gold: self.gold * factor,
            misc: self.misc * factor,
        }
    }
}

impl Div<f64> for CardStrengths {
    type Output = Self;

    fn div(self, divisor: f64) -> Self {
        self * (1.0 / divisor)
    }
}

impl CardStrengths {
    /// Single scalar used for ranking cards against each other.
    pub fn rank_value(&self) -> f64 {
        self.prestige + self.power + self.gold + 0.25 * self.misc
    }
}

/// Fraction of the deck belonging to each patron, the basis for combo
/// trigger probabilities.
pub fn patron_ratios(deck: &[&Card], patrons: EnumSet<PatronId>) -> EnumMap<PatronId, f64> {
    let mut counts: EnumMap<PatronId, usize> = EnumMap::default();
    for card in deck {
        counts[card.deck] += 1;
    }
    let mut ratios: EnumMap<PatronId, f64> = EnumMap::default();
    if deck.is_empty() {
        return ratios;
    }
    for patron in patrons {
        ratios[patron] = counts[patron] as f64 / deck.len() as f64;
    }
    ratios
}

/// Probability that a combo-gated effect triggers, approximated from the
/// same-deck proportion and the five cards drawn each turn. Inexact (draws
/// are without replacement) but cheap and monotone in deck composition.
fn combo_probability(combo: u8, patron_ratio: f64) -> f64 {
    let draw_probability = CARDS_DRAWN_PER_TURN * patron_ratio;
    draw_probability.powi(combo as i32)
}

fn effect_strengths(effect: &Effect, patron_ratio: f64) -> CardStrengths {
    let mut result = CardStrengths::default();
    let amount = effect.amount as f64;
    match effect.kind {
        EffectKind::GainCoin => result.gold += amount,
        EffectKind::GainPower => result.power += amount,
        EffectKind::GainPrestige | EffectKind::OppLosePrestige => result.prestige += amount,
        EffectKind::AcquireTavern
        | EffectKind::CreateSacking
        | EffectKind::DestroyCard
        | EffectKind::Draw
        | EffectKind::Heal
        | EffectKind::Knockout
        | EffectKind::OppDiscard
        | EffectKind::PatronCall
        | EffectKind::ReplaceTavern
        | EffectKind::ReturnTop
        | EffectKind::Toss => result.misc += 1.0,
    }
    if effect.combo > 1 {
        result = result * combo_probability(effect.combo, patron_ratio);
    }
    result
}

fn card_effect_strengths(effect: &CardEffect, patron_ratio: f64) -> CardStrengths {
    match effect {
        CardEffect::Single(e) => effect_strengths(e, patron_ratio),
        CardEffect::And(a, b) => {
            effect_strengths(a, patron_ratio) + effect_strengths(b, patron_ratio)
        }
        CardEffect::Choice(a, b) => {
            effect_strengths(a, patron_ratio) * CHOICE_WEIGHT
                + effect_strengths(b, patron_ratio) * CHOICE_WEIGHT
        }
    }
}

/// Strength of a single card given the owner's deck composition.
pub fn card_strengths(card: &Card, patron_ratio: f64) -> CardStrengths {
    let mut result = CardStrengths::default();
    for effect in &card.effects {
        let mut strength = card_effect_strengths(effect, patron_ratio);
        if card.is_agent() {
            strength = strength * BASE_AGENT_STRENGTH_MULTIPLIER;
            if card.taunt {
                strength.prestige += card.hp as f64;
            }
        }
        result += strength;
    }
    result
}

/// Average per-card strength of a whole deck.
pub fn deck_strengths(deck: &[&Card], ratios: &EnumMap<PatronId, f64>) -> CardStrengths {
    if deck.is_empty() {
        return CardStrengths::default();
    }
    let mut sum = CardStrengths::default();
    for card in deck {
        sum += card_strengths(card, ratios[card.deck]);
    }
    sum / deck.len() as f64
}

/// Summed strength of agents on the board, weighted up by remaining HP and
/// crediting taunt bodies as prestige protection.
pub fn agent_strengths(agents: &[AgentState], ratios: &EnumMap<PatronId, f64>) -> CardStrengths {
    let mut result = CardStrengths::default();
    for agent in agents {
        let base = card_strengths(&agent.card, ratios[agent.card.deck])
            * BASE_AGENT_STRENGTH_MULTIPLIER;
        let mut strength =
            base + base * (AGENT_HP_VALUE_MULTIPLIER * agent.current_hp as f64);
        if agent.card.taunt {
            strength.prestige += agent.current_hp as f64;
        }
        result += strength;
    }
    result
}

/// Ranks `cards` best to worst by their strength within the current player's
/// deck composition.
pub fn rank_cards(state: &GameStateSnapshot, cards: &[Card]) -> Vec<Card> {
    let deck = state.current.full_deck(true);
    let ratios = patron_ratios(&deck, state.patrons);
    let mut ranked: Vec<(f64, Card)> = cards
        .iter()
        .map(|c| (card_strengths(c, ratios[c.deck]).rank_value(), c.clone()))
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribute_sim::smallvec::smallvec;

    fn card(id: u16, deck: PatronId, effects: tribute_sim::smallvec::SmallVec<[CardEffect; 2]>) -> Card {
        Card {
            id: CardId(id),
            instance: id as u32,
            kind: CardKind::Action,
            deck,
            cost: 2,
            hp: 0,
            taunt: false,
            effects,
        }
    }

    #[test]
    fn resource_effects_map_to_components() {
        let c = card(
            5,
            PatronId::Hlaalu,
            smallvec![CardEffect::And(
                Effect::new(EffectKind::GainCoin, 2),
                Effect::new(EffectKind::GainPower, 3),
            )],
        );
        let s = card_strengths(&c, 0.0);
        assert_eq!(s.gold, 2.0);
        assert_eq!(s.power, 3.0);
        assert_eq!(s.prestige, 0.0);
    }

    #[test]
    fn choice_is_discounted_against_the_sum() {
        let choice = card(
            6,
            PatronId::Rajhin,
            smallvec![CardEffect::Choice(
                Effect::new(EffectKind::GainCoin, 4),
                Effect::new(EffectKind::GainPower, 4),
            )],
        );
        let s = card_strengths(&choice, 0.0);
        assert!((s.gold - 3.0).abs() < 1e-9);
        assert!((s.power - 3.0).abs() < 1e-9);
    }

    #[test]
    fn combo_effects_are_scaled_by_deck_composition() {
        let combo = card(
            7,
            PatronId::Pelin,
            smallvec![CardEffect::Single(Effect::combo(EffectKind::GainPower, 4, 2))],
        );
        // 10% of the deck is Pelin: draw probability 0.5, squared for combo 2.
        let s = card_strengths(&combo, 0.1);
        assert!((s.power - 1.0).abs() < 1e-9);
        // A denser deck triggers the combo more often.
        let denser = card_strengths(&combo, 0.2);
        assert!(denser.power > s.power);
    }

    #[test]
    fn taunt_agents_gain_prestige_protection_value() {
        let mut agent = card(
            8,
            PatronId::Pelin,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainPower, 1))],
        );
        agent.kind = CardKind::Agent;
        agent.taunt = true;
        agent.hp = 3;
        let strengths = agent_strengths(&[AgentState::new(agent)], &EnumMap::default());
        assert!(strengths.prestige >= 3.0);
    }

    #[test]
    fn ranking_orders_best_first() {
        let state = GameStateSnapshot::new(PatronId::Hlaalu | PatronId::Treasury);
        let weak = card(
            1,
            PatronId::Treasury,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainCoin, 1))],
        );
        let strong = card(
            2,
            PatronId::Treasury,
            smallvec![CardEffect::Single(Effect::new(EffectKind::GainPrestige, 5))],
        );
        let ranked = rank_cards(&state, &[weak.clone(), strong.clone()]);
        assert_eq!(ranked[0].id, strong.id);
        assert_eq!(ranked[1].id, weak.id);
    }
}
