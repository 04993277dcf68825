//! Shared test fixtures: card builders and a miniature rules engine that
//! implements the transition port over a reduced move set (play, buy, end
//! turn). Enough game to drive the search end to end deterministically.

use tribute_sim::prelude::*;
use tribute_sim::smallvec::{smallvec, SmallVec};

pub(crate) fn coin_card(id: u16, deck: PatronId) -> Card {
    Card {
        id: CardId(id),
        instance: id as u32,
        kind: CardKind::Action,
        deck,
        cost: 2,
        hp: 0,
        taunt: false,
        effects: smallvec![CardEffect::Single(Effect::new(EffectKind::GainCoin, 1))],
    }
}

/// Worth `amount` prestige and costs the same, so rankings and affordability
/// caps line up with the card number.
pub(crate) fn prestige_card(id: u16, amount: u8) -> Card {
    Card {
        id: CardId(id),
        instance: id as u32,
        kind: CardKind::Action,
        deck: PatronId::Treasury,
        cost: amount,
        hp: 0,
        taunt: false,
        effects: smallvec![CardEffect::Single(Effect::new(EffectKind::GainPrestige, amount))],
    }
}

/// Draw effects are the stochastic move class in the reduced engine.
pub(crate) fn draw_card(id: u16) -> Card {
    Card {
        id: CardId(id),
        instance: id as u32,
        kind: CardKind::Action,
        deck: PatronId::Treasury,
        cost: 2,
        hp: 0,
        taunt: false,
        effects: smallvec![CardEffect::Single(Effect::new(EffectKind::Draw, 1))],
    }
}

pub(crate) fn gold_card(instance: u32) -> Card {
    Card {
        id: CardId::GOLD,
        instance,
        kind: CardKind::Action,
        deck: PatronId::Treasury,
        cost: 0,
        hp: 0,
        taunt: false,
        effects: smallvec![CardEffect::Single(Effect::new(EffectKind::GainCoin, 1))],
    }
}

pub(crate) fn bewilderment_card(instance: u32) -> Card {
    Card {
        id: CardId::BEWILDERMENT,
        instance,
        kind: CardKind::Curse,
        deck: PatronId::Treasury,
        cost: 0,
        hp: 0,
        taunt: false,
        effects: SmallVec::new(),
    }
}

pub(crate) fn taunt_agent(instance: u32, hp: u8) -> AgentState {
    AgentState::new(Card {
        id: CardId(200),
        instance,
        kind: CardKind::Agent,
        deck: PatronId::Pelin,
        cost: 3,
        hp,
        taunt: true,
        effects: smallvec![CardEffect::Single(Effect::new(EffectKind::GainPower, 1))],
    })
}

/// A mid-game position with populated zones for both players.
pub(crate) fn two_player_state() -> GameStateSnapshot {
    let mut state = GameStateSnapshot::new(
        PatronId::Ansei | PatronId::Pelin | PatronId::Rajhin | PatronId::Hlaalu | PatronId::Treasury,
    );
    state.current.hand = vec![coin_card(100, PatronId::Pelin), prestige_card(101, 2)];
    state.current.draw_pile = vec![coin_card(102, PatronId::Hlaalu)];
    state.current.played = vec![coin_card(103, PatronId::Pelin)];
    state.opponent.draw_pile = vec![coin_card(110, PatronId::Rajhin)];
    state
}

/// Reduced rules engine behind the transition port. Moves supported: playing
/// a hand card (resource gains apply immediately, draws consume the seed),
/// buying an affordable tavern card into cooldown, and ending the turn
/// (power converts to prestige, sides swap, the incoming player's cards
/// cycle back into hand, first to `win_prestige` wins). Games that stall hit
/// a turn cap and end in a draw, so random playouts always terminate.
#[derive(Debug, Clone)]
pub(crate) struct MiniGame {
    pub win_prestige: u16,
    pub turn_cap: u32,
}

impl Default for MiniGame {
    fn default() -> Self {
        Self {
            win_prestige: 40,
            turn_cap: 60,
        }
    }
}

impl MiniGame {
    fn play_card(state: &mut GameStateSnapshot, card: &Card, seed: Option<u64>) {
        let Some(pos) = state.current.hand.iter().position(|c| c.id == card.id) else {
            return;
        };
        let played = state.current.hand.remove(pos);
        for effect in &played.effects {
            if let CardEffect::Single(e) = effect {
                Self::apply_effect(state, e, seed);
            }
        }
        state.current.played.push(played);
    }

    fn apply_effect(state: &mut GameStateSnapshot, effect: &Effect, seed: Option<u64>) {
        match effect.kind {
            EffectKind::GainCoin => state.current.coins += effect.amount as u16,
            EffectKind::GainPower => state.current.power += effect.amount as u16,
            EffectKind::GainPrestige => state.current.prestige += effect.amount as u16,
            EffectKind::Draw => {
                for _ in 0..effect.amount {
                    let len = state.current.draw_pile.len();
                    if len == 0 {
                        break;
                    }
                    // The seed picks which card comes off the pile, making
                    // the draw deterministic per seed and varied across seeds.
                    let index = seed.map(|s| (s as usize) % len).unwrap_or(0);
                    let drawn = state.current.draw_pile.remove(index);
                    state.current.hand.push(drawn);
                }
            }
            _ => {}
        }
    }

    fn end_turn(&self, state: &mut GameStateSnapshot) {
        state.current.prestige += state.current.power;
        state.current.power = 0;
        state.current.coins = 0;
        if state.current.prestige >= self.win_prestige {
            state.end_state = Some(EndGameState {
                winner: Some(state.current.player),
                reason: "prestige threshold".to_owned(),
            });
        }
        let played = std::mem::take(&mut state.current.played);
        state.current.cooldown.extend(played);
        std::mem::swap(&mut state.current, &mut state.opponent);
        // The incoming player redraws everything, so decks cycle.
        let cooled = std::mem::take(&mut state.current.cooldown);
        state.current.draw_pile.extend(cooled);
        let pile = std::mem::take(&mut state.current.draw_pile);
        state.current.hand.extend(pile);
        state.completed_turns += 1;
        if state.end_state.is_none() && state.completed_turns >= self.turn_cap {
            state.end_state = Some(EndGameState {
                winner: None,
                reason: "turn cap".to_owned(),
            });
        }
    }

    fn legal_moves(state: &GameStateSnapshot) -> Vec<Move> {
        if state.is_terminal() {
            return Vec::new();
        }
        let mut moves: Vec<Move> = state
            .current
            .hand
            .iter()
            .map(|c| Move::PlayCard(c.clone()))
            .collect();
        moves.extend(
            state
                .tavern
                .iter()
                .filter(|c| (c.cost as u16) <= state.current.coins)
                .map(|c| Move::BuyCard(c.clone())),
        );
        moves.push(Move::EndTurn);
        moves
    }
}

impl GameTransition for MiniGame {
    fn apply(&self, state: &GameStateSnapshot, mv: &Move, seed: Option<u64>) -> Transition {
        let mut next = state.clone();
        match mv {
            Move::PlayCard(card) => Self::play_card(&mut next, card, seed),
            Move::BuyCard(card) => {
                if let Some(pos) = next.tavern.iter().position(|c| c.id == card.id) {
                    let bought = next.tavern.remove(pos);
                    next.current.coins = next.current.coins.saturating_sub(bought.cost as u16);
                    next.current.cooldown.push(bought);
                }
            }
            Move::EndTurn => self.end_turn(&mut next),
            _ => {}
        }
        let legal_moves = Self::legal_moves(&next);
        Transition {
            state: next,
            legal_moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playing_a_coin_card_moves_it_and_pays_out() {
        let game = MiniGame::default();
        let state = two_player_state();
        let card = state.current.hand[0].clone();
        let next = game.apply(&state, &Move::PlayCard(card.clone()), Some(1));
        assert_eq!(next.state.current.coins, 1);
        assert!(next.state.current.played.iter().any(|c| c.id == card.id));
        assert_eq!(next.state.current.hand.len(), 1);
    }

    #[test]
    fn end_turn_swaps_sides_and_banks_power() {
        let game = MiniGame::default();
        let mut state = two_player_state();
        state.current.power = 3;
        state.current.prestige = 2;
        let next = game.apply(&state, &Move::EndTurn, None);
        assert_eq!(next.state.current.player, state.opponent.player);
        assert_eq!(next.state.opponent.prestige, 5);
        assert_eq!(next.state.completed_turns, 1);
    }

    #[test]
    fn reaching_the_threshold_ends_the_game() {
        let game = MiniGame::default();
        let mut state = two_player_state();
        state.current.prestige = 39;
        state.current.power = 1;
        let next = game.apply(&state, &Move::EndTurn, None);
        assert!(next.state.is_terminal());
        assert_eq!(
            next.state.end_state.as_ref().unwrap().winner,
            Some(state.current.player)
        );
        assert!(next.legal_moves.is_empty());
    }

    #[test]
    fn draws_are_deterministic_per_seed() {
        let game = MiniGame::default();
        let mut state = two_player_state();
        state.current.hand = vec![draw_card(120)];
        state.current.draw_pile = vec![
            coin_card(121, PatronId::Pelin),
            prestige_card(122, 3),
            coin_card(123, PatronId::Hlaalu),
        ];
        let mv = Move::PlayCard(state.current.hand[0].clone());

        let a = game.apply(&state, &mv, Some(4));
        let b = game.apply(&state, &mv, Some(4));
        assert!(a.state.is_identical(&b.state));

        let c = game.apply(&state, &mv, Some(5));
        assert_ne!(
            a.state.current.hand.last().map(|c| c.id),
            c.state.current.hand.last().map(|c| c.id)
        );
    }
}
