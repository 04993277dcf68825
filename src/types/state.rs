use enum_map::EnumMap;
use enumset::EnumSet;
use smallvec::SmallVec;

use super::{BoardMode, Card, CardId, CardKind, ChoiceKind, PatronFavor, PatronId, PlayerId};

/// An agent (persistent card) on a player's board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    pub card: Card,
    pub current_hp: u8,
    pub activated: bool,
}

impl AgentState {
    pub fn new(card: Card) -> Self {
        let current_hp = card.hp;
        Self {
            card,
            current_hp,
            activated: false,
        }
    }
}

/// One player's resources and card pools in a seed-resolved snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub player: PlayerId,
    pub coins: u16,
    pub power: u16,
    pub prestige: u16,
    pub patron_calls: u8,
    pub hand: Vec<Card>,
    pub draw_pile: Vec<Card>,
    pub played: Vec<Card>,
    pub cooldown: Vec<Card>,
    pub agents: Vec<AgentState>,
}

impl PlayerState {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            coins: 0,
            power: 0,
            prestige: 0,
            patron_calls: 1,
            hand: Vec::new(),
            draw_pile: Vec::new(),
            played: Vec::new(),
            cooldown: Vec::new(),
            agents: Vec::new(),
        }
    }

    /// All cards this player owns, agents included (contract agents are
    /// transient and excluded). `include_hand` is false when building the
    /// opponent's deck view, whose hand is hidden information.
    pub fn full_deck(&self, include_hand: bool) -> Vec<&Card> {
        let mut deck: Vec<&Card> = Vec::with_capacity(
            self.hand.len() + self.draw_pile.len() + self.played.len() + self.cooldown.len(),
        );
        if include_hand {
            deck.extend(self.hand.iter());
        }
        deck.extend(self.draw_pile.iter());
        deck.extend(self.played.iter());
        deck.extend(self.cooldown.iter());
        deck.extend(
            self.agents
                .iter()
                .filter(|a| a.card.kind != CardKind::ContractAgent)
                .map(|a| &a.card),
        );
        deck
    }

    /// Total hitpoints of taunt agents, the amount of power an attacker must
    /// spend before touching prestige.
    pub fn taunt_hp(&self) -> u16 {
        self.agents
            .iter()
            .filter(|a| a.card.taunt)
            .map(|a| a.current_hp as u16)
            .sum()
    }
}

/// A choice interposed by a card or patron effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingChoice {
    pub kind: ChoiceKind,
    pub min_choices: u8,
    pub max_choices: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndGameState {
    pub winner: Option<PlayerId>,
    pub reason: String,
}

/// A serializable, seed-resolved view of the whole game, treated as an
/// immutable value by the search core. `current` is always the acting player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStateSnapshot {
    pub board_mode: BoardMode,
    pub patrons: EnumSet<PatronId>,
    pub patron_states: EnumMap<PatronId, PatronFavor>,
    pub current: PlayerState,
    pub opponent: PlayerState,
    pub tavern: Vec<Card>,
    pub pending_choice: Option<PendingChoice>,
    pub end_state: Option<EndGameState>,
    pub completed_turns: u32,
}

impl GameStateSnapshot {
    pub fn new(patrons: EnumSet<PatronId>) -> Self {
        Self {
            board_mode: BoardMode::Normal,
            patrons,
            patron_states: EnumMap::default(),
            current: PlayerState::new(PlayerId::PlayerFirst),
            opponent: PlayerState::new(PlayerId::PlayerSecond),
            tavern: Vec::new(),
            pending_choice: None,
            end_state: None,
            completed_turns: 0,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.end_state.is_some()
    }

    /// Number of patrons currently favoring `player`.
    pub fn patron_favor_count(&self, player: PlayerId) -> usize {
        self.patrons
            .iter()
            .filter(|&p| self.patron_states[p] == PatronFavor::Favors(player))
            .count()
    }

    /// Semantic equality: two snapshots describe the same position when every
    /// observable aspect matches, treating card pools as multisets of card
    /// types so that physical instance numbering is ignored.
    pub fn is_identical(&self, other: &GameStateSnapshot) -> bool {
        self.board_mode == other.board_mode
            && self.patrons == other.patrons
            && self.patron_states == other.patron_states
            && self.pending_choice == other.pending_choice
            && self.completed_turns == other.completed_turns
            && end_states_identical(&self.end_state, &other.end_state)
            && zone_ids(&self.tavern) == zone_ids(&other.tavern)
            && players_identical(&self.current, &other.current)
            && players_identical(&self.opponent, &other.opponent)
    }
}

fn end_states_identical(a: &Option<EndGameState>, b: &Option<EndGameState>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.winner == b.winner,
        _ => false,
    }
}

fn players_identical(a: &PlayerState, b: &PlayerState) -> bool {
    a.player == b.player
        && a.coins == b.coins
        && a.power == b.power
        && a.prestige == b.prestige
        && a.patron_calls == b.patron_calls
        && zone_ids(&a.hand) == zone_ids(&b.hand)
        && zone_ids(&a.draw_pile) == zone_ids(&b.draw_pile)
        && zone_ids(&a.played) == zone_ids(&b.played)
        && zone_ids(&a.cooldown) == zone_ids(&b.cooldown)
        && agent_keys(&a.agents) == agent_keys(&b.agents)
}

/// Sorted multiset key for an unordered card zone.
fn zone_ids(cards: &[Card]) -> SmallVec<[CardId; 16]> {
    let mut ids: SmallVec<[CardId; 16]> = cards.iter().map(|c| c.id).collect();
    ids.sort_unstable();
    ids
}

fn agent_keys(agents: &[AgentState]) -> SmallVec<[(CardId, u8, bool); 4]> {
    let mut keys: SmallVec<[(CardId, u8, bool); 4]> = agents
        .iter()
        .map(|a| (a.card.id, a.current_hp, a.activated))
        .collect();
    keys.sort_unstable();
    keys
}
