use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::PatronId;

/// Card identity shared by all physical copies of the same card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u16);

impl CardId {
    pub const GOLD: CardId = CardId(0);
    pub const BEWILDERMENT: CardId = CardId(1);
    pub const WRIT_OF_COIN: CardId = CardId(2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Action,
    Agent,
    ContractAction,
    ContractAgent,
    Curse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    GainCoin,
    GainPower,
    GainPrestige,
    OppLosePrestige,
    AcquireTavern,
    CreateSacking,
    DestroyCard,
    Draw,
    Heal,
    Knockout,
    OppDiscard,
    PatronCall,
    ReplaceTavern,
    ReturnTop,
    Toss,
}

impl EffectKind {
    /// Effects whose outcome depends on hidden randomness (draw order).
    #[inline]
    pub fn is_stochastic(self) -> bool {
        matches!(self, EffectKind::Draw)
    }

    /// Pure resource gains with no further decision, randomness or branching.
    #[inline]
    pub fn is_instant_gain(self) -> bool {
        matches!(
            self,
            EffectKind::GainCoin
                | EffectKind::GainPower
                | EffectKind::GainPrestige
                | EffectKind::OppLosePrestige
                | EffectKind::PatronCall
                | EffectKind::OppDiscard
                | EffectKind::Heal
        )
    }
}

/// A single atomic effect. `combo` is the number of same-deck cards that must
/// have been played this turn for the effect to trigger (1 = unconditional).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub amount: u8,
    pub combo: u8,
}

impl Effect {
    pub fn new(kind: EffectKind, amount: u8) -> Self {
        Self { kind, amount, combo: 1 }
    }

    pub fn combo(kind: EffectKind, amount: u8, combo: u8) -> Self {
        Self { kind, amount, combo }
    }
}

/// Effect slot on a card: a single effect, both of two effects, or a choice
/// between two effects (the choice itself is resolved as a separate move).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardEffect {
    Single(Effect),
    And(Effect, Effect),
    Choice(Effect, Effect),
}

impl CardEffect {
    pub fn is_stochastic(&self) -> bool {
        match self {
            CardEffect::Single(e) => e.kind.is_stochastic(),
            CardEffect::And(a, b) => a.kind.is_stochastic() || b.kind.is_stochastic(),
            // A choice only creates the decision; the chosen branch is a
            // separate move and is classified on its own.
            CardEffect::Choice(..) => false,
        }
    }

    pub fn is_instant_gain(&self) -> bool {
        match self {
            CardEffect::Single(e) => e.kind.is_instant_gain(),
            CardEffect::And(a, b) => a.kind.is_instant_gain() && b.kind.is_instant_gain(),
            CardEffect::Choice(..) => false,
        }
    }
}

/// A physical card as it appears in a serialized game snapshot. `instance`
/// distinguishes copies of the same card within one game; two cards with
/// equal `id` are interchangeable for search purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub instance: u32,
    pub kind: CardKind,
    pub deck: PatronId,
    pub cost: u8,
    pub hp: u8,
    pub taunt: bool,
    pub effects: SmallVec<[CardEffect; 2]>,
}

impl Card {
    /// Same card type; physical instance numbering is ignored.
    #[inline]
    pub fn is_identical(&self, other: &Card) -> bool {
        self.id == other.id
    }

    pub fn is_agent(&self) -> bool {
        matches!(self.kind, CardKind::Agent | CardKind::ContractAgent)
    }

    /// Playing this card only grants resources: no randomness, no follow-up
    /// choice, no board interaction worth searching over.
    pub fn is_instant_play(&self) -> bool {
        !self.is_agent() && self.effects.iter().all(CardEffect::is_instant_gain)
    }

    pub fn has_stochastic_effect(&self) -> bool {
        self.effects.iter().any(CardEffect::is_stochastic)
    }
}
