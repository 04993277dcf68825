use serde::{Deserialize, Serialize};

mod card;
mod moves;
mod state;

pub use card::*;
pub use moves::*;
pub use state::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    PlayerFirst,
    PlayerSecond,
}

impl PlayerId {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Self::PlayerFirst => Self::PlayerSecond,
            Self::PlayerSecond => Self::PlayerFirst,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlayerFirst => write!(f, "P1"),
            Self::PlayerSecond => write!(f, "P2"),
        }
    }
}

/// Patron decks. Every card belongs to exactly one patron's deck;
/// `Treasury` holds the neutral starter/curse cards.
#[derive(enumset::EnumSetType, enum_map::Enum, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatronId {
    Ansei,
    DukeOfCrows,
    Rajhin,
    Psijic,
    Orgnum,
    Hlaalu,
    Pelin,
    RedEagle,
    Treasury,
}

/// Which player a patron currently favors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatronFavor {
    #[default]
    Neutral,
    Favors(PlayerId),
}

/// Coarse board mode: either the acting player picks from the normal move
/// set, or an effect has interposed a pending choice that must be resolved
/// before anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardMode {
    Normal,
    ChoicePending,
    StartOfTurnChoicePending,
    PatronChoicePending,
}

/// What the pending choice resolves into once made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceKind {
    EnactChosenEffect,
    AcquireCards,
    RefreshCards,
    TossCards,
    KnockoutAgents,
    DestroyCards,
    DiscardCards,
    ReplaceCardsInTavern,
    CompleteHlaalu,
    CompletePellin,
    CompletePsijic,
    CompleteTreasury,
}
