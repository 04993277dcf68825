//! Structural hashing of game snapshots for transposition lookup.
//!
//! The hash must agree for any two snapshots that
//! [`GameStateSnapshot::is_identical`](crate::types::GameStateSnapshot::is_identical)
//! considers equal, so card zones are hashed as multisets (a commutative fold
//! over per-card hashes) and physical instance numbers never enter the hash.
//! Collision freedom is not required; the transposition table resolves
//! collisions by full semantic comparison within a bucket.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::types::{AgentState, Card, GameStateSnapshot, PlayerState};

pub type HashValue = u64;

pub trait StateHash {
    fn state_hash(&self) -> HashValue;
}

#[inline]
fn fx_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Order-insensitive combination of one hash per card. Wrapping addition is
/// commutative and keeps multiplicity: two copies contribute twice.
fn zone_hash(cards: &[Card]) -> u64 {
    cards
        .iter()
        .fold(0u64, |acc, c| acc.wrapping_add(fx_hash(&c.id)))
}

fn agents_hash(agents: &[AgentState]) -> u64 {
    agents.iter().fold(0u64, |acc, a| {
        acc.wrapping_add(fx_hash(&(a.card.id, a.current_hp, a.activated)))
    })
}

fn hash_player(player: &PlayerState, hasher: &mut FxHasher) {
    player.player.hash(hasher);
    player.coins.hash(hasher);
    player.power.hash(hasher);
    player.prestige.hash(hasher);
    player.patron_calls.hash(hasher);
    zone_hash(&player.hand).hash(hasher);
    zone_hash(&player.draw_pile).hash(hasher);
    zone_hash(&player.played).hash(hasher);
    zone_hash(&player.cooldown).hash(hasher);
    agents_hash(&player.agents).hash(hasher);
}

impl StateHash for GameStateSnapshot {
    fn state_hash(&self) -> HashValue {
        let mut hasher = FxHasher::default();
        self.board_mode.hash(&mut hasher);
        self.patrons.as_u64().hash(&mut hasher);
        for patron in self.patrons {
            self.patron_states[patron].hash(&mut hasher);
        }
        self.pending_choice.hash(&mut hasher);
        self.completed_turns.hash(&mut hasher);
        self.end_state.as_ref().map(|e| e.winner).hash(&mut hasher);
        zone_hash(&self.tavern).hash(&mut hasher);
        hash_player(&self.current, &mut hasher);
        hash_player(&self.opponent, &mut hasher);
        hasher.finish()
    }
}
