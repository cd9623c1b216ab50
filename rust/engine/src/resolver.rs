use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::hand::Hand;
use crate::scoring::{SpecialHand, BUST_LIMIT};

/// Chat-platform identifier of a human player.
pub type ActorId = u64;

/// Minimum total for a player's hand to be compared at all.
pub const PLAYER_MIN_SCORE: u32 = 16;
/// Minimum total for the dealer's hand to be compared at all.
pub const DEALER_MIN_SCORE: u32 = 15;

/// Who holds a hand at the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "seat", content = "actor", rename_all = "snake_case")]
pub enum Seat {
    Player(ActorId),
    Dealer,
}

impl Seat {
    pub fn min_score(self) -> u32 {
        match self {
            Seat::Player(_) => PLAYER_MIN_SCORE,
            Seat::Dealer => DEALER_MIN_SCORE,
        }
    }
}

/// One hand as it stood at the end of the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub seat: Seat,
    pub cards: Vec<Card>,
    pub score: u32,
    /// Met the minimum total for its seat.
    pub qualified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialHand>,
}

/// Final outcome of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub entries: Vec<SettlementEntry>,
    pub winner: Option<Seat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_score: Option<u32>,
}

impl Settlement {
    pub fn entry(&self, seat: Seat) -> Option<&SettlementEntry> {
        self.entries.iter().find(|e| e.seat == seat)
    }

    pub fn qualified(&self) -> impl Iterator<Item = &SettlementEntry> {
        self.entries.iter().filter(|e| e.qualified)
    }
}

/// Picks the winner among finalized hands.
///
/// `hands` must be in table order: players in join order, then the dealer.
/// Only hands at or above their seat's minimum are considered, and among
/// those the highest total of 21 or less wins. An equal total never takes
/// the win from an earlier seat.
pub fn resolve<'a, I>(hands: I) -> Settlement
where
    I: IntoIterator<Item = (Seat, &'a Hand)>,
{
    let mut entries = Vec::new();
    let mut winner: Option<(Seat, u32)> = None;

    for (seat, hand) in hands {
        let score = hand.score();
        let qualified = score >= seat.min_score();
        if qualified && score <= BUST_LIMIT && winner.is_none_or(|(_, best)| score > best) {
            winner = Some((seat, score));
        }
        entries.push(SettlementEntry {
            seat,
            cards: hand.cards().to_vec(),
            score,
            qualified,
            special: hand.special(),
        });
    }

    Settlement {
        entries,
        winner: winner.map(|(seat, _)| seat),
        winning_score: winner.map(|(_, score)| score),
    }
}
