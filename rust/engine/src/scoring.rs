use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::Card;

/// Highest total that does not bust.
pub const BUST_LIMIT: u32 = 21;
/// Number of cards in a Ngũ Linh hand; also the most cards a hand can hold.
pub const FIVE_CARD_HAND: usize = 5;

/// Hands that win on sight rather than on points.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialHand {
    /// Two aces (Xì Bàng)
    DoubleAce,
    /// Ace plus a ten-value card (Xì Dách)
    NaturalWin,
    /// Five cards totalling 21 or less (Ngũ Linh)
    FiveCard,
}

impl SpecialHand {
    pub fn label(self) -> &'static str {
        match self {
            SpecialHand::DoubleAce => "Xì Bàng",
            SpecialHand::NaturalWin => "Xì Dách",
            SpecialHand::FiveCard => "Ngũ Linh",
        }
    }
}

impl fmt::Display for SpecialHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Point total of a hand.
///
/// Non-ace cards are summed first. Each ace is then resolved greedily in
/// hand order: 11 if that keeps the total at or under 21, otherwise 10 if
/// that does, otherwise 1. This is not the best possible assignment for
/// every hand; it is the house rule and must stay as is.
///
/// ```
/// use xidach_engine::cards::{Card, Rank, Suit};
/// use xidach_engine::scoring::score;
///
/// let hand = [
///     Card::new(Rank::Nine, Suit::Spades),
///     Card::new(Rank::Nine, Suit::Hearts),
///     Card::new(Rank::Ace, Suit::Clubs),
/// ];
/// assert_eq!(score(&hand), 19);
/// ```
pub fn score(cards: &[Card]) -> u32 {
    let mut total: u32 = cards.iter().filter_map(|c| c.rank.points()).sum();
    let aces = cards.iter().filter(|c| c.is_ace()).count();
    for _ in 0..aces {
        total += if total + 11 <= BUST_LIMIT {
            11
        } else if total + 10 <= BUST_LIMIT {
            10
        } else {
            1
        };
    }
    total
}

/// Xì Dách: exactly two cards, one ace and one of 10/J/Q/K.
pub fn is_natural_win(cards: &[Card]) -> bool {
    match cards {
        [a, b] => (a.is_ace() && b.rank.is_ten_value()) || (b.is_ace() && a.rank.is_ten_value()),
        _ => false,
    }
}

/// Xì Bàng: exactly two cards, both aces.
pub fn is_double_ace(cards: &[Card]) -> bool {
    matches!(cards, [a, b] if a.is_ace() && b.is_ace())
}

/// Ngũ Linh: five cards without busting.
pub fn is_five_card_win(cards: &[Card]) -> bool {
    cards.len() == FIVE_CARD_HAND && score(cards) <= BUST_LIMIT
}

/// Classifies a hand, checking the double ace before the natural so two
/// aces are always labelled Xì Bàng.
pub fn special_hand(cards: &[Card]) -> Option<SpecialHand> {
    if is_double_ace(cards) {
        Some(SpecialHand::DoubleAce)
    } else if is_natural_win(cards) {
        Some(SpecialHand::NaturalWin)
    } else if is_five_card_win(cards) {
        Some(SpecialHand::FiveCard)
    } else {
        None
    }
}
