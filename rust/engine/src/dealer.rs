use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::Hand;
use crate::scoring::FIVE_CARD_HAND;

/// The dealer keeps drawing while below this total.
pub const DEALER_STAND_SCORE: u32 = 15;

/// True when the dealer policy wants another card for `hand`.
pub fn should_draw(hand: &Hand) -> bool {
    hand.score() < DEALER_STAND_SCORE && hand.len() < FIVE_CARD_HAND
}

/// Plays the dealer's turn: draw while the total is under 15 and the hand
/// holds fewer than five cards. Returns how many cards were drawn.
///
/// ```
/// use xidach_engine::cards::{Card, Rank, Suit};
/// use xidach_engine::dealer::play_dealer_turn;
/// use xidach_engine::deck::Deck;
/// use xidach_engine::hand::Hand;
///
/// let mut hand = Hand::from_cards(vec![
///     Card::new(Rank::Seven, Suit::Hearts),
///     Card::new(Rank::Eight, Suit::Hearts),
/// ]);
/// let mut deck = Deck::new();
/// assert_eq!(play_dealer_turn(&mut hand, &mut deck), Ok(0));
/// ```
pub fn play_dealer_turn(hand: &mut Hand, deck: &mut Deck) -> Result<usize, GameError> {
    let mut drawn = 0;
    while should_draw(hand) {
        hand.push(deck.draw()?);
        drawn += 1;
    }
    Ok(drawn)
}
