use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::scoring::{self, SpecialHand};

/// Whether an actor is still playing the current game.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Pending,
    Stood,
}

/// Cards held by one actor, in the order they were drawn.
/// A hand only grows; cards go back to the deck only when a new game
/// builds a fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: impl Into<Vec<Card>>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Draws `n` cards from `deck` onto this hand, stopping at the first error.
    pub fn draw_from(&mut self, deck: &mut Deck, n: usize) -> Result<(), GameError> {
        for _ in 0..n {
            self.cards.push(deck.draw()?);
        }
        Ok(())
    }

    pub fn score(&self) -> u32 {
        scoring::score(&self.cards)
    }

    pub fn special(&self) -> Option<SpecialHand> {
        scoring::special_hand(&self.cards)
    }
}
