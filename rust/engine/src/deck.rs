use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// Source of card order for [`Deck::shuffle`].
///
/// Production tables use [`SeededShuffle`]; tests and scripted runs use
/// [`PresetOrder`] to know exactly which card comes off the top next.
pub trait RandomSource: Send {
    fn shuffle_cards(&mut self, cards: &mut [Card]);
}

/// ChaCha20-backed shuffle. The same seed always produces the same order.
#[derive(Debug, Clone)]
pub struct SeededShuffle {
    seed: u64,
    rng: ChaCha20Rng,
}

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Fresh source seeded from the thread RNG; the seed stays readable for replay.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededShuffle {
    fn shuffle_cards(&mut self, cards: &mut [Card]) {
        cards.shuffle(&mut self.rng);
    }
}

/// Stacks the listed cards on top, in order, and leaves every other card
/// in canonical order underneath.
#[derive(Debug, Clone, Default)]
pub struct PresetOrder {
    top: Vec<Card>,
}

impl PresetOrder {
    pub fn new(top: impl Into<Vec<Card>>) -> Self {
        Self { top: top.into() }
    }
}

impl RandomSource for PresetOrder {
    fn shuffle_cards(&mut self, cards: &mut [Card]) {
        let mut ordered: Vec<Card> = Vec::with_capacity(cards.len());
        for card in &self.top {
            // cards outside the slice or listed twice are skipped
            if cards.contains(card) && !ordered.contains(card) {
                ordered.push(*card);
            }
        }
        for card in cards.iter() {
            if !ordered.contains(card) {
                ordered.push(*card);
            }
        }
        cards.copy_from_slice(&ordered);
    }
}

/// The draw pile of one game. Cards are only ever taken from the front, so
/// the dealt cards and the remaining cards always add up to the full 52.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// Canonical, unshuffled 52-card deck.
    pub fn new() -> Self {
        Self {
            cards: full_deck(),
            position: 0,
        }
    }

    /// Rebuilds the full deck and orders it with `source`.
    pub fn shuffle(&mut self, source: &mut dyn RandomSource) {
        self.cards = full_deck();
        source.shuffle_cards(&mut self.cards);
        self.position = 0;
    }

    pub fn draw(&mut self) -> Result<Card, GameError> {
        let card = self
            .cards
            .get(self.position)
            .copied()
            .ok_or(GameError::DeckExhausted)?;
        self.position += 1;
        Ok(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    pub fn remaining_cards(&self) -> &[Card] {
        &self.cards[self.position.min(self.cards.len())..]
    }
}
