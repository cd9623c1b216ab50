//! # xidach-engine: Xì Dách card engine
//!
//! Pure building blocks for the Vietnamese blackjack variant played at a
//! chat table: the 52-card deck with an injectable shuffle, hand scoring with
//! special-hand detection, the automated dealer's drawing rule, and the
//! winner resolution that closes a game. Nothing here locks or talks to a
//! transport; the table crate composes these pieces under a session lock.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Rank, Suit, Card) and the canonical deck order
//! - [`deck`] - Draw pile plus the [`deck::RandomSource`] shuffle port
//! - [`hand`] - Per-actor hands and the Pending/Stood decision
//! - [`scoring`] - Greedy-ace scoring, Xì Dách, Xì Bàng and Ngũ Linh
//! - [`dealer`] - The dealer's draw-below-15 policy
//! - [`resolver`] - Qualification floors and winner selection
//! - [`errors`] - Error types for engine operations
//!
//! ## Quick Start
//!
//! ```rust
//! use xidach_engine::cards::{Card, Rank, Suit};
//! use xidach_engine::deck::{Deck, PresetOrder};
//! use xidach_engine::hand::Hand;
//! use xidach_engine::scoring::SpecialHand;
//!
//! let mut deck = Deck::new();
//! deck.shuffle(&mut PresetOrder::new(vec![
//!     Card::new(Rank::Ace, Suit::Spades),
//!     Card::new(Rank::King, Suit::Hearts),
//! ]));
//!
//! let mut hand = Hand::new();
//! hand.draw_from(&mut deck, 2).unwrap();
//! assert_eq!(hand.score(), 21);
//! assert_eq!(hand.special(), Some(SpecialHand::NaturalWin));
//! ```
//!
//! ## Deterministic Shuffles
//!
//! ```rust
//! use xidach_engine::deck::{Deck, SeededShuffle};
//!
//! let mut d1 = Deck::new();
//! let mut d2 = Deck::new();
//! d1.shuffle(&mut SeededShuffle::new(42));
//! d2.shuffle(&mut SeededShuffle::new(42));
//! assert_eq!(d1.remaining_cards(), d2.remaining_cards());
//! ```

pub mod cards;
pub mod dealer;
pub mod deck;
pub mod errors;
pub mod hand;
pub mod resolver;
pub mod scoring;
