use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("Deck exhausted: no cards left to draw")]
    DeckExhausted,
}
