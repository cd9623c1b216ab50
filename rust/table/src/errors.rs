/// Error handling for table actions
///
/// This module provides:
/// - The actor-scoped error kinds every action can fail with
/// - The rejection payload sent back to the requesting actor
/// - Severity-based error logging
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use xidach_engine::errors::GameError;

use crate::requests::ChannelKey;

/// Why an action request was refused. None of these end the game or touch
/// other channels; the session is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("No game is running in channel {0}")]
    SessionNotFound(ChannelKey),
    #[error("This button belongs to a different game")]
    GameIdMismatch,
    #[error("You are not playing in this game")]
    NotParticipant,
    #[error("These cards belong to another player")]
    ActorMismatch,
    #[error("The table is full (at most {max} players)")]
    LobbyFull { max: usize },
    #[error("Draw your first two cards before acting")]
    HandNotReady,
    #[error("The deck ran out of cards")]
    DeckExhausted,
    #[error("That action is not available while the game is {0}")]
    WrongPhase(&'static str),
    #[error("You already stood")]
    AlreadyStood,
    #[error("Your hand already holds five cards")]
    HandFull,
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl From<GameError> for ActionError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::DeckExhausted => ActionError::DeckExhausted,
        }
    }
}

/// Payload returned to the actor whose request was refused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rejection {
    /// Machine-readable error code (e.g., "game_id_mismatch")
    pub error: String,
    /// Human-readable message
    pub message: String,
}

impl Rejection {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Bad or stale requests - expected, normal operation
    Client,
    /// Failures inside the core that a request cannot cause on its own
    Server,
    /// Critical errors - a session lock was poisoned
    Critical,
}

/// Trait for turning errors into actor-facing rejections with logging
pub trait IntoRejection {
    /// Get the error code string (machine-readable)
    fn error_code(&self) -> &'static str;

    /// Get the error message (human-readable)
    fn error_message(&self) -> String;

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Client
    }

    fn to_rejection(&self) -> Rejection {
        Rejection::new(self.error_code(), self.error_message())
    }

    /// Convert to a rejection, logging at a level matching the severity
    fn into_logged_rejection(self, channel: ChannelKey) -> Rejection
    where
        Self: Sized,
    {
        let rejection = self.to_rejection();
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::info!(channel, error = %rejection.error, "action rejected");
            }
            ErrorSeverity::Server => {
                tracing::error!(
                    channel,
                    error = %rejection.error,
                    message = %rejection.message,
                    "action failed"
                );
            }
            ErrorSeverity::Critical => {
                tracing::error!(
                    channel,
                    error = %rejection.error,
                    message = %rejection.message,
                    critical = true,
                    "action failed on poisoned state"
                );
            }
        }
        rejection
    }
}

impl IntoRejection for ActionError {
    fn error_code(&self) -> &'static str {
        match self {
            ActionError::SessionNotFound(_) => "session_not_found",
            ActionError::GameIdMismatch => "game_id_mismatch",
            ActionError::NotParticipant => "not_participant",
            ActionError::ActorMismatch => "actor_mismatch",
            ActionError::LobbyFull { .. } => "lobby_full",
            ActionError::HandNotReady => "hand_not_ready",
            ActionError::DeckExhausted => "deck_exhausted",
            ActionError::WrongPhase(_) => "wrong_phase",
            ActionError::AlreadyStood => "already_stood",
            ActionError::HandFull => "hand_full",
            ActionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            ActionError::StoragePoisoned => ErrorSeverity::Critical,
            ActionError::DeckExhausted => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}
