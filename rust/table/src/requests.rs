use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use xidach_engine::resolver::ActorId;

/// Chat channel a table lives in. One session per channel.
pub type ChannelKey = u64;

/// Token minted once per dealt game. Buttons carry it so that a click on a
/// card from an older game cannot act on the current one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A request coming from the chat transport.
///
/// `caller` is whoever pressed the button or typed the command. Hand actions
/// also name the `actor` the button was issued to, which may differ when
/// someone clicks a button meant for another player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRequest {
    pub channel: ChannelKey,
    pub caller: ActorId,
    pub action: TableAction,
}

impl TableRequest {
    pub fn new(channel: ChannelKey, caller: ActorId, action: TableAction) -> Self {
        Self {
            channel,
            caller,
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableAction {
    /// Open a fresh lobby, replacing whatever the channel had.
    NewGame,
    Join,
    StartVote,
    Draw { actor: ActorId, game_id: GameId },
    Hit { actor: ActorId, game_id: GameId },
    Stand { actor: ActorId, game_id: GameId },
}

impl TableAction {
    pub fn name(&self) -> &'static str {
        match self {
            TableAction::NewGame => "new_game",
            TableAction::Join => "join",
            TableAction::StartVote => "start_vote",
            TableAction::Draw { .. } => "draw",
            TableAction::Hit { .. } => "hit",
            TableAction::Stand { .. } => "stand",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_are_unique() {
        assert_ne!(GameId::new(), GameId::new());
    }

    #[test]
    fn hand_actions_round_trip_through_json() {
        let game_id = GameId::new();
        let request = TableRequest::new(10, 20, TableAction::Hit { actor: 20, game_id });
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["action"]["type"], "hit");
        assert_eq!(json["action"]["game_id"], game_id.to_string());

        let back: TableRequest = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, request);
    }
}
