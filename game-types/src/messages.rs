use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameEvent, GameId, GameStateView, PlayerId};

/// Messages a client may send over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export)]
pub enum ClientMessage {
    JoinLobby { nickname: String },
    StartGame,
    SubmitWord { word: String },
    CastVote { target_player_id: PlayerId },
    RequestNewRound,
    Ping,
}

/// Connection-level messages from server to client. Game-state changes are
/// relayed as [`GameEvent`]s instead; see [`ServerFrame`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export)]
pub enum ServerMessage {
    Connected {
        player_id: PlayerId,
        game_id: GameId,
        state: GameStateView,
    },
    Error {
        code: String,
        message: String,
    },
    Pong,
}

/// A single outbound WebSocket frame: either a connection-level message or a
/// relayed game event. Serialized untagged so each side keeps its own
/// `type` discriminant on the wire.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ServerFrame {
    Message(ServerMessage),
    Event(GameEvent),
}
