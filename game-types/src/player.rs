use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PlayerId, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// A participant in a game room. Created on join, kept across disconnects
/// (only an explicit leave removes a player), reset between rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub role: Option<Role>,
    pub has_submitted: bool,
    pub has_voted: bool,
    pub status: ConnectionStatus,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: PlayerId, nickname: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            role: None,
            has_submitted: false,
            has_voted: false,
            status: ConnectionStatus::Connected,
            joined_at: Utc::now(),
        }
    }

    /// Clears the per-round state: role and submission/vote flags.
    pub fn reset_for_new_round(&mut self) {
        self.role = None;
        self.has_submitted = false;
        self.has_voted = false;
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn disconnect(&mut self) {
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn reconnect(&mut self) {
        self.status = ConnectionStatus::Connected;
    }

    /// Public view of this player, with the role hidden.
    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            nickname: self.nickname.clone(),
            has_submitted: self.has_submitted,
            has_voted: self.has_voted,
            status: self.status,
        }
    }
}

/// Safe projection of a player for broadcasting to the whole room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub nickname: String,
    pub has_submitted: bool,
    pub has_voted: bool,
    pub status: ConnectionStatus,
}
