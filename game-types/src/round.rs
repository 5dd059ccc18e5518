use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;

/// A word submitted by a player during the submission phase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Submission {
    pub player_id: PlayerId,
    /// Nickname snapshot at submission time.
    pub nickname: String,
    pub word: String,
    /// 1-based position in the submission sequence.
    pub order: u32,
    pub timestamp: DateTime<Utc>,
}

impl Submission {
    pub fn new(player_id: PlayerId, nickname: impl Into<String>, word: impl Into<String>, order: u32) -> Self {
        Self {
            player_id,
            nickname: nickname.into(),
            word: word.into(),
            order,
            timestamp: Utc::now(),
        }
    }
}

/// A vote cast by one player against another.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Vote {
    pub voter_id: PlayerId,
    pub target_id: PlayerId,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    pub fn new(voter_id: PlayerId, target_id: PlayerId) -> Self {
        Self {
            voter_id,
            target_id,
            timestamp: Utc::now(),
        }
    }
}

/// Per-player voting result row for the round-results display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoteResult {
    pub player_id: PlayerId,
    pub nickname: String,
    pub vote_count: u32,
    /// Nicknames of the players who voted for this player.
    pub voted_by: Vec<String>,
    pub is_imposter: bool,
}
