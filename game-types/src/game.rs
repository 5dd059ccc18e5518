use serde::{Deserialize, Serialize};
use std::time::Duration;
use ts_rs::TS;

use crate::{PlayerId, PlayerInfo, RoundResults, Submission, VoteProgress};

/// The lifecycle phase of a game room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Phase {
    Lobby,
    RoleAssignment,
    Submission,
    Voting,
    Results,
}

impl Phase {
    /// Checks whether moving from this phase to `target` is a legal transition.
    ///
    /// The table is closed: LOBBY → ROLE_ASSIGNMENT → SUBMISSION → VOTING →
    /// RESULTS, and RESULTS loops back to ROLE_ASSIGNMENT (next round) or
    /// LOBBY. Everything else is rejected.
    pub fn can_transition_to(self, target: Phase) -> bool {
        matches!(
            (self, target),
            (Phase::Lobby, Phase::RoleAssignment)
                | (Phase::RoleAssignment, Phase::Submission)
                | (Phase::Submission, Phase::Voting)
                | (Phase::Voting, Phase::Results)
                | (Phase::Results, Phase::RoleAssignment)
                | (Phase::Results, Phase::Lobby)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Imposter,
    Vilek,
}

impl Role {
    pub fn is_imposter(self) -> bool {
        self == Role::Imposter
    }
}

/// Per-room game parameters, fixed at room creation.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub min_players: usize,
    pub max_players: usize,
    pub voting_duration: Duration,
    pub role_reveal_delay: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            min_players: 4,
            max_players: 10,
            voting_duration: Duration::from_secs(20),
            role_reveal_delay: Duration::from_secs(5),
        }
    }
}

/// Phase-appropriate snapshot of a game for one player, used when a client
/// connects or reconnects. Contains the requesting player's own role and (for
/// a Vilek) the secret word, but never another player's role.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameStateView {
    pub phase: Phase,
    pub players: Vec<PlayerInfo>,
    pub host_id: Option<PlayerId>,
    pub can_start: bool,
    pub submissions: Option<Vec<Submission>>,
    pub current_player_id: Option<PlayerId>,
    pub vote_progress: Option<VoteProgress>,
    pub results: Option<RoundResults>,
    pub role: Option<Role>,
    pub secret_word: Option<String>,
}
