use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameId, PlayerId, PlayerInfo, Role, Submission, VoteResult};

/// A state-change notification fanned out to the clients of a room.
///
/// `player_id` selects the audience: `Some` means the event is delivered
/// only to that player (role assignments), `None` means broadcast to every
/// registered client of the room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameEvent {
    pub game_id: GameId,
    pub player_id: Option<PlayerId>,
    pub payload: EventPayload,
    pub timestamp: DateTime<Utc>,
}

impl GameEvent {
    /// An event for every client of the room.
    pub fn broadcast(game_id: GameId, payload: EventPayload) -> Self {
        Self {
            game_id,
            player_id: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// An event delivered only to `player_id`.
    pub fn for_player(game_id: GameId, player_id: PlayerId, payload: EventPayload) -> Self {
        Self {
            game_id,
            player_id: Some(player_id),
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// The closed set of event types, one payload shape per type.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EventPayload {
    PlayerJoined(LobbyState),
    PlayerLeft(LobbyState),
    PlayerReconnected(LobbyState),
    RolesAssigned(RoleAssignment),
    SubmissionPhase(SubmissionPhase),
    SubmissionUpdate(SubmissionUpdate),
    VotingStarted(VotingPhase),
    VotingCountdown(VotingCountdown),
    VoteUpdate(VoteProgress),
    RoundEnded(RoundResults),
}

impl EventPayload {
    /// The wire tag of this event, for diagnostics.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::PlayerJoined(_) => "PLAYER_JOINED",
            EventPayload::PlayerLeft(_) => "PLAYER_LEFT",
            EventPayload::PlayerReconnected(_) => "PLAYER_RECONNECTED",
            EventPayload::RolesAssigned(_) => "ROLES_ASSIGNED",
            EventPayload::SubmissionPhase(_) => "SUBMISSION_PHASE",
            EventPayload::SubmissionUpdate(_) => "SUBMISSION_UPDATE",
            EventPayload::VotingStarted(_) => "VOTING_STARTED",
            EventPayload::VotingCountdown(_) => "VOTING_COUNTDOWN",
            EventPayload::VoteUpdate(_) => "VOTE_UPDATE",
            EventPayload::RoundEnded(_) => "ROUND_ENDED",
        }
    }
}

/// Lobby roster, sent on join, leave and reconnect.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LobbyState {
    pub players: Vec<PlayerInfo>,
    pub host_id: Option<PlayerId>,
    pub can_start: bool,
}

/// Sent to each player individually at round start. The secret word is
/// included only for the Vilek role.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoleAssignment {
    pub role: Role,
    pub secret_word: Option<String>,
}

/// Sent when the submission phase opens.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmissionPhase {
    pub current_player_id: Option<PlayerId>,
    pub player_order: Vec<PlayerInfo>,
    pub submissions: Vec<Submission>,
}

/// Sent after each accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmissionUpdate {
    pub submissions: Vec<Submission>,
    pub current_player_id: Option<PlayerId>,
    pub is_complete: bool,
}

/// Sent when the voting phase opens.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VotingPhase {
    pub remaining_seconds: u64,
    pub players: Vec<PlayerInfo>,
}

/// Sent once per second while the voting countdown runs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VotingCountdown {
    pub remaining_seconds: u64,
}

/// Vote progress, without revealing who voted for whom.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoteProgress {
    pub voted_count: usize,
    pub total_players: usize,
}

/// Full round outcome, sent when the round ends.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundResults {
    pub votes: Vec<VoteResult>,
    pub imposter_id: PlayerId,
    pub winner: Role,
    pub secret_word: String,
}
