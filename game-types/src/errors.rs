use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Typed domain failures returned by game and session operations.
///
/// The transport layer maps these to user-facing error codes via
/// [`GameError::code`]; the core never uses them for ordinary control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum GameError {
    #[error("game not found")]
    GameNotFound,
    #[error("game is full")]
    GameFull,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("not enough players to start")]
    NotEnoughPlayers,
    #[error("not your turn to submit")]
    NotYourTurn,
    #[error("already submitted this round")]
    AlreadySubmitted,
    #[error("already voted this round")]
    AlreadyVoted,
    #[error("invalid action for current phase")]
    InvalidPhase,
    #[error("player not found")]
    PlayerNotFound,
    #[error("only the host can perform this action")]
    NotHost,
    #[error("cannot vote for yourself")]
    CannotVoteSelf,
    #[error("invalid phase transition")]
    InvalidTransition,
    #[error("word cannot be empty")]
    EmptyWord,
    #[error("invalid vote target")]
    InvalidTargetId,
    #[error("could not generate a unique room code")]
    RoomCodeExhausted,
}

impl GameError {
    /// Stable wire code for this error.
    pub fn code(self) -> &'static str {
        match self {
            GameError::GameNotFound => "GAME_NOT_FOUND",
            GameError::GameFull => "GAME_FULL",
            GameError::GameAlreadyStarted => "GAME_ALREADY_STARTED",
            GameError::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::AlreadySubmitted => "ALREADY_SUBMITTED",
            GameError::AlreadyVoted => "ALREADY_VOTED",
            GameError::InvalidPhase => "INVALID_ACTION",
            GameError::PlayerNotFound => "PLAYER_NOT_FOUND",
            GameError::NotHost => "NOT_HOST",
            GameError::CannotVoteSelf => "CANNOT_VOTE_SELF",
            GameError::InvalidTransition => "INVALID_TRANSITION",
            GameError::EmptyWord => "EMPTY_WORD",
            GameError::InvalidTargetId => "INVALID_TARGET",
            GameError::RoomCodeExhausted => "CREATION_FAILED",
        }
    }
}
