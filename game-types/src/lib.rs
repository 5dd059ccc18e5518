use uuid::Uuid;

pub mod errors;
pub mod events;
pub mod game;
pub mod messages;
pub mod player;
pub mod round;

// Re-export all types
pub use errors::*;
pub use events::*;
pub use game::*;
pub use messages::*;
pub use player::*;
pub use round::*;

pub type PlayerId = Uuid;

/// Room code identifying a game. Short, human-shareable.
pub type GameId = String;
