pub mod game;
pub mod round;
pub mod words;

// Re-export main components
pub use game::*;
pub use round::*;
pub use words::*;
