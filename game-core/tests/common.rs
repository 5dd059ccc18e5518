use uuid::Uuid;

use game_core::{Game, WordList};
use game_types::{GameSettings, PlayerId};

pub fn create_test_words() -> WordList {
    WordList::new(vec![
        "neon".to_string(),
        "chrome".to_string(),
        "glitch".to_string(),
    ])
}

/// A lobby with `count` joined players; the first one is the host.
pub fn create_lobby_game(count: usize) -> (Game, Vec<PlayerId>) {
    let mut game = Game::new("ROOM01".to_string(), GameSettings::default());
    let ids: Vec<PlayerId> = (0..count).map(|_| Uuid::new_v4()).collect();
    for (i, id) in ids.iter().enumerate() {
        game.add_player(*id, format!("Player{}", i + 1)).unwrap();
    }
    (game, ids)
}

/// Drives a started game through the submission phase into voting.
pub fn play_until_voting(game: &mut Game) {
    game.transition_to_submission().unwrap();
    let order = game.current_round.as_ref().unwrap().player_order.clone();
    for (i, id) in order.iter().enumerate() {
        game.submit_word(*id, &format!("word{}", i)).unwrap();
    }
    game.transition_to_voting().unwrap();
}
