use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

use game_core::{Game, WordList};
use game_server::session::{ClientConnection, GameSession};
use game_types::{EventPayload, GameEvent, GameSettings, PlayerId};

/// Client stub that records every event it is sent.
pub struct RecordingClient {
    pub player_id: PlayerId,
    events: Mutex<Vec<GameEvent>>,
    pub closed: AtomicBool,
}

impl RecordingClient {
    pub fn new(player_id: PlayerId) -> Arc<Self> {
        Arc::new(Self {
            player_id,
            events: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_of(&self, event_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.payload.event_type() == event_type)
            .count()
    }

    pub fn find_payload(&self, event_type: &str) -> Option<EventPayload> {
        self.events()
            .iter()
            .find(|e| e.payload.event_type() == event_type)
            .map(|e| e.payload.clone())
    }
}

impl ClientConnection for RecordingClient {
    fn send(&self, event: &GameEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Settings with timer durations short enough for tests.
pub fn fast_settings() -> GameSettings {
    GameSettings {
        min_players: 4,
        max_players: 10,
        voting_duration: Duration::from_secs(20),
        role_reveal_delay: Duration::from_millis(50),
    }
}

pub struct TestRoom {
    pub session: Arc<GameSession>,
    pub player_ids: Vec<PlayerId>,
    pub clients: Vec<Arc<RecordingClient>>,
}

impl TestRoom {
    pub fn host(&self) -> PlayerId {
        self.player_ids[0]
    }
}

/// Creates a session seeded with a fixed word list, joins `player_count`
/// players and registers a recording client for each.
pub async fn setup_room(player_count: usize, settings: GameSettings, words: &[&str]) -> TestRoom {
    let game = Game::new("ROOM01".to_string(), settings);
    let word_list = Arc::new(WordList::new(words.iter().map(|w| w.to_string()).collect()));
    let session = GameSession::new(game, word_list);

    let mut player_ids = Vec::new();
    let mut clients = Vec::new();
    for i in 0..player_count {
        let player_id = Uuid::new_v4();
        // Register first, then join, the way the transport does.
        let client = RecordingClient::new(player_id);
        session
            .register_client(client.clone() as Arc<dyn ClientConnection>)
            .await;
        session
            .add_player(player_id, &format!("Player{}", i + 1))
            .await
            .unwrap();

        player_ids.push(player_id);
        clients.push(client);
    }

    TestRoom {
        session,
        player_ids,
        clients,
    }
}

/// Lets queued events flow through the delivery task.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
