use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::info;

use crate::session::GameSession;
use game_core::{Game, WordList};
use game_types::{GameError, GameId, GameSettings};

/// Characters used for room codes. Ambiguous glyphs (0/O, 1/I) are excluded.
pub const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// How many collision retries before giving up on code generation.
const MAX_CODE_ATTEMPTS: usize = 10;

/// Hub-level housekeeping parameters.
#[derive(Debug, Clone)]
pub struct HubSettings {
    pub room_code_length: usize,
    /// Zero-player sessions older than this are reclaimed by the sweep.
    pub stale_game_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            room_code_length: 6,
            stale_game_timeout: Duration::from_secs(2 * 60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

/// Registry of all active game sessions, keyed by room code.
pub struct GameHub {
    sessions: RwLock<HashMap<GameId, Arc<GameSession>>>,
    settings: HubSettings,
    game_settings: GameSettings,
    word_list: Arc<WordList>,
    shutdown_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

impl GameHub {
    pub fn new(
        settings: HubSettings,
        game_settings: GameSettings,
        word_list: Arc<WordList>,
    ) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let hub = Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            settings,
            game_settings,
            word_list,
            shutdown_tx,
            closed: AtomicBool::new(false),
        });

        tokio::spawn(Self::sweep_loop(hub.clone(), shutdown_rx));

        hub
    }

    /// Creates a new game under a collision-free room code and registers its
    /// session.
    pub async fn create_game(&self) -> Result<Arc<GameSession>, GameError> {
        let mut sessions = self.sessions.write().await;

        let mut room_code = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.generate_room_code();
            if !sessions.contains_key(&code) {
                room_code = Some(code);
                break;
            }
        }
        let Some(room_code) = room_code else {
            return Err(GameError::RoomCodeExhausted);
        };

        let game = Game::new(room_code.clone(), self.game_settings.clone());
        let session = GameSession::new(game, self.word_list.clone());
        sessions.insert(room_code.clone(), session.clone());

        info!("game created: {}", room_code);
        Ok(session)
    }

    pub async fn get_session(&self, room_code: &str) -> Result<Arc<GameSession>, GameError> {
        let sessions = self.sessions.read().await;
        sessions.get(room_code).cloned().ok_or(GameError::GameNotFound)
    }

    /// Removes and closes a session.
    pub async fn delete_session(&self, room_code: &str) {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(room_code)
        };

        if let Some(session) = session {
            session.close().await;
            info!("game deleted: {}", room_code);
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn total_player_count(&self) -> usize {
        let sessions: Vec<Arc<GameSession>> =
            self.sessions.read().await.values().cloned().collect();

        let mut total = 0;
        for session in sessions {
            total += session.player_count().await;
        }
        total
    }

    fn generate_room_code(&self) -> String {
        let mut rng = rand::rng();
        (0..self.settings.room_code_length)
            .map(|_| ROOM_CODE_CHARS[rng.random_range(0..ROOM_CODE_CHARS.len())] as char)
            .collect()
    }

    async fn sweep_loop(hub: Arc<GameHub>, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(hub.settings.sweep_interval);
        ticker.tick().await; // the first tick completes immediately

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => return,
                _ = ticker.tick() => hub.sweep_stale_sessions().await,
            }
        }
    }

    /// Reclaims sessions that have had zero players for longer than the
    /// staleness threshold. Advisory housekeeping, not correctness-critical.
    async fn sweep_stale_sessions(&self) {
        let candidates: Vec<(GameId, Arc<GameSession>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(code, session)| (code.clone(), session.clone()))
            .collect();

        for (room_code, session) in candidates {
            if session.player_count().await > 0 {
                continue;
            }

            let age = (chrono::Utc::now() - session.created_at())
                .to_std()
                .unwrap_or_default();
            if age > self.settings.stale_game_timeout {
                info!("sweeping stale game: {}", room_code);
                self.delete_session(&room_code).await;
            }
        }
    }

    /// Shuts down the hub and every session it owns. Safe to call more than
    /// once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.shutdown_tx.send(true);

        let sessions: Vec<Arc<GameSession>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, s)| s).collect()
        };
        for session in sessions {
            session.close().await;
        }
    }
}
