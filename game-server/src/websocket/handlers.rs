use std::sync::Arc;
use tracing::info;

use crate::session::GameSession;
use crate::websocket::connection::WsClient;
use game_types::{ClientMessage, GameError, PlayerId, ServerMessage};

/// Routes parsed client messages to the session and maps typed failures to
/// wire error codes.
#[derive(Clone)]
pub struct MessageHandler {
    player_id: PlayerId,
    session: Arc<GameSession>,
    client: Arc<WsClient>,
}

impl MessageHandler {
    pub fn new(player_id: PlayerId, session: Arc<GameSession>, client: Arc<WsClient>) -> Self {
        Self {
            player_id,
            session,
            client,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) {
        let result = match message {
            ClientMessage::JoinLobby { nickname } => self.handle_join_lobby(&nickname).await,
            ClientMessage::StartGame => self.session.start_game(self.player_id).await,
            ClientMessage::SubmitWord { word } => {
                self.session.submit_word(self.player_id, &word).await
            }
            ClientMessage::CastVote { target_player_id } => {
                self.session.cast_vote(self.player_id, target_player_id).await
            }
            ClientMessage::RequestNewRound => self.session.start_new_round(self.player_id).await,
            ClientMessage::Ping => {
                self.client.send_message(ServerMessage::Pong);
                Ok(())
            }
        };

        if let Err(e) = result {
            self.send_error(e);
        }
    }

    async fn handle_join_lobby(&self, nickname: &str) -> Result<(), GameError> {
        let nickname = nickname.trim();
        let nickname = if nickname.is_empty() { "Anonymous" } else { nickname };

        self.session.add_player(self.player_id, nickname).await?;
        info!(
            "player {} joined {} as {:?}",
            self.player_id,
            self.session.room_code(),
            nickname
        );

        self.send_connected().await;
        Ok(())
    }

    /// Sends the full connect payload: the player's id, the room code and a
    /// phase-appropriate state snapshot.
    pub async fn send_connected(&self) {
        let state = self.session.get_game_state(self.player_id).await;
        self.client.send_message(ServerMessage::Connected {
            player_id: self.player_id,
            game_id: self.session.room_code().clone(),
            state,
        });
    }

    pub fn send_error(&self, error: GameError) {
        self.client.send_message(ServerMessage::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }
}
