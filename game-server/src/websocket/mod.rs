use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::hub::GameHub;
use crate::session::ClientConnection;
use game_types::{ClientMessage, GameError, Phase, PlayerId, ServerFrame, ServerMessage};

pub mod connection;
pub mod handlers;

pub use connection::WsClient;
use handlers::MessageHandler;

/// Query parameters of the `/ws` upgrade request. A present `player_id`
/// marks a reconnection attempt.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub room_code: String,
    pub player_id: Option<PlayerId>,
}

pub async fn handle_connection(
    websocket: WebSocket,
    query: ConnectQuery,
    hub: Arc<GameHub>,
    reconnect_grace_period: Duration,
) {
    let room_code = query.room_code.to_uppercase();

    let session = match hub.get_session(&room_code).await {
        Ok(session) => session,
        Err(e) => {
            reject(websocket, e).await;
            return;
        }
    };

    let is_reconnect = query.player_id.is_some();
    let player_id = query.player_id.unwrap_or_else(Uuid::new_v4);

    if !is_reconnect && !session.can_join().await {
        let reason = if session.phase().await != Phase::Lobby {
            GameError::GameAlreadyStarted
        } else {
            GameError::GameFull
        };
        reject(websocket, reason).await;
        return;
    }

    info!(
        "websocket connected: room={} player={} reconnect={}",
        room_code, player_id, is_reconnect
    );

    let (client, frames_rx, close_rx) = WsClient::new(player_id);
    session
        .register_client(client.clone() as Arc<dyn ClientConnection>)
        .await;

    let handler = MessageHandler::new(player_id, session.clone(), client.clone());

    if is_reconnect {
        match session.reconnect_player(player_id).await {
            Ok(_) => handler.send_connected().await,
            // Unknown id: fall through and treat the connection as a new
            // player waiting to send join_lobby.
            Err(e) => info!("reconnect failed for {}: {}", player_id, e),
        }
    }

    let (mut ws_tx, mut ws_rx) = websocket.split();

    // Write pump: serialized frames out, until the channel or the client
    // handle is closed.
    let outgoing = {
        let mut frames_rx = frames_rx;
        let mut close_rx = close_rx;

        async move {
            loop {
                tokio::select! {
                    _ = close_rx.changed() => break,
                    frame = frames_rx.recv() => {
                        let Some(frame) = frame else { break };
                        let json = match serde_json::to_string(&frame) {
                            Ok(json) => json,
                            Err(e) => {
                                error!("failed to serialize frame: {}", e);
                                continue;
                            }
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = ws_tx.close().await;
        }
    };

    // Read pump: parse and dispatch client messages.
    let incoming = {
        let handler = handler.clone();
        let client = client.clone();

        async move {
            while let Some(result) = ws_rx.next().await {
                let msg = match result {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("websocket error for {}: {}", player_id, e);
                        break;
                    }
                };

                if msg.is_close() {
                    break;
                }
                let Ok(text) = msg.to_str() else { continue };

                match serde_json::from_str::<ClientMessage>(text) {
                    Ok(message) => handler.handle_message(message).await,
                    Err(e) => {
                        client.send_message(ServerMessage::Error {
                            code: "INVALID_MESSAGE".to_string(),
                            message: format!("invalid message: {}", e),
                        });
                    }
                }
            }
        }
    };

    tokio::select! {
        _ = incoming => {}
        _ = outgoing => {}
    }

    info!("websocket disconnected: room={} player={}", room_code, player_id);

    session
        .unregister_client(&(client.clone() as Arc<dyn ClientConnection>))
        .await;
    session.disconnect_player(player_id).await;

    // Grace-period eviction: lobby players who never come back are removed
    // so they stop blocking `can_start`.
    tokio::spawn(async move {
        tokio::time::sleep(reconnect_grace_period).await;
        session.evict_if_disconnected(player_id).await;
    });
}

/// Sends a single error frame and closes the socket, for connections refused
/// before registration.
async fn reject(websocket: WebSocket, error: GameError) {
    let (mut ws_tx, _) = websocket.split();

    let frame = ServerFrame::Message(ServerMessage::Error {
        code: error.code().to_string(),
        message: error.to_string(),
    });
    if let Ok(json) = serde_json::to_string(&frame) {
        let _ = ws_tx.send(Message::text(json)).await;
    }
    let _ = ws_tx.close().await;
}
