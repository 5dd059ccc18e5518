use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::session::ClientConnection;
use game_types::{GameEvent, PlayerId, ServerFrame, ServerMessage};

/// Size of the per-connection outbound frame buffer.
const SEND_BUFFER_SIZE: usize = 256;

/// The session-facing handle for one WebSocket connection.
///
/// Outbound frames go through a bounded channel drained by the connection's
/// write pump; a full buffer drops the frame so a slow client can never
/// block the session.
pub struct WsClient {
    player_id: PlayerId,
    frames_tx: mpsc::Sender<ServerFrame>,
    close_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

impl WsClient {
    /// Creates the client handle plus the receivers its write pump consumes:
    /// the outbound frame stream and the close signal.
    pub fn new(player_id: PlayerId) -> (Arc<Self>, mpsc::Receiver<ServerFrame>, watch::Receiver<bool>) {
        let (frames_tx, frames_rx) = mpsc::channel(SEND_BUFFER_SIZE);
        let (close_tx, close_rx) = watch::channel(false);

        let client = Arc::new(Self {
            player_id,
            frames_tx,
            close_tx,
            closed: AtomicBool::new(false),
        });

        (client, frames_rx, close_rx)
    }

    pub fn send_frame(&self, frame: ServerFrame) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        if let Err(TrySendError::Full(_)) = self.frames_tx.try_send(frame) {
            warn!("send buffer full, dropping frame for {}", self.player_id);
        }
    }

    pub fn send_message(&self, message: ServerMessage) {
        self.send_frame(ServerFrame::Message(message));
    }
}

impl ClientConnection for WsClient {
    fn send(&self, event: &GameEvent) {
        self.send_frame(ServerFrame::Event(event.clone()));
    }

    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.close_tx.send(true);
    }
}
