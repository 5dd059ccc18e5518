use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use game_core::{Game, WordList};
use game_types::{
    EventPayload, GameError, GameEvent, GameId, GameStateView, Phase, Player, PlayerId, Role,
    RoleAssignment, RoundResults, SubmissionPhase, VotingCountdown, VotingPhase,
};

/// Capacity of the per-session event queue. The queue is a lossy best-effort
/// channel: on overflow the newest event is dropped with a warning, so a slow
/// delivery consumer can never stall a game mutation.
const EVENT_QUEUE_CAPACITY: usize = 100;

/// A connected client handle, implemented by the transport layer.
///
/// `send` is best-effort: a full outbound buffer drops the event instead of
/// blocking or erroring the caller.
pub trait ClientConnection: Send + Sync {
    fn send(&self, event: &GameEvent);
    fn player_id(&self) -> PlayerId;
    fn close(&self);
}

#[derive(Default)]
struct SessionTimers {
    reveal: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    countdown_cancel: Option<oneshot::Sender<()>>,
}

/// Wraps one [`Game`] with concurrency control, timers and client fan-out.
///
/// All game mutation happens under the exclusive `game` lock. The client
/// registry has its own lock so the delivery task can push to clients without
/// blocking gameplay. Timer callbacks re-check the phase after re-acquiring
/// the lock, so a stale timer firing after a concurrent transition is a no-op.
pub struct GameSession {
    room_code: GameId,
    created_at: DateTime<Utc>,
    game: RwLock<Game>,
    clients: RwLock<HashMap<PlayerId, Arc<dyn ClientConnection>>>,
    events_tx: mpsc::Sender<GameEvent>,
    word_list: Arc<WordList>,
    shutdown_tx: watch::Sender<bool>,
    timers: Mutex<SessionTimers>,
    closed: AtomicBool,
    weak: Weak<GameSession>,
}

impl GameSession {
    pub fn new(game: Game, word_list: Arc<WordList>) -> Arc<Self> {
        let room_code = game.id.clone();
        let created_at = game.created_at;
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = Arc::new_cyclic(|weak: &Weak<GameSession>| Self {
            room_code,
            created_at,
            game: RwLock::new(game),
            clients: RwLock::new(HashMap::new()),
            events_tx,
            word_list,
            shutdown_tx,
            timers: Mutex::new(SessionTimers::default()),
            closed: AtomicBool::new(false),
            weak: weak.clone(),
        });

        // Single consumer draining the event queue in FIFO order.
        tokio::spawn(Self::delivery_loop(session.clone(), events_rx, shutdown_rx));

        session
    }

    pub fn room_code(&self) -> &GameId {
        &self.room_code
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn player_count(&self) -> usize {
        self.game.read().await.players.len()
    }

    pub async fn phase(&self) -> Phase {
        self.game.read().await.phase
    }

    /// Whether a new player may join right now.
    pub async fn can_join(&self) -> bool {
        let game = self.game.read().await;
        game.phase == Phase::Lobby && game.players.len() < game.settings.max_players
    }

    /// Phase-appropriate snapshot for `player_id`, used on connect and
    /// reconnect.
    pub async fn get_game_state(&self, player_id: PlayerId) -> GameStateView {
        self.game.read().await.state_for_player(player_id)
    }

    // --- client registry ----------------------------------------------------

    pub async fn register_client(&self, client: Arc<dyn ClientConnection>) {
        let mut clients = self.clients.write().await;
        clients.insert(client.player_id(), client);
    }

    /// Removes the registration for `client`, but only if it is still the
    /// registered handle. A reconnected player's fresh handle survives the
    /// old connection's teardown.
    pub async fn unregister_client(&self, client: &Arc<dyn ClientConnection>) {
        let mut clients = self.clients.write().await;
        if let Some(current) = clients.get(&client.player_id()) {
            if Arc::ptr_eq(current, client) {
                clients.remove(&client.player_id());
            }
        }
    }

    // --- lobby --------------------------------------------------------------

    pub async fn add_player(
        &self,
        player_id: PlayerId,
        nickname: &str,
    ) -> Result<Player, GameError> {
        let mut game = self.game.write().await;
        let player = game.add_player(player_id, nickname)?.clone();

        self.queue_event(GameEvent::broadcast(
            self.room_code.clone(),
            EventPayload::PlayerJoined(game.lobby_state()),
        ));

        Ok(player)
    }

    pub async fn remove_player(&self, player_id: PlayerId) -> Result<(), GameError> {
        let mut game = self.game.write().await;
        game.remove_player(player_id)?;

        self.queue_event(GameEvent::broadcast(
            self.room_code.clone(),
            EventPayload::PlayerLeft(game.lobby_state()),
        ));

        Ok(())
    }

    /// Marks a player disconnected. Their round state is preserved so they
    /// can reconnect.
    pub async fn disconnect_player(&self, player_id: PlayerId) {
        let mut game = self.game.write().await;
        if let Ok(player) = game.get_player_mut(player_id) {
            player.disconnect();
            self.queue_event(GameEvent::broadcast(
                self.room_code.clone(),
                EventPayload::PlayerLeft(game.lobby_state()),
            ));
        }
    }

    pub async fn reconnect_player(&self, player_id: PlayerId) -> Result<Player, GameError> {
        let mut game = self.game.write().await;
        let player = game.get_player_mut(player_id)?;
        player.reconnect();
        let player = player.clone();

        self.queue_event(GameEvent::broadcast(
            self.room_code.clone(),
            EventPayload::PlayerReconnected(game.lobby_state()),
        ));

        Ok(player)
    }

    /// Removes `player_id` if they are still disconnected and the game is
    /// still in the lobby. Called by the transport once the reconnection
    /// grace period has expired; mid-round players are never evicted, since
    /// their slot in the turn order must survive for reconnection.
    pub async fn evict_if_disconnected(&self, player_id: PlayerId) -> bool {
        let mut game = self.game.write().await;

        if game.phase != Phase::Lobby {
            return false;
        }
        match game.get_player(player_id) {
            Ok(player) if !player.is_connected() => {}
            _ => return false,
        }

        if game.remove_player(player_id).is_err() {
            return false;
        }

        info!("evicted {} from {} after grace period", player_id, self.room_code);
        self.queue_event(GameEvent::broadcast(
            self.room_code.clone(),
            EventPayload::PlayerLeft(game.lobby_state()),
        ));
        true
    }

    // --- round orchestration ------------------------------------------------

    /// Starts the game (host only): assigns roles and schedules the delayed
    /// transition into the submission phase.
    pub async fn start_game(&self, player_id: PlayerId) -> Result<(), GameError> {
        let mut game = self.game.write().await;

        if !game.is_host(player_id) {
            return Err(GameError::NotHost);
        }

        let secret_word = self.word_list.random_word();
        game.start_round(secret_word)?;

        self.emit_role_assignments(&game);
        self.schedule_submission_transition(game.settings.role_reveal_delay)
            .await;

        Ok(())
    }

    /// Starts the next round from the results screen (host only), avoiding
    /// secret words already used in this game.
    pub async fn start_new_round(&self, player_id: PlayerId) -> Result<(), GameError> {
        let mut game = self.game.write().await;

        if !game.is_host(player_id) {
            return Err(GameError::NotHost);
        }

        if game.phase != Phase::Results {
            return Err(GameError::InvalidPhase);
        }

        let used: HashSet<String> = game.used_words().into_iter().collect();
        let secret_word = self.word_list.random_word_excluding(&used);
        game.start_round(secret_word)?;

        self.emit_role_assignments(&game);
        self.schedule_submission_transition(game.settings.role_reveal_delay)
            .await;

        Ok(())
    }

    /// Sends each player their role. Only Vileks get the secret word.
    fn emit_role_assignments(&self, game: &Game) {
        let secret_word = game
            .current_round
            .as_ref()
            .map(|r| r.secret_word.clone())
            .unwrap_or_default();

        for (player_id, player) in &game.players {
            let Some(role) = player.role else { continue };
            let payload = RoleAssignment {
                role,
                secret_word: (role == Role::Vilek).then(|| secret_word.clone()),
            };
            self.queue_event(GameEvent::for_player(
                self.room_code.clone(),
                *player_id,
                EventPayload::RolesAssigned(payload),
            ));
        }
    }

    /// One-shot timer: after the role-reveal delay, move to the submission
    /// phase. The callback re-checks the phase under the lock, so it no-ops
    /// if the session was closed or reset in the meantime.
    async fn schedule_submission_transition(&self, delay: Duration) {
        let weak = self.weak.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => return,
            }
            if let Some(session) = weak.upgrade() {
                session.begin_submission_phase().await;
            }
        });

        self.timers.lock().await.reveal = Some(handle);
    }

    async fn begin_submission_phase(&self) {
        let mut game = self.game.write().await;

        // Stale timer guard: a concurrent transition already happened.
        if game.phase != Phase::RoleAssignment {
            return;
        }
        if game.transition_to_submission().is_err() {
            return;
        }

        let Some(round) = game.current_round.as_ref() else {
            return;
        };
        let player_order = round
            .player_order
            .iter()
            .filter_map(|id| game.players.get(id).map(Player::to_info))
            .collect();

        self.queue_event(GameEvent::broadcast(
            self.room_code.clone(),
            EventPayload::SubmissionPhase(SubmissionPhase {
                current_player_id: round.current_player_id(),
                player_order,
                submissions: round.submissions.clone(),
            }),
        ));
    }

    /// Accepts a word from the current-turn player. When the last player has
    /// submitted, voting begins immediately.
    pub async fn submit_word(&self, player_id: PlayerId, word: &str) -> Result<(), GameError> {
        let mut game = self.game.write().await;

        game.submit_word(player_id, word)?;

        if let Some(update) = game.submission_state() {
            self.queue_event(GameEvent::broadcast(
                self.room_code.clone(),
                EventPayload::SubmissionUpdate(update),
            ));
        }

        if game.all_submitted() {
            game.transition_to_voting()?;
            self.begin_voting_phase(&game).await;
        }

        Ok(())
    }

    /// Opens the voting phase and starts the countdown task. Caller holds the
    /// game lock.
    async fn begin_voting_phase(&self, game: &Game) {
        let remaining_seconds = game.settings.voting_duration.as_secs();

        self.queue_event(GameEvent::broadcast(
            self.room_code.clone(),
            EventPayload::VotingStarted(VotingPhase {
                remaining_seconds,
                players: game.player_info_list(),
            }),
        ));

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let weak = self.weak.clone();
        let room_code = self.room_code.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(Self::voting_countdown(
            weak,
            room_code,
            remaining_seconds,
            cancel_rx,
            shutdown_rx,
        ));

        let mut timers = self.timers.lock().await;
        timers.countdown = Some(handle);
        timers.countdown_cancel = Some(cancel_tx);
    }

    /// Once-per-second countdown for the voting phase. Reacts promptly to
    /// early cancellation (all votes in) and to session shutdown.
    async fn voting_countdown(
        weak: Weak<GameSession>,
        room_code: GameId,
        seconds: u64,
        mut cancel_rx: oneshot::Receiver<()>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut remaining = seconds;
        let start = tokio::time::Instant::now() + Duration::from_secs(1);
        let mut ticker = tokio::time::interval_at(start, Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = &mut cancel_rx => return,
                _ = shutdown_rx.changed() => return,
                _ = ticker.tick() => {
                    remaining = remaining.saturating_sub(1);

                    let Some(session) = weak.upgrade() else { return };
                    if remaining == 0 {
                        session.end_voting_phase().await;
                        return;
                    }
                    session.queue_event(GameEvent::broadcast(
                        room_code.clone(),
                        EventPayload::VotingCountdown(VotingCountdown {
                            remaining_seconds: remaining,
                        }),
                    ));
                }
            }
        }
    }

    /// Records a vote. When the last outstanding vote arrives, the countdown
    /// is cancelled and the round ends on this path; the phase guard in
    /// `end_voting_phase` keeps a concurrently expiring countdown from ending
    /// it a second time.
    pub async fn cast_vote(&self, voter_id: PlayerId, target_id: PlayerId) -> Result<(), GameError> {
        let mut game = self.game.write().await;

        game.cast_vote(voter_id, target_id)?;

        if let Some(progress) = game.vote_progress() {
            self.queue_event(GameEvent::broadcast(
                self.room_code.clone(),
                EventPayload::VoteUpdate(progress),
            ));
        }

        if game.all_voted() {
            if let Some(cancel) = self.timers.lock().await.countdown_cancel.take() {
                let _ = cancel.send(());
            }
            self.finish_round(&mut game);
        }

        Ok(())
    }

    /// Countdown-expiry path into round end. Re-validates the phase under the
    /// lock; only one of the two racing paths performs the transition.
    async fn end_voting_phase(&self) {
        let mut game = self.game.write().await;
        if game.phase != Phase::Voting {
            return;
        }
        self.finish_round(&mut game);
    }

    /// Tallies and broadcasts the round results. Caller holds the game lock
    /// and has verified the phase. If ending the round fails the game is left
    /// in VOTING and the failure is logged.
    fn finish_round(&self, game: &mut Game) {
        match game.end_round() {
            Ok((votes, winner)) => {
                let Some(round) = game.current_round.as_ref() else {
                    return;
                };
                self.queue_event(GameEvent::broadcast(
                    self.room_code.clone(),
                    EventPayload::RoundEnded(RoundResults {
                        votes,
                        imposter_id: round.imposter_id,
                        winner,
                        secret_word: round.secret_word.clone(),
                    }),
                ));
            }
            Err(e) => {
                error!("failed to end round for {}: {}", self.room_code, e);
            }
        }
    }

    // --- event delivery -----------------------------------------------------

    /// Enqueues an event for the delivery task. Drop-newest on overflow.
    fn queue_event(&self, event: GameEvent) {
        if let Err(TrySendError::Full(event)) = self.events_tx.try_send(event) {
            warn!(
                "event queue full for {}, dropping {}",
                self.room_code,
                event.payload.event_type()
            );
        }
    }

    async fn delivery_loop(
        session: Arc<GameSession>,
        mut events_rx: mpsc::Receiver<GameEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                event = events_rx.recv() => match event {
                    Some(event) => session.dispatch_event(event).await,
                    None => break,
                },
            }
        }
    }

    /// Pushes one event to its audience: the targeted player, or every
    /// registered client.
    async fn dispatch_event(&self, event: GameEvent) {
        let clients = self.clients.read().await;

        if let Some(player_id) = event.player_id {
            if let Some(client) = clients.get(&player_id) {
                client.send(&event);
            }
            return;
        }

        for client in clients.values() {
            client.send(&event);
        }
    }

    // --- shutdown -----------------------------------------------------------

    /// Shuts the session down: stops the delivery task and timers and closes
    /// every registered client. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("closing session {}", self.room_code);
        let _ = self.shutdown_tx.send(true);

        {
            let mut timers = self.timers.lock().await;
            if let Some(handle) = timers.reveal.take() {
                handle.abort();
            }
            if let Some(handle) = timers.countdown.take() {
                handle.abort();
            }
            timers.countdown_cancel.take();
        }

        let mut clients = self.clients.write().await;
        for client in clients.values() {
            client.close();
        }
        clients.clear();
    }
}
