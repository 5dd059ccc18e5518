use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::Round;
use game_types::{
    GameError, GameId, GameSettings, GameStateView, LobbyState, Phase, Player, PlayerId,
    PlayerInfo, Role, RoundResults, SubmissionUpdate, VoteProgress, VoteResult,
};

/// A game room: the player set, the current round, the round history and the
/// phase state machine. All invariants are enforced here; the session layer
/// adds locking, timers and event fan-out on top.
#[derive(Debug, Clone)]
pub struct Game {
    pub id: GameId,
    pub host_id: Option<PlayerId>,
    pub players: HashMap<PlayerId, Player>,
    pub current_round: Option<Round>,
    pub round_history: Vec<Round>,
    pub phase: Phase,
    pub settings: GameSettings,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn new(id: GameId, settings: GameSettings) -> Self {
        Self {
            id,
            host_id: None,
            players: HashMap::new(),
            current_round: None,
            round_history: Vec::new(),
            phase: Phase::Lobby,
            settings,
            created_at: Utc::now(),
        }
    }

    /// Moves the state machine to `target`, rejecting anything outside the
    /// transition table.
    fn transition(&mut self, target: Phase) -> Result<(), GameError> {
        if !self.phase.can_transition_to(target) {
            return Err(GameError::InvalidTransition);
        }
        self.phase = target;
        Ok(())
    }

    /// Adds a player. Only possible in the lobby and below the player cap;
    /// the first player to join becomes the host.
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        nickname: impl Into<String>,
    ) -> Result<&Player, GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }

        if self.players.len() >= self.settings.max_players {
            return Err(GameError::GameFull);
        }

        self.players.insert(player_id, Player::new(player_id, nickname));

        if self.host_id.is_none() {
            self.host_id = Some(player_id);
        }

        Ok(&self.players[&player_id])
    }

    /// Removes a player in any phase. If the host leaves and players remain,
    /// the new host is the remaining player who joined earliest (ties broken
    /// by ascending player id).
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<(), GameError> {
        if self.players.remove(&player_id).is_none() {
            return Err(GameError::PlayerNotFound);
        }

        if self.host_id == Some(player_id) {
            self.host_id = self
                .players
                .values()
                .min_by_key(|p| (p.joined_at, p.id))
                .map(|p| p.id);
        }

        Ok(())
    }

    pub fn get_player(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.players.get(&player_id).ok_or(GameError::PlayerNotFound)
    }

    pub fn get_player_mut(&mut self, player_id: PlayerId) -> Result<&mut Player, GameError> {
        self.players.get_mut(&player_id).ok_or(GameError::PlayerNotFound)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn connected_player_count(&self) -> usize {
        self.players.values().filter(|p| p.is_connected()).count()
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host_id == Some(player_id)
    }

    pub fn can_start(&self) -> bool {
        self.phase == Phase::Lobby && self.players.len() >= self.settings.min_players
    }

    /// Starts a new round with the given secret word: resets per-round player
    /// state, shuffles the turn order, picks the imposter and assigns roles.
    pub fn start_round(&mut self, secret_word: impl Into<String>) -> Result<(), GameError> {
        if self.phase != Phase::Lobby && self.phase != Phase::Results {
            return Err(GameError::InvalidPhase);
        }

        if self.players.len() < self.settings.min_players {
            return Err(GameError::NotEnoughPlayers);
        }

        for player in self.players.values_mut() {
            player.reset_for_new_round();
        }

        let round_number = self.round_history.len() as u32 + 1;
        let round = Round::new(round_number, secret_word, &self.player_ids());

        for (player_id, player) in &mut self.players {
            player.role = Some(if *player_id == round.imposter_id {
                Role::Imposter
            } else {
                Role::Vilek
            });
        }

        self.current_round = Some(round);
        self.transition(Phase::RoleAssignment)
    }

    pub fn transition_to_submission(&mut self) -> Result<(), GameError> {
        self.transition(Phase::Submission)
    }

    /// Accepts a word from the current-turn player.
    pub fn submit_word(&mut self, player_id: PlayerId, word: &str) -> Result<(), GameError> {
        if self.phase != Phase::Submission {
            return Err(GameError::InvalidPhase);
        }

        let word = word.trim();
        if word.is_empty() {
            return Err(GameError::EmptyWord);
        }

        let player = self.get_player(player_id)?;
        if player.has_submitted {
            // Turn ordering already prevents this; kept as a second gate.
            return Err(GameError::AlreadySubmitted);
        }
        let nickname = player.nickname.clone();

        let round = self.current_round.as_mut().ok_or(GameError::InvalidPhase)?;
        round.add_submission(player_id, &nickname, word)?;

        if let Some(player) = self.players.get_mut(&player_id) {
            player.has_submitted = true;
        }

        Ok(())
    }

    pub fn all_submitted(&self) -> bool {
        self.current_round.as_ref().is_some_and(|r| r.all_submitted())
    }

    pub fn transition_to_voting(&mut self) -> Result<(), GameError> {
        self.transition(Phase::Voting)
    }

    /// Records a vote. Self-votes, unknown targets and repeat voters are
    /// rejected.
    pub fn cast_vote(&mut self, voter_id: PlayerId, target_id: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::Voting {
            return Err(GameError::InvalidPhase);
        }

        if voter_id == target_id {
            return Err(GameError::CannotVoteSelf);
        }

        let voter = self.get_player(voter_id)?;
        if voter.has_voted {
            return Err(GameError::AlreadyVoted);
        }

        if !self.players.contains_key(&target_id) {
            return Err(GameError::InvalidTargetId);
        }

        let round = self.current_round.as_mut().ok_or(GameError::InvalidPhase)?;
        round.add_vote(voter_id, target_id)?;

        if let Some(voter) = self.players.get_mut(&voter_id) {
            voter.has_voted = true;
        }

        Ok(())
    }

    pub fn all_voted(&self) -> bool {
        self.current_round
            .as_ref()
            .is_some_and(|r| r.all_voted(self.players.len()))
    }

    /// Ends the voting phase: tallies the votes, records the winner on the
    /// round, appends it to the history and moves to RESULTS. The completed
    /// round stays referenced as `current_round` for display until the next
    /// round starts.
    pub fn end_round(&mut self) -> Result<(Vec<VoteResult>, Role), GameError> {
        if self.phase != Phase::Voting {
            return Err(GameError::InvalidPhase);
        }

        let Some(round) = self.current_round.as_mut() else {
            return Err(GameError::InvalidPhase);
        };

        let (results, winner) = round.tally(&self.players);
        round.winner = Some(winner);
        round.ended_at = Some(Utc::now());

        self.round_history.push(round.clone());
        self.transition(Phase::Results)?;

        Ok((results, winner))
    }

    /// Secret words already used in completed rounds.
    pub fn used_words(&self) -> Vec<String> {
        self.round_history.iter().map(|r| r.secret_word.clone()).collect()
    }

    /// Player roster in join order, with roles hidden.
    pub fn player_info_list(&self) -> Vec<PlayerInfo> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| (p.joined_at, p.id));
        players.into_iter().map(Player::to_info).collect()
    }

    /// Current lobby roster for broadcasting.
    pub fn lobby_state(&self) -> LobbyState {
        LobbyState {
            players: self.player_info_list(),
            host_id: self.host_id,
            can_start: self.can_start(),
        }
    }

    /// Current submission-phase progress for broadcasting.
    pub fn submission_state(&self) -> Option<SubmissionUpdate> {
        let round = self.current_round.as_ref()?;
        Some(SubmissionUpdate {
            submissions: round.submissions.clone(),
            current_player_id: round.current_player_id(),
            is_complete: round.all_submitted(),
        })
    }

    /// Current voting progress for broadcasting, counts only.
    pub fn vote_progress(&self) -> Option<VoteProgress> {
        let round = self.current_round.as_ref()?;
        Some(VoteProgress {
            voted_count: round.voted_count(),
            total_players: self.players.len(),
        })
    }

    /// Snapshot of the game for one player, with phase-appropriate detail.
    /// Includes that player's own role and (for a Vilek) the secret word,
    /// never anyone else's.
    pub fn state_for_player(&self, player_id: PlayerId) -> GameStateView {
        let mut view = GameStateView {
            phase: self.phase,
            players: self.player_info_list(),
            host_id: self.host_id,
            can_start: self.can_start(),
            submissions: None,
            current_player_id: None,
            vote_progress: None,
            results: None,
            role: None,
            secret_word: None,
        };

        match self.phase {
            Phase::Submission => {
                if let Some(round) = &self.current_round {
                    view.submissions = Some(round.submissions.clone());
                    view.current_player_id = round.current_player_id();
                }
            }
            Phase::Voting => {
                view.vote_progress = self.vote_progress();
            }
            Phase::Results => {
                if let Some(round) = &self.current_round {
                    let (votes, winner) = round.tally(&self.players);
                    view.results = Some(RoundResults {
                        votes,
                        imposter_id: round.imposter_id,
                        winner,
                        secret_word: round.secret_word.clone(),
                    });
                }
            }
            Phase::Lobby | Phase::RoleAssignment => {}
        }

        if let Ok(player) = self.get_player(player_id) {
            view.role = player.role;
            if player.role == Some(Role::Vilek) {
                if let Some(round) = &self.current_round {
                    view.secret_word = Some(round.secret_word.clone());
                }
            }
        }

        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn lobby_game(player_count: usize) -> (Game, Vec<PlayerId>) {
        let mut game = Game::new("TEST01".to_string(), GameSettings::default());
        let ids: Vec<PlayerId> = (0..player_count).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            game.add_player(*id, format!("Player{}", i + 1)).unwrap();
        }
        (game, ids)
    }

    fn run_submissions(game: &mut Game) {
        let order = game.current_round.as_ref().unwrap().player_order.clone();
        for (i, id) in order.iter().enumerate() {
            game.submit_word(*id, &format!("word{}", i)).unwrap();
        }
    }

    #[test]
    fn test_first_player_becomes_host() {
        let mut game = Game::new("TEST01".to_string(), GameSettings::default());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        game.add_player(first, "Alice").unwrap();
        game.add_player(second, "Bob").unwrap();

        assert_eq!(game.host_id, Some(first));
        assert!(game.is_host(first));
        assert!(!game.is_host(second));
    }

    #[test]
    fn test_join_rejected_when_full() {
        let settings = GameSettings { max_players: 2, ..GameSettings::default() };
        let mut game = Game::new("TEST01".to_string(), settings);
        game.add_player(Uuid::new_v4(), "Alice").unwrap();
        game.add_player(Uuid::new_v4(), "Bob").unwrap();

        assert_eq!(
            game.add_player(Uuid::new_v4(), "Carol"),
            Err(GameError::GameFull)
        );
    }

    #[test]
    fn test_join_rejected_after_start() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();

        assert_eq!(
            game.add_player(Uuid::new_v4(), "Late"),
            Err(GameError::GameAlreadyStarted)
        );
    }

    #[test]
    fn test_host_reassignment_is_deterministic() {
        let (mut game, ids) = lobby_game(4);
        let host = game.host_id.unwrap();
        assert_eq!(host, ids[0]);

        game.remove_player(host).unwrap();

        // New host is the earliest remaining joiner.
        let expected = game
            .players
            .values()
            .min_by_key(|p| (p.joined_at, p.id))
            .map(|p| p.id);
        assert_eq!(game.host_id, expected);
        assert!(game.players.contains_key(&game.host_id.unwrap()));
    }

    #[test]
    fn test_remove_unknown_player() {
        let (mut game, _) = lobby_game(4);
        assert_eq!(game.remove_player(Uuid::new_v4()), Err(GameError::PlayerNotFound));
    }

    #[test]
    fn test_remove_last_player_clears_host() {
        let mut game = Game::new("TEST01".to_string(), GameSettings::default());
        let id = Uuid::new_v4();
        game.add_player(id, "Solo").unwrap();
        game.remove_player(id).unwrap();
        assert_eq!(game.host_id, None);
    }

    #[test]
    fn test_can_start_requires_lobby_and_min_players() {
        let (mut game, _) = lobby_game(3);
        assert!(!game.can_start());

        game.add_player(Uuid::new_v4(), "Fourth").unwrap();
        assert!(game.can_start());

        game.start_round("neon").unwrap();
        assert!(!game.can_start());
    }

    #[test]
    fn test_start_round_needs_enough_players() {
        let (mut game, _) = lobby_game(3);
        assert_eq!(game.start_round("neon"), Err(GameError::NotEnoughPlayers));
        assert_eq!(game.phase, Phase::Lobby);
    }

    #[test]
    fn test_start_round_assigns_exactly_one_imposter() {
        let (mut game, _) = lobby_game(6);
        game.start_round("neon").unwrap();

        assert_eq!(game.phase, Phase::RoleAssignment);
        let imposters = game
            .players
            .values()
            .filter(|p| p.role == Some(Role::Imposter))
            .count();
        let vileks = game
            .players
            .values()
            .filter(|p| p.role == Some(Role::Vilek))
            .count();
        assert_eq!(imposters, 1);
        assert_eq!(vileks, 5);

        let round = game.current_round.as_ref().unwrap();
        assert_eq!(round.number, 1);
        assert_eq!(round.player_order.len(), 6);
        assert_eq!(
            game.players[&round.imposter_id].role,
            Some(Role::Imposter)
        );
    }

    #[test]
    fn test_start_round_rejected_mid_round() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();
        assert_eq!(game.start_round("chrome"), Err(GameError::InvalidPhase));
    }

    #[test]
    fn test_submission_turn_gating() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();

        let order = game.current_round.as_ref().unwrap().player_order.clone();

        // Wrong player: rejected, no state change.
        assert_eq!(game.submit_word(order[1], "sky"), Err(GameError::NotYourTurn));
        assert!(!game.players[&order[1]].has_submitted);

        // Empty word: rejected.
        assert_eq!(game.submit_word(order[0], "   "), Err(GameError::EmptyWord));

        game.submit_word(order[0], "  sky  ").unwrap();
        assert!(game.players[&order[0]].has_submitted);
        let round = game.current_round.as_ref().unwrap();
        assert_eq!(round.submissions[0].word, "sky");
        assert_eq!(round.submissions[0].player_id, order[0]);
    }

    #[test]
    fn test_all_submitted_after_full_turn_cycle() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();

        run_submissions(&mut game);
        assert!(game.all_submitted());

        game.transition_to_voting().unwrap();
        assert_eq!(game.phase, Phase::Voting);
    }

    #[test]
    fn test_vote_validation() {
        let (mut game, ids) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();
        run_submissions(&mut game);
        game.transition_to_voting().unwrap();

        // Self-vote rejected.
        assert_eq!(game.cast_vote(ids[0], ids[0]), Err(GameError::CannotVoteSelf));
        // Unknown target rejected.
        assert_eq!(
            game.cast_vote(ids[0], Uuid::new_v4()),
            Err(GameError::InvalidTargetId)
        );

        game.cast_vote(ids[0], ids[1]).unwrap();
        assert!(game.players[&ids[0]].has_voted);

        // Second vote from the same voter rejected.
        assert_eq!(game.cast_vote(ids[0], ids[2]), Err(GameError::AlreadyVoted));
    }

    #[test]
    fn test_vote_rejected_outside_voting_phase() {
        let (mut game, ids) = lobby_game(4);
        assert_eq!(game.cast_vote(ids[0], ids[1]), Err(GameError::InvalidPhase));
    }

    #[test]
    fn test_end_round_full_cycle() {
        let (mut game, ids) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();
        run_submissions(&mut game);
        game.transition_to_voting().unwrap();

        let imposter = game.current_round.as_ref().unwrap().imposter_id;
        let innocent = *ids.iter().find(|id| **id != imposter).unwrap();
        for id in &ids {
            let target = if *id == imposter { innocent } else { imposter };
            game.cast_vote(*id, target).unwrap();
        }
        assert!(game.all_voted());

        let (results, winner) = game.end_round().unwrap();
        assert_eq!(winner, Role::Vilek);
        assert_eq!(game.phase, Phase::Results);
        assert_eq!(game.round_history.len(), 1);
        assert_eq!(results.iter().map(|r| r.vote_count).sum::<u32>(), 4);

        // The completed round stays visible for the results screen.
        let round = game.current_round.as_ref().unwrap();
        assert_eq!(round.winner, Some(Role::Vilek));
        assert!(round.ended_at.is_some());

        // Ending again is an invalid transition out of RESULTS.
        assert_eq!(game.end_round(), Err(GameError::InvalidPhase));
    }

    #[test]
    fn test_next_round_from_results() {
        let (mut game, ids) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();
        run_submissions(&mut game);
        game.transition_to_voting().unwrap();
        for id in &ids[1..] {
            game.cast_vote(*id, ids[0]).unwrap();
        }
        game.end_round().unwrap();

        game.start_round("chrome").unwrap();
        assert_eq!(game.phase, Phase::RoleAssignment);
        let round = game.current_round.as_ref().unwrap();
        assert_eq!(round.number, 2);
        assert_eq!(game.used_words(), vec!["neon".to_string()]);

        // Per-round flags were reset.
        assert!(game.players.values().all(|p| !p.has_submitted && !p.has_voted));
    }

    #[test]
    fn test_state_view_hides_secret_word_from_imposter() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();

        let imposter = game.current_round.as_ref().unwrap().imposter_id;
        let vilek = *game
            .players
            .keys()
            .find(|id| **id != imposter)
            .unwrap();

        let imposter_view = game.state_for_player(imposter);
        assert_eq!(imposter_view.role, Some(Role::Imposter));
        assert!(imposter_view.secret_word.is_none());

        let vilek_view = game.state_for_player(vilek);
        assert_eq!(vilek_view.role, Some(Role::Vilek));
        assert_eq!(vilek_view.secret_word.as_deref(), Some("neon"));
    }

    #[test]
    fn test_state_view_tracks_submission_phase() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();

        let order = game.current_round.as_ref().unwrap().player_order.clone();
        game.submit_word(order[0], "sky").unwrap();

        let view = game.state_for_player(order[1]);
        assert_eq!(view.phase, Phase::Submission);
        assert_eq!(view.current_player_id, Some(order[1]));
        assert_eq!(view.submissions.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_disconnect_preserves_round_state() {
        let (mut game, _) = lobby_game(4);
        game.start_round("neon").unwrap();
        game.transition_to_submission().unwrap();

        let order = game.current_round.as_ref().unwrap().player_order.clone();
        game.submit_word(order[0], "sky").unwrap();

        game.get_player_mut(order[1]).unwrap().disconnect();
        assert_eq!(game.connected_player_count(), 3);

        // Round state is untouched by the disconnect.
        let round = game.current_round.as_ref().unwrap();
        assert_eq!(round.submissions.len(), 1);
        assert_eq!(round.current_player_id(), Some(order[1]));

        game.get_player_mut(order[1]).unwrap().reconnect();
        let view = game.state_for_player(order[1]);
        assert_eq!(view.current_player_id, Some(order[1]));
        assert_eq!(view.submissions.as_ref().unwrap().len(), 1);
    }
}
