use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

use game_types::{GameError, Player, PlayerId, Role, Submission, Vote, VoteResult};

/// Ephemeral state of a single round: the secret word, the imposter, the
/// shuffled turn order, and the submissions and votes collected so far.
#[derive(Debug, Clone)]
pub struct Round {
    /// 1-based, monotonically increasing across the game's history.
    pub number: u32,
    pub secret_word: String,
    pub imposter_id: PlayerId,
    pub submissions: Vec<Submission>,
    pub votes: Vec<Vote>,
    /// Index into `player_order` of the player whose turn it is.
    pub current_player_index: usize,
    /// Shuffled submission order, fixed at round start.
    pub player_order: Vec<PlayerId>,
    pub winner: Option<Role>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Creates a round: shuffles the submission order uniformly and picks
    /// one player uniformly at random as the imposter.
    pub fn new(number: u32, secret_word: impl Into<String>, player_ids: &[PlayerId]) -> Self {
        let mut rng = rand::rng();

        let mut player_order = player_ids.to_vec();
        player_order.shuffle(&mut rng);

        let imposter_id = player_ids[rng.random_range(0..player_ids.len())];

        Self {
            number,
            secret_word: secret_word.into(),
            imposter_id,
            submissions: Vec::new(),
            votes: Vec::new(),
            current_player_index: 0,
            player_order,
            winner: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// The player whose turn it is to submit, or `None` once everyone has.
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.player_order.get(self.current_player_index).copied()
    }

    pub fn is_player_turn(&self, player_id: PlayerId) -> bool {
        self.current_player_id() == Some(player_id)
    }

    /// Records a submission for the current-turn player and advances the
    /// turn pointer.
    pub fn add_submission(
        &mut self,
        player_id: PlayerId,
        nickname: &str,
        word: &str,
    ) -> Result<(), GameError> {
        if !self.is_player_turn(player_id) {
            return Err(GameError::NotYourTurn);
        }

        let order = self.submissions.len() as u32 + 1;
        self.submissions.push(Submission::new(player_id, nickname, word, order));
        self.current_player_index += 1;

        Ok(())
    }

    pub fn all_submitted(&self) -> bool {
        self.current_player_index >= self.player_order.len()
    }

    pub fn add_vote(&mut self, voter_id: PlayerId, target_id: PlayerId) -> Result<(), GameError> {
        if self.has_player_voted(voter_id) {
            return Err(GameError::AlreadyVoted);
        }

        self.votes.push(Vote::new(voter_id, target_id));
        Ok(())
    }

    pub fn has_player_voted(&self, player_id: PlayerId) -> bool {
        self.votes.iter().any(|v| v.voter_id == player_id)
    }

    pub fn voted_count(&self) -> usize {
        self.votes.len()
    }

    pub fn all_voted(&self, total_players: usize) -> bool {
        self.votes.len() >= total_players
    }

    /// Tallies the votes and determines the winning role.
    ///
    /// The accused is the player with the strictly greatest vote count; a tie
    /// at the maximum resolves to the tied player appearing earliest in
    /// `player_order`. With no votes at all nobody is accused and the
    /// imposter wins. Result rows are produced in `player_order` order, so
    /// repeated tallies of the same votes are identical.
    pub fn tally(&self, players: &HashMap<PlayerId, Player>) -> (Vec<VoteResult>, Role) {
        let mut vote_counts: HashMap<PlayerId, u32> = HashMap::new();
        let mut voter_names: HashMap<PlayerId, Vec<String>> = HashMap::new();

        for vote in &self.votes {
            *vote_counts.entry(vote.target_id).or_default() += 1;
            let nickname = players
                .get(&vote.voter_id)
                .map(|p| p.nickname.clone())
                .unwrap_or_default();
            voter_names.entry(vote.target_id).or_default().push(nickname);
        }

        let mut results = Vec::with_capacity(self.player_order.len());
        let mut accused: Option<PlayerId> = None;
        let mut max_votes = 0u32;

        for player_id in &self.player_order {
            // A player removed mid-round has no result row.
            let Some(player) = players.get(player_id) else {
                continue;
            };

            let count = vote_counts.get(player_id).copied().unwrap_or(0);
            results.push(VoteResult {
                player_id: *player_id,
                nickname: player.nickname.clone(),
                vote_count: count,
                voted_by: voter_names.get(player_id).cloned().unwrap_or_default(),
                is_imposter: *player_id == self.imposter_id,
            });

            if count > max_votes {
                max_votes = count;
                accused = Some(*player_id);
            }
        }

        let winner = if accused == Some(self.imposter_id) {
            // The Vileks caught the imposter.
            Role::Vilek
        } else {
            Role::Imposter
        };

        (results, winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn player_map(ids: &[PlayerId]) -> HashMap<PlayerId, Player> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (*id, Player::new(*id, format!("Player{}", i + 1))))
            .collect()
    }

    fn new_ids(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_player_order_is_permutation() {
        let ids = new_ids(6);
        let round = Round::new(1, "neon", &ids);

        let original: HashSet<PlayerId> = ids.iter().copied().collect();
        let shuffled: HashSet<PlayerId> = round.player_order.iter().copied().collect();
        assert_eq!(round.player_order.len(), ids.len());
        assert_eq!(original, shuffled);
    }

    #[test]
    fn test_imposter_is_one_of_the_players() {
        let ids = new_ids(5);
        for _ in 0..20 {
            let round = Round::new(1, "neon", &ids);
            assert!(ids.contains(&round.imposter_id));
        }
    }

    #[test]
    fn test_submissions_follow_turn_order() {
        let ids = new_ids(4);
        let mut round = Round::new(1, "neon", &ids);

        // Out of turn is rejected without advancing the turn pointer.
        let not_current = *round.player_order.last().unwrap();
        assert_eq!(
            round.add_submission(not_current, "X", "word"),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(round.current_player_index, 0);

        for i in 0..4 {
            let current = round.current_player_id().unwrap();
            round.add_submission(current, "X", &format!("word{}", i)).unwrap();
        }

        assert!(round.all_submitted());
        assert!(round.current_player_id().is_none());
        for (i, submission) in round.submissions.iter().enumerate() {
            assert_eq!(submission.player_id, round.player_order[i]);
            assert_eq!(submission.order, i as u32 + 1);
        }
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let ids = new_ids(4);
        let mut round = Round::new(1, "neon", &ids);

        round.add_vote(ids[0], ids[1]).unwrap();
        assert_eq!(round.add_vote(ids[0], ids[2]), Err(GameError::AlreadyVoted));
        assert_eq!(round.voted_count(), 1);
    }

    #[test]
    fn test_tally_majority_on_imposter() {
        let ids = new_ids(4);
        let mut round = Round::new(1, "neon", &ids);
        let imposter = round.imposter_id;
        let innocent = *ids.iter().find(|id| **id != imposter).unwrap();

        for id in &ids {
            if *id == imposter {
                round.add_vote(*id, innocent).unwrap();
            } else {
                round.add_vote(*id, imposter).unwrap();
            }
        }

        let players = player_map(&ids);
        let (results, winner) = round.tally(&players);

        assert_eq!(winner, Role::Vilek);
        assert_eq!(results.len(), 4);
        let total: u32 = results.iter().map(|r| r.vote_count).sum();
        assert_eq!(total, 4);

        let imposter_row = results.iter().find(|r| r.is_imposter).unwrap();
        assert_eq!(imposter_row.player_id, imposter);
        assert_eq!(imposter_row.vote_count, 3);
        assert_eq!(imposter_row.voted_by.len(), 3);
    }

    #[test]
    fn test_tally_imposter_escapes() {
        let ids = new_ids(4);
        let mut round = Round::new(1, "neon", &ids);
        let imposter = round.imposter_id;
        let scapegoat = *ids.iter().find(|id| **id != imposter).unwrap();

        // Everyone piles on an innocent player.
        for id in ids.iter().filter(|id| **id != scapegoat) {
            round.add_vote(*id, scapegoat).unwrap();
        }

        let (_, winner) = round.tally(&player_map(&ids));
        assert_eq!(winner, Role::Imposter);
    }

    #[test]
    fn test_tally_no_votes_means_imposter_wins() {
        let ids = new_ids(4);
        let round = Round::new(1, "neon", &ids);
        let (results, winner) = round.tally(&player_map(&ids));

        assert_eq!(winner, Role::Imposter);
        assert!(results.iter().all(|r| r.vote_count == 0));
    }

    #[test]
    fn test_tally_tie_resolves_by_turn_order() {
        let ids = new_ids(4);
        let mut round = Round::new(1, "neon", &ids);

        // Two players receive two votes each; the earlier one in the shuffled
        // order must be the accused, every time it is re-tallied.
        let a = round.player_order[0];
        let b = round.player_order[1];
        let others: Vec<PlayerId> = round
            .player_order
            .iter()
            .copied()
            .filter(|id| *id != a && *id != b)
            .collect();

        round.add_vote(a, b).unwrap();
        round.add_vote(b, a).unwrap();
        round.add_vote(others[0], a).unwrap();
        round.add_vote(others[1], b).unwrap();

        let players = player_map(&ids);
        let (_, first_winner) = round.tally(&players);
        let expected = if a == round.imposter_id { Role::Vilek } else { Role::Imposter };
        assert_eq!(first_winner, expected);

        // Deterministic: a second tally agrees.
        let (_, second_winner) = round.tally(&players);
        assert_eq!(first_winner, second_winner);
    }
}
