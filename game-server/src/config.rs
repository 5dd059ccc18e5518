use std::env;
use std::time::Duration;

use crate::hub::HubSettings;
use game_types::GameSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub min_players: usize,
    pub max_players: usize,
    pub voting_duration_seconds: u64,
    pub role_reveal_seconds: u64,
    pub reconnect_grace_period_seconds: u64,
    pub room_code_length: usize,
    pub stale_game_timeout_minutes: u64,
    pub sweep_interval_minutes: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            min_players: env::var("MIN_PLAYERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .expect("Invalid MIN_PLAYERS"),
            max_players: env::var("MAX_PLAYERS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid MAX_PLAYERS"),
            voting_duration_seconds: env::var("VOTING_DURATION_SECONDS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("Invalid VOTING_DURATION_SECONDS"),
            role_reveal_seconds: env::var("ROLE_REVEAL_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("Invalid ROLE_REVEAL_SECONDS"),
            reconnect_grace_period_seconds: env::var("RECONNECT_GRACE_PERIOD_SECONDS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("Invalid RECONNECT_GRACE_PERIOD_SECONDS"),
            room_code_length: env::var("ROOM_CODE_LENGTH")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .expect("Invalid ROOM_CODE_LENGTH"),
            stale_game_timeout_minutes: env::var("STALE_GAME_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("Invalid STALE_GAME_TIMEOUT_MINUTES"),
            sweep_interval_minutes: env::var("SWEEP_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid SWEEP_INTERVAL_MINUTES"),
        }
    }

    /// Per-room game parameters, applied to every room this process creates.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            min_players: self.min_players,
            max_players: self.max_players,
            voting_duration: Duration::from_secs(self.voting_duration_seconds),
            role_reveal_delay: Duration::from_secs(self.role_reveal_seconds),
        }
    }

    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            room_code_length: self.room_code_length,
            stale_game_timeout: Duration::from_secs(self.stale_game_timeout_minutes * 60),
            sweep_interval: Duration::from_secs(self.sweep_interval_minutes * 60),
        }
    }

    pub fn reconnect_grace_period(&self) -> Duration {
        Duration::from_secs(self.reconnect_grace_period_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
