use std::env;
use std::str::FromStr;

use super::rule::RoleTable;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least {minimum} players are required, got {players}")]
    TooFewPlayers { players: usize, minimum: usize },
    #[error("the faction divisor must be at least {minimum}, got {divisor}")]
    DivisorTooSmall { divisor: usize, minimum: usize },
    #[error("{players} players divided by {divisor} leaves the Mafia faction empty")]
    EmptyFaction { players: usize, divisor: usize },
    #[error("expected exactly one {role} seat, found {count}")]
    RoleCount { role: &'static str, count: usize },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub players: usize,
    // faction size is players / divisor
    pub divisor: usize,
    pub human_seat: bool,
    // attribute every night kill and save instead of listing the dead
    pub open_announcement: bool,
    pub flavored_roles: bool,
    pub seed: Option<u64>,
    pub round_limit: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: 6,
            divisor: 3,
            human_seat: false,
            open_announcement: false,
            flavored_roles: false,
            seed: None,
            round_limit: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            players: parse_var("MAFIA_PLAYERS")?.unwrap_or(defaults.players),
            divisor: parse_var("MAFIA_DIVISOR")?.unwrap_or(defaults.divisor),
            human_seat: flag_var("MAFIA_HUMAN_SEAT").unwrap_or(defaults.human_seat),
            open_announcement: flag_var("MAFIA_OPEN_ANNOUNCEMENT")
                .unwrap_or(defaults.open_announcement),
            flavored_roles: flag_var("MAFIA_FLAVORED_ROLES").unwrap_or(defaults.flavored_roles),
            seed: parse_var("MAFIA_SEED")?,
            round_limit: parse_var("MAFIA_ROUND_LIMIT")?,
        })
    }

    pub fn faction_size(&self) -> usize {
        if self.divisor == 0 {
            0
        } else {
            self.players / self.divisor
        }
    }

    pub fn validate(&self) -> Result<RoleTable, ConfigError> {
        RoleTable::from_config(self)
    }
}

fn flag_var(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| v == "true")
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}
